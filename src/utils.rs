use byteorder::{ByteOrder, LittleEndian};
use log::trace;

/// Renders a buffer as hex words for debug output.
///
/// The word size is the widest of `u32`, `u16` and `u8` that divides the
/// buffer length, words are read little-endian. An empty buffer renders as `[]`.
///
/// # Arguments
///
/// * `data` - Bytes to render, e.g. a packet region or a `RAW_HEADERS` column.
pub fn to_hex(data: &[u8]) -> String {
    let words: Vec<String> = match data.len() % 4 {
        0 => data
            .chunks_exact(4)
            .map(|w| format!("{:#x}", LittleEndian::read_u32(w)))
            .collect(),
        2 => data
            .chunks_exact(2)
            .map(|w| format!("{:#x}", LittleEndian::read_u16(w)))
            .collect(),
        _ => data.iter().map(|b| format!("{:#x}", b)).collect(),
    };
    trace!("Rendered {} bytes as {} hex words", data.len(), words.len());
    format!("[{}]", words.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        assert_eq!(to_hex(&[]), "[]");
    }

    #[test]
    fn word_size_follows_length() {
        assert_eq!(to_hex(&[1, 2, 3, 4, 0xff, 0, 0, 0]), "[0x4030201, 0xff]");
        assert_eq!(to_hex(&[0x34, 0x12, 0, 0, 0, 0]), "[0x1234, 0x0, 0x0]");
        assert_eq!(to_hex(&[0xfe, 0x01, 0x10]), "[0xfe, 0x1, 0x10]");
        assert_eq!(to_hex(&[0xab]), "[0xab]");
    }
}
