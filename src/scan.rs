//! Minimal model of an assembled lidar scan.
//!
//! A [`LidarScan`] holds one `h x w` grid per channel (`h` pixels per column,
//! `w` columns per frame). Grids are row-major, so a single column is a
//! strided slice; [`FieldArray::column_bytes`] hands out a contiguous byte
//! view of one column, copying only when it has to.

use crate::fields::FieldTypes;
use crate::types::{ChanField, FieldType};
use byteorder::{ByteOrder, LittleEndian};
use log::trace;
use ndarray::{Array2, ArrayView1};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Storage of one scan channel.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldArray {
    U8(Array2<u8>),
    U16(Array2<u16>),
    U32(Array2<u32>),
    U64(Array2<u64>),
}

/// Copies a column of words into little-endian bytes.
fn le_bytes<T: Clone>(col: ArrayView1<'_, T>, size: usize, write: fn(&[T], &mut [u8])) -> Vec<u8> {
    let words = col.as_standard_layout();
    let mut bytes = vec![0u8; words.len() * size];
    if let Some(words) = words.as_slice() {
        write(words, &mut bytes);
    }
    bytes
}

/// Reads a little-endian word from a chunk of at most 8 bytes, zero padded.
#[inline]
fn padded_word(chunk: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word[..chunk.len()].copy_from_slice(chunk);
    LittleEndian::read_u64(&word)
}

impl FieldArray {
    /// Zero-filled storage of shape `(h, w)`.
    pub fn zeros(ty: FieldType, h: usize, w: usize) -> FieldArray {
        match ty {
            FieldType::U8 => FieldArray::U8(Array2::zeros((h, w))),
            FieldType::U16 => FieldArray::U16(Array2::zeros((h, w))),
            FieldType::U32 => FieldArray::U32(Array2::zeros((h, w))),
            FieldType::U64 => FieldArray::U64(Array2::zeros((h, w))),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldArray::U8(_) => FieldType::U8,
            FieldArray::U16(_) => FieldType::U16,
            FieldArray::U32(_) => FieldType::U32,
            FieldArray::U64(_) => FieldType::U64,
        }
    }

    /// `(h, w)` of the grid.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            FieldArray::U8(a) => a.dim(),
            FieldArray::U16(a) => a.dim(),
            FieldArray::U32(a) => a.dim(),
            FieldArray::U64(a) => a.dim(),
        }
    }

    /// Value at `(row, col)` widened to `u64`.
    pub fn get(&self, row: usize, col: usize) -> Option<u64> {
        match self {
            FieldArray::U8(a) => a.get((row, col)).map(|v| *v as u64),
            FieldArray::U16(a) => a.get((row, col)).map(|v| *v as u64),
            FieldArray::U32(a) => a.get((row, col)).map(|v| *v as u64),
            FieldArray::U64(a) => a.get((row, col)).copied(),
        }
    }

    /// Stores `value` at `(row, col)`, truncated to the storage width.
    /// Returns `false` when the index is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: u64) -> bool {
        match self {
            FieldArray::U8(a) => a.get_mut((row, col)).map(|v| *v = value as u8).is_some(),
            FieldArray::U16(a) => a.get_mut((row, col)).map(|v| *v = value as u16).is_some(),
            FieldArray::U32(a) => a.get_mut((row, col)).map(|v| *v = value as u32).is_some(),
            FieldArray::U64(a) => a.get_mut((row, col)).map(|v| *v = value).is_some(),
        }
    }

    /// Contiguous little-endian bytes of one column, top to bottom.
    ///
    /// Borrows the grid when the column already is a contiguous byte slice,
    /// otherwise returns an owned copy. Returns `None` when `col` is out of range.
    pub fn column_bytes(&self, col: usize) -> Option<Cow<'_, [u8]>> {
        if col >= self.dim().1 {
            return None;
        }
        let bytes = match self {
            FieldArray::U8(a) => {
                let column = a.column(col);
                match column.to_slice() {
                    Some(slice) => Cow::Borrowed(slice),
                    None => Cow::Owned(column.to_vec()),
                }
            }
            FieldArray::U16(a) => {
                Cow::Owned(le_bytes(a.column(col), 2, LittleEndian::write_u16_into))
            }
            FieldArray::U32(a) => {
                Cow::Owned(le_bytes(a.column(col), 4, LittleEndian::write_u32_into))
            }
            FieldArray::U64(a) => {
                Cow::Owned(le_bytes(a.column(col), 8, LittleEndian::write_u64_into))
            }
        };
        Some(bytes)
    }

    /// Fills one column from little-endian bytes, starting at the top.
    ///
    /// Bytes beyond the column capacity are ignored; a trailing partial word is
    /// zero padded. Returns the number of bytes consumed.
    pub fn write_column_bytes(&mut self, col: usize, bytes: &[u8]) -> usize {
        let (h, w) = self.dim();
        if col >= w {
            return 0;
        }
        let size = self.field_type().size();
        let used = bytes.len().min(h * size);
        for (row, chunk) in bytes[..used].chunks(size).enumerate() {
            self.set(row, col, padded_word(chunk));
        }
        used
    }

    /// True when every element of the column is zero (or the column does not exist).
    pub fn column_is_zero(&self, col: usize) -> bool {
        if col >= self.dim().1 {
            return true;
        }
        match self {
            FieldArray::U8(a) => a.column(col).iter().all(|v| *v == 0),
            FieldArray::U16(a) => a.column(col).iter().all(|v| *v == 0),
            FieldArray::U32(a) => a.column(col).iter().all(|v| *v == 0),
            FieldArray::U64(a) => a.column(col).iter().all(|v| *v == 0),
        }
    }
}

/// One lidar rotation: a grid per channel plus the frame it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct LidarScan {
    w: usize,
    h: usize,
    /// Frame id of the packets batched into this scan, `-1` until the first packet.
    pub frame_id: i32,
    fields: BTreeMap<ChanField, FieldArray>,
}

impl LidarScan {
    /// Creates an empty scan with zeroed channels.
    ///
    /// # Arguments
    ///
    /// * `h` - Pixels per column.
    /// * `w` - Columns per frame.
    /// * `fields` - Channels to allocate and their storage widths.
    pub fn new(h: usize, w: usize, fields: &FieldTypes) -> LidarScan {
        trace!("Creating LidarScan {}x{} with fields {:?}", h, w, fields);
        LidarScan {
            w,
            h,
            frame_id: -1,
            fields: fields
                .iter()
                .map(|(f, ty)| (*f, FieldArray::zeros(*ty, h, w)))
                .collect(),
        }
    }

    /// Columns per frame.
    pub fn w(&self) -> usize {
        self.w
    }

    /// Pixels per column.
    pub fn h(&self) -> usize {
        self.h
    }

    pub fn has_field(&self, field: ChanField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = ChanField> + '_ {
        self.fields.keys().copied()
    }

    pub fn field(&self, field: ChanField) -> Option<&FieldArray> {
        self.fields.get(&field)
    }

    pub fn field_mut(&mut self, field: ChanField) -> Option<&mut FieldArray> {
        self.fields.get_mut(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(ty: FieldType) -> LidarScan {
        let fields = FieldTypes::from([
            (ChanField::RawHeaders, ty),
            (ChanField::Range, FieldType::U32),
        ]);
        LidarScan::new(4, 3, &fields)
    }

    #[test]
    fn new_scan_is_zeroed() {
        let ls = scan(FieldType::U32);
        assert_eq!((ls.h(), ls.w()), (4, 3));
        assert_eq!(ls.frame_id, -1);
        assert!(ls.has_field(ChanField::Range));
        assert!(!ls.has_field(ChanField::Signal));
        let rh = ls.field(ChanField::RawHeaders).unwrap();
        assert_eq!(rh.dim(), (4, 3));
        assert!((0..3).all(|c| rh.column_is_zero(c)));
    }

    #[test]
    fn column_bytes_are_little_endian() {
        let mut ls = scan(FieldType::U32);
        let rh = ls.field_mut(ChanField::RawHeaders).unwrap();
        rh.set(0, 1, 0x0403_0201);
        rh.set(3, 1, 0x0d0c_0b0a);

        let bytes = rh.column_bytes(1).unwrap();
        assert!(matches!(bytes, Cow::Owned(_)));
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &[1, 2, 3, 4]);
        assert_eq!(&bytes[12..16], &[0x0a, 0x0b, 0x0c, 0x0d]);
        assert!(rh.column_bytes(3).is_none());
    }

    #[test]
    fn single_column_u8_is_borrowed() {
        let fields = FieldTypes::from([(ChanField::RawHeaders, FieldType::U8)]);
        let mut ls = LidarScan::new(5, 1, &fields);
        let rh = ls.field_mut(ChanField::RawHeaders).unwrap();
        rh.write_column_bytes(0, &[9, 8, 7]);
        let bytes = rh.column_bytes(0).unwrap();
        assert!(matches!(bytes, Cow::Borrowed(_)));
        assert_eq!(&bytes[..], &[9, 8, 7, 0, 0]);
    }

    #[test]
    fn write_column_bytes_roundtrip() {
        for ty in [FieldType::U8, FieldType::U16, FieldType::U32, FieldType::U64] {
            let mut ls = LidarScan::new(8, 2, &FieldTypes::from([(ChanField::RawHeaders, ty)]));
            let rh = ls.field_mut(ChanField::RawHeaders).unwrap();
            let data: Vec<u8> = (1..=7).collect();
            assert_eq!(rh.write_column_bytes(1, &data), 7);
            let bytes = rh.column_bytes(1).unwrap();
            assert_eq!(&bytes[..7], &data[..]);
            assert!(bytes[7..].iter().all(|b| *b == 0));
            assert!(rh.column_is_zero(0));
            assert!(!rh.column_is_zero(1));
        }
    }

    #[test]
    fn write_column_bytes_clamps_to_height() {
        let mut ls = scan(FieldType::U16);
        let rh = ls.field_mut(ChanField::RawHeaders).unwrap();
        assert_eq!(rh.write_column_bytes(0, &[0xff; 20]), 8);
        assert_eq!(rh.write_column_bytes(5, &[0xff; 2]), 0);
        assert_eq!(rh.get(3, 0), Some(0xffff));
    }
}
