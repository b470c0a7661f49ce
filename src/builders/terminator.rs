use crate::base::{Error, Result};
use crate::format::PacketFormat;
use crate::headers::LidarPacketHeaders;
use crate::types::SensorInfo;
use log::{error, trace};

/// Filler byte of the terminator packet payload.
pub const TERMINATOR_FILL: u8 = 0xFE;

/// Makes the packet that follows `last_buf` and closes its scan.
///
/// The returned buffer is filled with [`TERMINATOR_FILL`] and carries the
/// next frame id, so a batcher fed with it finishes the scan in progress.
///
/// # Arguments
///
/// * `info` - Metadata of the sensor that produced `last_buf`.
/// * `last_buf` - The last lidar packet passed to the batcher.
pub fn terminator_buffer(info: &SensorInfo, last_buf: &[u8]) -> Result<Vec<u8>> {
    let pf = PacketFormat::from_info(info)?;

    let frame_id = pf.frame_id(last_buf)?;
    let header_frame_id = LidarPacketHeaders::new(&pf).frame_id(last_buf)?;
    if frame_id != header_frame_id {
        error!(
            "Frame id of the last packet decodes as {} and {}",
            frame_id, header_frame_id
        );
        return Err(Error::InconsistentScanGrouping {
            description: format!(
                "frame id decodes as {} from the packet format and {} from the header bytes",
                frame_id, header_frame_id
            ),
        });
    }

    let mut buf = vec![TERMINATOR_FILL; pf.lidar_packet_size()];
    let next = frame_id.wrapping_add(1);
    pf.set_frame_id(&mut buf, next)?;
    trace!("Terminator packet for frame {} uses frame id {}", frame_id, next);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColHeader, UdpProfileLidar};

    #[test]
    fn terminator_of_eudp_packet() {
        let info = SensorInfo::new(UdpProfileLidar::Rng19Rfl8Sig16Nir16, 64, 16, 1024);
        let pf = PacketFormat::from_info(&info).unwrap();
        let mut last = vec![0u8; pf.lidar_packet_size()];
        pf.set_frame_id(&mut last, 41).unwrap();

        let buf = terminator_buffer(&info, &last).unwrap();
        assert_eq!(buf.len(), pf.lidar_packet_size());
        assert_eq!(pf.frame_id(&buf).unwrap(), 42);
        assert_eq!(buf[5000], TERMINATOR_FILL);
        assert_eq!(&buf[..2], &[TERMINATOR_FILL; 2]);
        assert!(buf[4..].iter().all(|b| *b == TERMINATOR_FILL));
    }

    #[test]
    fn frame_id_wraps_around() {
        let info = SensorInfo::new(UdpProfileLidar::Rng15Rfl8Nir8, 64, 16, 1024);
        let pf = PacketFormat::from_info(&info).unwrap();
        let mut last = vec![0u8; pf.lidar_packet_size()];
        pf.set_frame_id(&mut last, 65535).unwrap();

        let buf = terminator_buffer(&info, &last).unwrap();
        assert_eq!(pf.frame_id(&buf).unwrap(), 0);
    }

    #[test]
    fn terminator_of_legacy_packet() {
        let info = SensorInfo::default();
        let pf = PacketFormat::from_info(&info).unwrap();
        let mut last = vec![0u8; pf.lidar_packet_size()];
        pf.set_frame_id(&mut last, 7).unwrap();

        let buf = terminator_buffer(&info, &last).unwrap();
        assert_eq!(pf.frame_id(&buf).unwrap(), 8);
        let frame_ids = pf.header(&buf, ColHeader::FrameId).unwrap();
        assert!(frame_ids.iter().all(|v| v == 8));
        assert_eq!(buf[5000], TERMINATOR_FILL);
    }

    #[test]
    fn short_last_buffer() {
        let info = SensorInfo::default();
        assert!(matches!(
            terminator_buffer(&info, &[0u8; 100]),
            Err(Error::BufferTooSmall { .. })
        ));
    }
}
