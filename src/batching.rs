//! Batching of packet buffers into scans.
//!
//! Parsing pixel data into scan channels is the job of a [`ScanBatcher`];
//! this module only drives one through the packets of a single frame.

use crate::base::{Error, Result};
use crate::builders::terminator_buffer;
use crate::fields::{default_scan_fields, FieldTypes};
use crate::scan::LidarScan;
use crate::types::SensorInfo;
use log::{error, trace};

/// Accumulates lidar packets into a scan.
pub trait ScanBatcher {
    /// Adds one lidar packet to `scan`.
    ///
    /// Returns `true` when the packet starts a new frame, i.e. `scan` is
    /// complete and the packet was not added to it.
    fn batch(&mut self, packet: &[u8], scan: &mut LidarScan) -> Result<bool>;
}

/// Batches the packet buffers of a single frame into a new scan.
///
/// # Arguments
///
/// * `bufs` - Lidar packets of exactly one frame, in arrival order.
/// * `info` - Sensor metadata describing the packets.
/// * `fields` - Channels of the scan; the profile defaults when `None`.
/// * `batcher` - Parser feeding packets into the scan.
///
/// Fails with [`Error::InconsistentScanGrouping`] when a packet other than
/// the terminator completes the scan, or when the terminator does not.
pub fn buffers_to_scan<T, B>(
    bufs: &[T],
    info: &SensorInfo,
    fields: Option<FieldTypes>,
    batcher: &mut B,
) -> Result<LidarScan>
where
    T: AsRef<[u8]>,
    B: ScanBatcher + ?Sized,
{
    let fields = match fields {
        Some(fields) => fields,
        None => {
            default_scan_fields(info.format.udp_profile_lidar, false, false).unwrap_or_default()
        }
    };
    let mut scan = LidarScan::new(
        info.format.pixels_per_column,
        info.format.columns_per_frame,
        &fields,
    );

    for (idx, buf) in bufs.iter().enumerate() {
        if batcher.batch(buf.as_ref(), &mut scan)? {
            error!("Buffer {} of {} cut the scan early", idx, bufs.len());
            return Err(Error::InconsistentScanGrouping {
                description: format!(
                    "buffer {} of {} completed a scan before the terminator",
                    idx,
                    bufs.len()
                ),
            });
        }
    }

    if let Some(last) = bufs.last() {
        let terminator = terminator_buffer(info, last.as_ref())?;
        if !batcher.batch(&terminator, &mut scan)? {
            error!("Terminator packet did not complete the scan");
            return Err(Error::InconsistentScanGrouping {
                description: "terminator packet should complete the scan".to_owned(),
            });
        }
    }

    trace!("Batched {} buffers into frame {}", bufs.len(), scan.frame_id);
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PacketFormat;
    use crate::types::{ChanField, FieldType, UdpProfileLidar};

    /// Cuts on frame id change, never writes into the scan.
    struct FrameCounter {
        pf: PacketFormat,
        seen: usize,
    }

    impl ScanBatcher for FrameCounter {
        fn batch(&mut self, packet: &[u8], scan: &mut LidarScan) -> Result<bool> {
            let fid = self.pf.frame_id(packet)? as i32;
            if scan.frame_id != -1 && scan.frame_id != fid {
                return Ok(true);
            }
            scan.frame_id = fid;
            self.seen += 1;
            Ok(false)
        }
    }

    fn setup() -> (SensorInfo, PacketFormat) {
        let info = SensorInfo::new(UdpProfileLidar::Rng19Rfl8Sig16Nir16, 16, 16, 64);
        let pf = PacketFormat::from_info(&info).unwrap();
        (info, pf)
    }

    fn packet(pf: &PacketFormat, frame_id: u16) -> Vec<u8> {
        let mut buf = vec![0u8; pf.lidar_packet_size()];
        pf.set_frame_id(&mut buf, frame_id).unwrap();
        buf
    }

    #[test]
    fn empty_input_gives_empty_scan() {
        let (info, pf) = setup();
        let mut batcher = FrameCounter { pf, seen: 0 };
        let bufs: Vec<Vec<u8>> = Vec::new();
        let scan = buffers_to_scan(&bufs, &info, None, &mut batcher).unwrap();
        assert_eq!(scan.frame_id, -1);
        assert_eq!((scan.h(), scan.w()), (16, 64));
        assert!(scan.has_field(ChanField::Range));
        assert!(!scan.has_field(ChanField::RawHeaders));
        assert_eq!(batcher.seen, 0);
    }

    #[test]
    fn single_frame_is_batched() {
        let (info, pf) = setup();
        let bufs: Vec<Vec<u8>> = (0..4).map(|_| packet(&pf, 12)).collect();
        let mut batcher = FrameCounter { pf, seen: 0 };
        let fields = FieldTypes::from([(ChanField::RawHeaders, FieldType::U32)]);
        let scan = buffers_to_scan(&bufs, &info, Some(fields), &mut batcher).unwrap();
        assert_eq!(scan.frame_id, 12);
        assert_eq!(batcher.seen, 4);
        assert!(scan.has_field(ChanField::RawHeaders));
        assert!(!scan.has_field(ChanField::Range));
    }

    #[test]
    fn two_frames_are_rejected() {
        let (info, pf) = setup();
        let bufs = vec![packet(&pf, 1), packet(&pf, 1), packet(&pf, 2)];
        let mut batcher = FrameCounter { pf, seen: 0 };
        match buffers_to_scan(&bufs, &info, None, &mut batcher) {
            Err(Error::InconsistentScanGrouping { description }) => {
                assert!(description.contains("buffer 2 of 3"))
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn terminator_must_complete_scan() {
        struct NeverCuts;
        impl ScanBatcher for NeverCuts {
            fn batch(&mut self, _packet: &[u8], _scan: &mut LidarScan) -> Result<bool> {
                Ok(false)
            }
        }

        let (info, pf) = setup();
        let bufs = vec![packet(&pf, 3)];
        assert!(matches!(
            buffers_to_scan(&bufs, &info, None, &mut NeverCuts),
            Err(Error::InconsistentScanGrouping { .. })
        ));
    }
}
