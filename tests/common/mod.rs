//! Packet generator and a minimal scan batcher shared by the integration tests.

#![allow(dead_code)]

use ouster_parsing::{
    ChanField, ColHeader, LidarScan, PacketFormat, RawHeadersFormat, Result, ScanBatcher,
    SensorInfo,
};

/// Batches packets by measurement id and cuts the scan on frame id change.
///
/// Copies every channel field the scan and the packet format share and
/// packs header bytes into `RAW_HEADERS` when the scan has that channel.
pub struct TestBatcher {
    pf: PacketFormat,
    w: usize,
}

impl TestBatcher {
    pub fn new(info: &SensorInfo) -> TestBatcher {
        TestBatcher {
            pf: PacketFormat::from_info(info).unwrap(),
            w: info.format.columns_per_frame,
        }
    }
}

impl ScanBatcher for TestBatcher {
    fn batch(&mut self, packet: &[u8], scan: &mut LidarScan) -> Result<bool> {
        let frame_id = self.pf.frame_id(packet)? as i32;
        if scan.frame_id != -1 && scan.frame_id != frame_id {
            return Ok(true);
        }
        scan.frame_id = frame_id;

        let measurement_ids = self.pf.header(packet, ColHeader::MeasurementId)?;
        let rhf = RawHeadersFormat::new(&self.pf);
        let shared: Vec<ChanField> = scan.fields().filter(|f| self.pf.has_field(*f)).collect();

        for col in 0..self.pf.columns_per_packet() {
            let m_id = measurement_ids.get(0, col).unwrap_or(u64::MAX) as usize;
            if m_id >= self.w {
                continue;
            }
            if let Some(rh) = scan.field_mut(ChanField::RawHeaders) {
                rh.write_column_bytes(m_id, &rhf.pack_column(packet, col)?);
            }
            for field in &shared {
                let values = self.pf.field(packet, *field)?.column(col).unwrap_or_default();
                if let Some(dst) = scan.field_mut(*field) {
                    for (row, value) in values.into_iter().enumerate() {
                        dst.set(row, m_id, value);
                    }
                }
            }
        }
        Ok(false)
    }
}

/// Builds one packet of frame `frame_id` carrying columns starting at `first_col`.
///
/// Headers, footers and channel data are filled with patterns that never
/// leave a column header all zero.
pub fn make_packet(pf: &PacketFormat, frame_id: u16, first_col: usize) -> Vec<u8> {
    let mut buf: Vec<u8> = (0..pf.lidar_packet_size())
        .map(|i| ((i * 7 + first_col) % 253) as u8 + 1)
        .collect();
    pf.set_frame_id(&mut buf, frame_id).unwrap();
    pf.set_packet_type(&mut buf, 1).unwrap();
    pf.set_init_id(&mut buf, 0x00ab_cdef).unwrap();
    pf.set_prod_sn(&mut buf, 992_210_000_123).unwrap();

    let cpp = pf.columns_per_packet() as u64;
    let mut ids = pf.header(&mut buf, ColHeader::MeasurementId).unwrap();
    for col in 0..cpp {
        ids.set(0, col as usize, first_col as u64 + col);
    }
    let mut ts = pf.header(&mut buf, ColHeader::Timestamp).unwrap();
    for col in 0..cpp {
        ts.set(0, col as usize, 1_700_000_000_000 + (first_col as u64 + col) * 781_250);
    }
    buf
}

/// All packets of one frame.
pub fn make_frame(info: &SensorInfo, frame_id: u16) -> Vec<Vec<u8>> {
    let pf = PacketFormat::from_info(info).unwrap();
    let cpp = info.format.columns_per_packet;
    (0..info.format.columns_per_frame)
        .step_by(cpp)
        .map(|first_col| make_packet(&pf, frame_id, first_col))
        .collect()
}

/// Copy of `packet` keeping only header and footer bytes.
pub fn headers_only(pf: &PacketFormat, packet: &[u8]) -> Vec<u8> {
    let lph = ouster_parsing::LidarPacketHeaders::new(pf);
    let mut out = vec![0u8; pf.lidar_packet_size()];
    let mut ranges = vec![lph.packet_header_range(), lph.packet_footer_range()];
    for col in 0..pf.columns_per_packet() {
        ranges.push(lph.col_header_range(col).unwrap());
        ranges.push(lph.col_footer_range(col).unwrap());
    }
    for range in ranges {
        out[range.clone()].copy_from_slice(&packet[range]);
    }
    out
}
