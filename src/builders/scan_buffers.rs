//! Reconstruction of lidar packet buffers from the `RAW_HEADERS` scan channel.
//!
//! Only the packet header/footer and the column headers/footers are restored;
//! channel data bytes stay zero. Packet groups whose first `RAW_HEADERS`
//! column is all zero were never batched and produce no buffer. When the scan
//! width is not a multiple of `columns_per_packet`, the final short group is
//! still rebuilt from the columns that exist.

use crate::base::{ensure_len, Error, Result};
use crate::format::{write_word, PacketFormat};
use crate::headers::{LidarPacketHeaders, RawHeadersFormat};
use crate::scan::{FieldArray, LidarScan};
use crate::types::{ChanField, SensorInfo};
use log::{error, trace, warn};

/// Resolves the `RAW_HEADERS` channel and packet format of a scan.
///
/// Returns `None` when the scan has no `RAW_HEADERS` channel.
fn raw_headers_source<'a>(
    ls: &'a LidarScan,
    info: &SensorInfo,
) -> Result<Option<(&'a FieldArray, PacketFormat)>> {
    let rh = match ls.field(ChanField::RawHeaders) {
        Some(rh) => rh,
        None => {
            trace!("Scan has no RAW_HEADERS field, no packets to rebuild");
            return Ok(None);
        }
    };
    let pf = PacketFormat::from_info(info)?;
    if pf.columns_per_packet() == 0 {
        error!("Cannot group scan columns into packets of zero columns");
        return Err(Error::InconsistentScanGrouping {
            description: "columns_per_packet is zero".to_owned(),
        });
    }

    let raw_size = RawHeadersFormat::new(&pf).size();
    let (h, _) = rh.dim();
    ensure_len(raw_size, h * rh.field_type().size())?;

    if ls.w() % pf.columns_per_packet() != 0 {
        warn!(
            "Scan width {} is not a multiple of {} columns per packet, last packet is short",
            ls.w(),
            pf.columns_per_packet()
        );
    }
    Ok(Some((rh, pf)))
}

/// Lazily rebuilt lidar packet buffers of one scan, see [`scan_buffers_fast`].
pub struct ScanBuffers<'a> {
    source: Option<(&'a FieldArray, PacketFormat)>,
    w: usize,
    next_col: usize,
    rows: usize,
    scratch: Vec<u8>,
}

impl<'a> ScanBuffers<'a> {
    fn new(source: Option<(&'a FieldArray, PacketFormat)>, w: usize) -> ScanBuffers<'a> {
        let (rows, scratch) = match &source {
            Some((rh, pf)) => {
                let word = rh.field_type().size();
                let rows = RawHeadersFormat::new(pf).size().div_ceil(word);
                (rows, vec![0u8; rows * word])
            }
            None => (0, Vec::new()),
        };
        ScanBuffers {
            source,
            w,
            next_col: 0,
            rows,
            scratch,
        }
    }
}

/// Copies the leading `rows` words of column `col` into `scratch` as little-endian bytes.
fn load_column(rh: &FieldArray, col: usize, rows: usize, scratch: &mut [u8]) {
    let ty = rh.field_type();
    let word = ty.size();
    for row in 0..rows {
        write_word(ty, &mut scratch[row * word..], rh.get(row, col).unwrap_or(0));
    }
}

impl Iterator for ScanBuffers<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let (rh, pf) = self.source.as_ref()?;
        let (rh, pf) = (*rh, pf);
        let cpp = pf.columns_per_packet();
        let chs = pf.col_header_size();
        let cfs = pf.col_footer_size();
        let phs = pf.packet_header_size();
        let pfs = pf.packet_footer_size();
        let col_size = pf.column_size();

        while self.next_col < self.w {
            let pi = self.next_col;
            self.next_col += cpp;

            if rh.column_is_zero(pi) {
                trace!("Columns {}..{} were never batched, skipping", pi, pi + cpp);
                continue;
            }

            let mut buf = vec![0u8; pf.lidar_packet_size()];
            load_column(rh, pi, self.rows, &mut self.scratch);

            let ph_start = chs + cfs;
            buf[..phs].copy_from_slice(&self.scratch[ph_start..ph_start + phs]);
            let footer_at = phs + cpp * col_size;
            buf[footer_at..footer_at + pfs]
                .copy_from_slice(&self.scratch[ph_start + phs..ph_start + phs + pfs]);

            for pc in 0..cpp.min(self.w - pi) {
                if pc > 0 {
                    load_column(rh, pi + pc, self.rows, &mut self.scratch);
                }
                let col_offset = phs + pc * col_size;
                buf[col_offset..col_offset + chs].copy_from_slice(&self.scratch[..chs]);
                buf[col_offset + col_size - cfs..col_offset + col_size]
                    .copy_from_slice(&self.scratch[chs..chs + cfs]);
            }

            trace!("Rebuilt packet for columns {}..{}", pi, pi + cpp);
            return Some(buf);
        }
        None
    }
}

/// Reconstructs lidar packets from a scan, computing every offset directly
/// in a loop over the scan columns.
///
/// Yields nothing when the scan has no `RAW_HEADERS` field. Sizes are
/// validated up front, so the returned iterator itself never fails.
pub fn scan_buffers_fast<'a>(ls: &'a LidarScan, info: &SensorInfo) -> Result<ScanBuffers<'a>> {
    let source = raw_headers_source(ls, info)?;
    Ok(ScanBuffers::new(source, ls.w()))
}

/// Reconstructs lidar packets from a scan through the [`LidarPacketHeaders`]
/// and [`RawHeadersFormat`] accessors.
///
/// Produces the same buffers as [`scan_buffers_fast`].
pub fn scan_buffers_nice(ls: &LidarScan, info: &SensorInfo) -> Result<Vec<Vec<u8>>> {
    let (rh, pf) = match raw_headers_source(ls, info)? {
        Some(source) => source,
        None => return Ok(Vec::new()),
    };
    let lph = LidarPacketHeaders::new(&pf);
    let rhf = RawHeadersFormat::new(&pf);
    let cpp = pf.columns_per_packet();
    let w = ls.w();

    let column = |col: usize| {
        rh.column_bytes(col).ok_or_else(|| Error::InconsistentScanGrouping {
            description: format!("column {} is outside of RAW_HEADERS", col),
        })
    };

    let mut buffers = Vec::new();
    for pi in (0..w).step_by(cpp) {
        if rh.column_is_zero(pi) {
            trace!("Columns {}..{} were never batched, skipping", pi, pi + cpp);
            continue;
        }
        let mut buf = vec![0u8; pf.lidar_packet_size()];

        let col0 = column(pi)?;
        lph.packet_header_mut(&mut buf)?.copy_from_slice(rhf.packet_header(&col0)?);
        lph.packet_footer_mut(&mut buf)?.copy_from_slice(rhf.packet_footer(&col0)?);

        for pc in 0..cpp.min(w - pi) {
            let col = column(pi + pc)?;
            lph.col_header_mut(&mut buf, pc)?.copy_from_slice(rhf.col_header(&col)?);
            lph.col_footer_mut(&mut buf, pc)?.copy_from_slice(rhf.col_footer(&col)?);
        }

        trace!("Rebuilt packet for columns {}..{}", pi, pi + cpp);
        buffers.push(buf);
    }
    Ok(buffers)
}

/// Reconstructs lidar packets from a scan (headers and footers only).
pub fn scan_buffers<'a>(ls: &'a LidarScan, info: &SensorInfo) -> Result<ScanBuffers<'a>> {
    scan_buffers_fast(ls, info)
}

/// Converts a scan into lidar packet buffers that batch back into the same
/// scan, less the channel data.
pub fn scan_to_buffers(ls: &LidarScan, info: &SensorInfo) -> Result<Vec<Vec<u8>>> {
    Ok(scan_buffers(ls, info)?.collect())
}
