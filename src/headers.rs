//! Byte-range accessors for packet and column headers/footers.
//!
//! The same four regions exist in two physical arrangements:
//!
//! * [`LidarPacketHeaders`] - inside a lidar packet buffer:
//!   `| packet header | (col header, pixels, col footer) x N | packet footer |`
//! * [`RawHeadersFormat`] - inside one column of the `RAW_HEADERS` scan channel:
//!   `| col header | col footer | packet header | packet footer |`

use crate::base::{ensure_len, Error, Result};
use crate::format::PacketFormat;
use crate::types::ColHeader;
use byteorder::{ByteOrder, LittleEndian};
use log::error;
use std::ops::Range;

/// Resolves `range` inside `buf`, failing when it does not fit.
fn region(buf: &[u8], range: Range<usize>) -> Result<&[u8]> {
    ensure_len(range.end, buf.len())?;
    Ok(&buf[range])
}

fn region_mut(buf: &mut [u8], range: Range<usize>) -> Result<&mut [u8]> {
    ensure_len(range.end, buf.len())?;
    Ok(&mut buf[range])
}

/// Accessors for header and footer regions of a lidar packet buffer.
#[derive(Debug, Clone, Copy)]
pub struct LidarPacketHeaders<'a> {
    pf: &'a PacketFormat,
}

impl<'a> LidarPacketHeaders<'a> {
    pub fn new(pf: &'a PacketFormat) -> LidarPacketHeaders<'a> {
        LidarPacketHeaders { pf }
    }

    pub fn packet_header_range(&self) -> Range<usize> {
        0..self.pf.packet_header_size()
    }

    pub fn packet_footer_range(&self) -> Range<usize> {
        let end = self.pf.lidar_packet_size();
        end - self.pf.packet_footer_size()..end
    }

    /// Fails with [`Error::ColumnOutOfRange`] unless `col < columns_per_packet`.
    fn check_col(&self, col: usize) -> Result<()> {
        let columns = self.pf.columns_per_packet();
        if col < columns {
            Ok(())
        } else {
            error!("Column {} is outside of a {} column packet", col, columns);
            Err(Error::ColumnOutOfRange { col, columns })
        }
    }

    pub fn col_header_range(&self, col: usize) -> Result<Range<usize>> {
        self.check_col(col)?;
        let start = self.pf.packet_header_size() + self.pf.column_size() * col;
        Ok(start..start + self.pf.col_header_size())
    }

    pub fn col_footer_range(&self, col: usize) -> Result<Range<usize>> {
        self.check_col(col)?;
        let end = self.pf.packet_header_size() + self.pf.column_size() * (col + 1);
        Ok(end - self.pf.col_footer_size()..end)
    }

    fn check(&self, buf: &[u8]) -> Result<()> {
        ensure_len(self.pf.lidar_packet_size(), buf.len())
    }

    pub fn packet_header<'b>(&self, buf: &'b [u8]) -> Result<&'b [u8]> {
        self.check(buf)?;
        region(buf, self.packet_header_range())
    }

    pub fn packet_footer<'b>(&self, buf: &'b [u8]) -> Result<&'b [u8]> {
        self.check(buf)?;
        region(buf, self.packet_footer_range())
    }

    pub fn col_header<'b>(&self, buf: &'b [u8], col: usize) -> Result<&'b [u8]> {
        self.check(buf)?;
        region(buf, self.col_header_range(col)?)
    }

    pub fn col_footer<'b>(&self, buf: &'b [u8], col: usize) -> Result<&'b [u8]> {
        self.check(buf)?;
        region(buf, self.col_footer_range(col)?)
    }

    pub fn packet_header_mut<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8]> {
        self.check(buf)?;
        region_mut(buf, self.packet_header_range())
    }

    pub fn packet_footer_mut<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8]> {
        self.check(buf)?;
        region_mut(buf, self.packet_footer_range())
    }

    pub fn col_header_mut<'b>(&self, buf: &'b mut [u8], col: usize) -> Result<&'b mut [u8]> {
        self.check(buf)?;
        region_mut(buf, self.col_header_range(col)?)
    }

    pub fn col_footer_mut<'b>(&self, buf: &'b mut [u8], col: usize) -> Result<&'b mut [u8]> {
        self.check(buf)?;
        region_mut(buf, self.col_footer_range(col)?)
    }

    /// Frame id decoded straight from the header bytes: the first column
    /// header for profiles with a `FRAME_ID` column header, the packet header
    /// otherwise.
    pub fn frame_id(&self, buf: &[u8]) -> Result<u16> {
        let (bytes, offset) = match self.pf.header_descr(ColHeader::FrameId) {
            Ok(descr) => (self.col_header(buf, 0)?, descr.offset as usize),
            Err(_) => (self.packet_header(buf)?, 2),
        };
        match bytes.get(offset..offset + 2) {
            Some(word) => Ok(LittleEndian::read_u16(word)),
            None => Err(Error::BufferTooSmall {
                required: offset + 2,
                actual: bytes.len(),
            }),
        }
    }
}

/// Accessors for header and footer regions packed into one `RAW_HEADERS` column.
#[derive(Debug, Clone, Copy)]
pub struct RawHeadersFormat<'a> {
    pf: &'a PacketFormat,
}

impl<'a> RawHeadersFormat<'a> {
    pub fn new(pf: &'a PacketFormat) -> RawHeadersFormat<'a> {
        RawHeadersFormat { pf }
    }

    /// Bytes of a `RAW_HEADERS` column taken by headers and footers.
    pub fn size(&self) -> usize {
        self.pf.col_header_size()
            + self.pf.col_footer_size()
            + self.pf.packet_header_size()
            + self.pf.packet_footer_size()
    }

    pub fn col_header_range(&self) -> Range<usize> {
        0..self.pf.col_header_size()
    }

    pub fn col_footer_range(&self) -> Range<usize> {
        let start = self.pf.col_header_size();
        start..start + self.pf.col_footer_size()
    }

    pub fn packet_header_range(&self) -> Range<usize> {
        let start = self.pf.col_header_size() + self.pf.col_footer_size();
        start..start + self.pf.packet_header_size()
    }

    pub fn packet_footer_range(&self) -> Range<usize> {
        let start = self.pf.col_header_size()
            + self.pf.col_footer_size()
            + self.pf.packet_header_size();
        start..start + self.pf.packet_footer_size()
    }

    /// Column header bytes of a contiguous `RAW_HEADERS` column.
    pub fn col_header<'b>(&self, col_view: &'b [u8]) -> Result<&'b [u8]> {
        ensure_len(self.size(), col_view.len())?;
        region(col_view, self.col_header_range())
    }

    pub fn col_footer<'b>(&self, col_view: &'b [u8]) -> Result<&'b [u8]> {
        ensure_len(self.size(), col_view.len())?;
        region(col_view, self.col_footer_range())
    }

    pub fn packet_header<'b>(&self, col_view: &'b [u8]) -> Result<&'b [u8]> {
        ensure_len(self.size(), col_view.len())?;
        region(col_view, self.packet_header_range())
    }

    pub fn packet_footer<'b>(&self, col_view: &'b [u8]) -> Result<&'b [u8]> {
        ensure_len(self.size(), col_view.len())?;
        region(col_view, self.packet_footer_range())
    }

    /// Packs the headers and footers seen by column `col` of a lidar packet
    /// into the `RAW_HEADERS` column layout.
    pub fn pack_column(&self, packet_buf: &[u8], col: usize) -> Result<Vec<u8>> {
        let lph = LidarPacketHeaders::new(self.pf);
        let mut packed = Vec::with_capacity(self.size());
        packed.extend_from_slice(lph.col_header(packet_buf, col)?);
        packed.extend_from_slice(lph.col_footer(packet_buf, col)?);
        packed.extend_from_slice(lph.packet_header(packet_buf)?);
        packed.extend_from_slice(lph.packet_footer(packet_buf)?);
        Ok(packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UdpProfileLidar;

    #[test]
    fn legacy_packet_regions() {
        let pf = PacketFormat::from_profile(UdpProfileLidar::Legacy, 64, 16).unwrap();
        let lph = LidarPacketHeaders::new(&pf);
        assert!(lph.packet_header_range().is_empty());
        assert!(lph.packet_footer_range().is_empty());
        assert_eq!(lph.col_header_range(0).unwrap(), 0..16);
        assert_eq!(lph.col_footer_range(0).unwrap(), 784..788);
        assert_eq!(lph.col_header_range(15).unwrap(), 15 * 788..15 * 788 + 16);
        assert_eq!(lph.col_footer_range(15).unwrap(), 12604..12608);

        let buf = vec![0u8; pf.lidar_packet_size()];
        assert!(lph.packet_header(&buf).unwrap().is_empty());
        assert!(lph.packet_footer(&buf).unwrap().is_empty());
    }

    #[test]
    fn eudp_packet_regions() {
        let pf = PacketFormat::from_profile(UdpProfileLidar::Rng15Rfl8Nir8, 16, 16).unwrap();
        let lph = LidarPacketHeaders::new(&pf);
        let column = 12 + 4 * 16;
        assert_eq!(lph.packet_header_range(), 0..32);
        assert_eq!(
            lph.col_header_range(2).unwrap(),
            32 + 2 * column..32 + 2 * column + 12
        );
        assert!(lph.col_footer_range(2).unwrap().is_empty());
        assert_eq!(
            lph.packet_footer_range(),
            32 + 16 * column..32 + 16 * column + 32
        );

        let mut buf = vec![0u8; pf.lidar_packet_size()];
        lph.packet_footer_mut(&mut buf).unwrap().fill(7);
        assert_eq!(buf.iter().filter(|b| **b == 7).count(), 32);
        assert_eq!(*buf.last().unwrap(), 7);
    }

    #[test]
    fn short_packet_buffer_is_rejected() {
        let pf = PacketFormat::from_profile(UdpProfileLidar::Rng15Rfl8Nir8, 16, 16).unwrap();
        let lph = LidarPacketHeaders::new(&pf);
        let buf = vec![0u8; 100];
        assert!(matches!(
            lph.packet_header(&buf),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn column_past_the_packet_is_rejected() {
        let pf = PacketFormat::from_profile(UdpProfileLidar::Rng19Rfl8Sig16Nir16, 16, 16).unwrap();
        let lph = LidarPacketHeaders::new(&pf);
        let mut buf = vec![0u8; pf.lidar_packet_size()];
        let footer = lph.packet_footer_range();
        buf[footer].fill(0x77);

        assert!(lph.col_header(&buf, 15).unwrap().iter().all(|b| *b == 0));
        assert!(matches!(
            lph.col_header(&buf, 16),
            Err(Error::ColumnOutOfRange {
                col: 16,
                columns: 16
            })
        ));
        assert!(lph.col_footer(&buf, 16).is_err());
        assert!(lph.col_header_mut(&mut buf, 17).is_err());
        assert!(lph.col_footer_mut(&mut buf, usize::MAX).is_err());
        assert!(lph.col_header_range(usize::MAX).is_err());

        let rhf = RawHeadersFormat::new(&pf);
        assert!(rhf.pack_column(&buf, 16).is_err());
    }

    #[test]
    fn raw_headers_layout() {
        let legacy = PacketFormat::from_profile(UdpProfileLidar::Legacy, 64, 16).unwrap();
        let rhf = RawHeadersFormat::new(&legacy);
        assert_eq!(rhf.size(), 20);
        assert_eq!(rhf.col_header_range(), 0..16);
        assert_eq!(rhf.col_footer_range(), 16..20);
        assert!(rhf.packet_header_range().is_empty());
        assert!(rhf.packet_footer_range().is_empty());

        let dual =
            PacketFormat::from_profile(UdpProfileLidar::Rng19Rfl8Sig16Nir16Dual, 64, 16).unwrap();
        let rhf = RawHeadersFormat::new(&dual);
        assert_eq!(rhf.size(), 12 + 32 + 32);
        assert!(rhf.col_footer_range().is_empty());
        assert_eq!(rhf.packet_header_range(), 12..44);
        assert_eq!(rhf.packet_footer_range(), 44..76);

        let column: Vec<u8> = (0..80).collect();
        assert_eq!(rhf.packet_header(&column).unwrap()[0], 12);
        assert_eq!(rhf.packet_footer(&column).unwrap().len(), 32);
        assert!(rhf.col_footer(&column).unwrap().is_empty());
        assert!(matches!(
            rhf.col_header(&column[..75]),
            Err(Error::BufferTooSmall {
                required: 76,
                actual: 75
            })
        ));
    }

    #[test]
    fn pack_column_matches_accessors() {
        let pf = PacketFormat::from_profile(UdpProfileLidar::Legacy, 16, 4).unwrap();
        let buf: Vec<u8> = (0..pf.lidar_packet_size()).map(|i| (i % 251) as u8).collect();
        let lph = LidarPacketHeaders::new(&pf);
        let rhf = RawHeadersFormat::new(&pf);

        let packed = rhf.pack_column(&buf, 3).unwrap();
        assert_eq!(packed.len(), rhf.size());
        assert_eq!(rhf.col_header(&packed).unwrap(), lph.col_header(&buf, 3).unwrap());
        assert_eq!(rhf.col_footer(&packed).unwrap(), lph.col_footer(&buf, 3).unwrap());
    }

    #[test]
    fn frame_id_from_header_bytes() {
        for profile in [UdpProfileLidar::Legacy, UdpProfileLidar::Rng19Rfl8Sig16Nir16] {
            let pf = PacketFormat::from_profile(profile, 16, 16).unwrap();
            let mut buf = vec![0u8; pf.lidar_packet_size()];
            pf.set_frame_id(&mut buf, 4242).unwrap();
            assert_eq!(LidarPacketHeaders::new(&pf).frame_id(&buf).unwrap(), 4242);
        }
    }
}
