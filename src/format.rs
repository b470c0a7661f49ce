//! Per-profile lidar packet layouts.
//!
//! A [`PacketFormat`] knows the geometry of one lidar packet profile (header,
//! column and footer sizes) and the bit-level position of every channel field
//! and column header inside a measurement column. All multi-byte values are
//! little-endian.
//!
//! ```text
//! | packet header | column 0 | column 1 | ... | column N-1 | packet footer |
//!
//! column:  | col header | pixel 0 | pixel 1 | ... | pixel M-1 | col footer |
//! ```

use crate::base::{ensure_len, Error, Result};
use crate::masked_view::MaskedView;
use crate::types::{ChanField, ColHeader, FieldType, SensorInfo, UdpProfileLidar};
use byteorder::{ByteOrder, LittleEndian};
use log::{error, trace};

/// Position of one field inside a measurement column.
///
/// `offset` is counted from the start of the channel data of a pixel for
/// channel fields, and from the start of the column for column headers. A
/// negative header offset is counted back from the end of the column.
///
/// `shift` follows the decode direction: a positive value shifts right when
/// reading, a negative value shifts left when reading. Writing applies the
/// inverse shift.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FieldDescr {
    pub offset: isize,
    pub ty: FieldType,
    pub mask: Option<u64>,
    pub shift: i8,
}

impl FieldDescr {
    pub const fn new(offset: isize, ty: FieldType) -> FieldDescr {
        FieldDescr {
            offset,
            ty,
            mask: None,
            shift: 0,
        }
    }

    pub const fn masked(self, mask: u64) -> FieldDescr {
        FieldDescr {
            mask: Some(mask),
            ..self
        }
    }

    pub const fn shifted(self, shift: i8) -> FieldDescr {
        FieldDescr { shift, ..self }
    }

    /// Turns a raw stored word into the field value (mask, then shift).
    #[inline]
    pub fn decode(&self, raw: u64) -> u64 {
        let value = match self.mask {
            Some(mask) => raw & mask,
            None => raw,
        };
        if self.shift > 0 {
            value >> self.shift
        } else if self.shift < 0 {
            value << self.shift.unsigned_abs()
        } else {
            value
        }
    }

    /// Turns a field value back into a stored word, keeping the bits of `old`
    /// that lie outside the mask.
    #[inline]
    pub fn encode(&self, value: u64, old: u64) -> u64 {
        let shifted = if self.shift > 0 {
            value << self.shift
        } else if self.shift < 0 {
            value >> self.shift.unsigned_abs()
        } else {
            value
        };
        let word = match self.mask {
            Some(mask) => (shifted & mask) | (old & !mask),
            None => shifted,
        };
        word & self.ty.max_value()
    }
}

/// Reads one little-endian word of type `ty` from the start of `bytes`.
#[inline]
pub(crate) fn read_word(ty: FieldType, bytes: &[u8]) -> u64 {
    match ty {
        FieldType::U8 => bytes[0] as u64,
        FieldType::U16 => LittleEndian::read_u16(bytes) as u64,
        FieldType::U32 => LittleEndian::read_u32(bytes) as u64,
        FieldType::U64 => LittleEndian::read_u64(bytes),
    }
}

/// Writes one little-endian word of type `ty` to the start of `bytes`.
#[inline]
pub(crate) fn write_word(ty: FieldType, bytes: &mut [u8], value: u64) {
    match ty {
        FieldType::U8 => bytes[0] = value as u8,
        FieldType::U16 => LittleEndian::write_u16(bytes, value as u16),
        FieldType::U32 => LittleEndian::write_u32(bytes, value as u32),
        FieldType::U64 => LittleEndian::write_u64(bytes, value),
    }
}

type FieldTable = &'static [(ChanField, FieldDescr)];
type HeaderTable = &'static [(ColHeader, FieldDescr)];

const LEGACY_HEADERS: HeaderTable = &[
    (ColHeader::Timestamp, FieldDescr::new(0, FieldType::U64)),
    (ColHeader::MeasurementId, FieldDescr::new(8, FieldType::U16)),
    (ColHeader::FrameId, FieldDescr::new(10, FieldType::U16)),
    (ColHeader::EncoderCount, FieldDescr::new(12, FieldType::U32)),
    (ColHeader::Status, FieldDescr::new(-4, FieldType::U32)),
];

const LEGACY_FIELDS: FieldTable = &[
    (
        ChanField::Range,
        FieldDescr::new(0, FieldType::U32).masked(0x000f_ffff),
    ),
    (ChanField::Reflectivity, FieldDescr::new(4, FieldType::U16)),
    (ChanField::Signal, FieldDescr::new(6, FieldType::U16)),
    (ChanField::Flags, FieldDescr::new(3, FieldType::U8).shifted(4)),
    (ChanField::NearIr, FieldDescr::new(8, FieldType::U16)),
];

const EUDP_HEADERS: HeaderTable = &[
    (ColHeader::Timestamp, FieldDescr::new(0, FieldType::U64)),
    (ColHeader::MeasurementId, FieldDescr::new(8, FieldType::U16)),
    (ColHeader::Status, FieldDescr::new(10, FieldType::U16)),
];

const LB_FIELDS: FieldTable = &[
    (
        ChanField::Range,
        FieldDescr::new(0, FieldType::U16).masked(0x7fff).shifted(-3),
    ),
    (ChanField::Reflectivity, FieldDescr::new(2, FieldType::U8)),
    (ChanField::NearIr, FieldDescr::new(3, FieldType::U8).shifted(-4)),
];

const SINGLE_FIELDS: FieldTable = &[
    (
        ChanField::Range,
        FieldDescr::new(0, FieldType::U32).masked(0x000f_ffff),
    ),
    (ChanField::Reflectivity, FieldDescr::new(4, FieldType::U16)),
    (ChanField::Signal, FieldDescr::new(6, FieldType::U16)),
    (ChanField::Flags, FieldDescr::new(3, FieldType::U8).shifted(4)),
    (ChanField::NearIr, FieldDescr::new(8, FieldType::U16)),
];

const DUAL_FIELDS: FieldTable = &[
    (
        ChanField::Range,
        FieldDescr::new(0, FieldType::U32).masked(0x0007_ffff),
    ),
    (ChanField::Reflectivity, FieldDescr::new(3, FieldType::U8)),
    (
        ChanField::Range2,
        FieldDescr::new(4, FieldType::U32).masked(0x0007_ffff),
    ),
    (ChanField::Reflectivity2, FieldDescr::new(7, FieldType::U8)),
    (ChanField::Signal, FieldDescr::new(8, FieldType::U16)),
    (ChanField::Signal2, FieldDescr::new(10, FieldType::U16)),
    (
        ChanField::Flags,
        FieldDescr::new(2, FieldType::U8).masked(0b1111_1000).shifted(3),
    ),
    (
        ChanField::Flags2,
        FieldDescr::new(6, FieldType::U8).masked(0b1111_1000).shifted(3),
    ),
    (ChanField::NearIr, FieldDescr::new(12, FieldType::U16)),
];

/// Extended UDP packet header/footer and column header sizes.
const EUDP_PACKET_HEADER_SIZE: usize = 32;
const EUDP_PACKET_FOOTER_SIZE: usize = 32;
const EUDP_COL_HEADER_SIZE: usize = 12;

const LEGACY_COL_HEADER_SIZE: usize = 16;
const LEGACY_COL_FOOTER_SIZE: usize = 4;
const LEGACY_CHANNEL_DATA_SIZE: usize = 12;

/// Where the packet-level metadata (packet type, frame id, ...) lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Layout {
    /// Frame id is a column header; no packet header.
    Legacy,
    /// Packet header carries packet type, frame id, init id and serial number.
    Eudp,
}

/// Byte layout of lidar packets for one profile and sensor geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketFormat {
    profile: UdpProfileLidar,
    layout: Layout,
    pixels_per_column: usize,
    columns_per_packet: usize,
    packet_header_size: usize,
    col_header_size: usize,
    channel_data_size: usize,
    col_footer_size: usize,
    packet_footer_size: usize,
    column_size: usize,
    lidar_packet_size: usize,
    fields: FieldTable,
    headers: HeaderTable,
}

impl PacketFormat {
    #[allow(clippy::too_many_arguments)]
    fn with_geometry(
        profile: UdpProfileLidar,
        layout: Layout,
        pixels_per_column: usize,
        columns_per_packet: usize,
        packet_header_size: usize,
        col_header_size: usize,
        channel_data_size: usize,
        col_footer_size: usize,
        packet_footer_size: usize,
        fields: FieldTable,
        headers: HeaderTable,
    ) -> PacketFormat {
        let column_size = col_header_size + pixels_per_column * channel_data_size + col_footer_size;
        let lidar_packet_size =
            packet_header_size + columns_per_packet * column_size + packet_footer_size;
        trace!(
            "PacketFormat {}: {}x{} pixels, column size {}, packet size {}",
            profile,
            pixels_per_column,
            columns_per_packet,
            column_size,
            lidar_packet_size
        );
        PacketFormat {
            profile,
            layout,
            pixels_per_column,
            columns_per_packet,
            packet_header_size,
            col_header_size,
            channel_data_size,
            col_footer_size,
            packet_footer_size,
            column_size,
            lidar_packet_size,
            fields,
            headers,
        }
    }

    fn legacy(pixels_per_column: usize, columns_per_packet: usize) -> PacketFormat {
        PacketFormat::with_geometry(
            UdpProfileLidar::Legacy,
            Layout::Legacy,
            pixels_per_column,
            columns_per_packet,
            0,
            LEGACY_COL_HEADER_SIZE,
            LEGACY_CHANNEL_DATA_SIZE,
            LEGACY_COL_FOOTER_SIZE,
            0,
            LEGACY_FIELDS,
            LEGACY_HEADERS,
        )
    }

    fn eudp(
        profile: UdpProfileLidar,
        pixels_per_column: usize,
        columns_per_packet: usize,
        channel_data_size: usize,
        fields: FieldTable,
    ) -> PacketFormat {
        PacketFormat::with_geometry(
            profile,
            Layout::Eudp,
            pixels_per_column,
            columns_per_packet,
            EUDP_PACKET_HEADER_SIZE,
            EUDP_COL_HEADER_SIZE,
            channel_data_size,
            0,
            EUDP_PACKET_FOOTER_SIZE,
            fields,
            EUDP_HEADERS,
        )
    }

    /// Selects the packet format for a profile.
    ///
    /// # Arguments
    ///
    /// * `profile` - The lidar packet profile.
    /// * `pixels_per_column` - Number of pixels in every measurement column.
    /// * `columns_per_packet` - Number of measurement columns in every packet.
    ///
    /// Fails with [`Error::UnsupportedProfile`] when no layout is known for the profile.
    pub fn from_profile(
        profile: UdpProfileLidar,
        pixels_per_column: usize,
        columns_per_packet: usize,
    ) -> Result<PacketFormat> {
        match profile {
            UdpProfileLidar::Legacy => {
                Ok(PacketFormat::legacy(pixels_per_column, columns_per_packet))
            }
            UdpProfileLidar::Rng15Rfl8Nir8 => Ok(PacketFormat::eudp(
                profile,
                pixels_per_column,
                columns_per_packet,
                4,
                LB_FIELDS,
            )),
            UdpProfileLidar::Rng19Rfl8Sig16Nir16 => Ok(PacketFormat::eudp(
                profile,
                pixels_per_column,
                columns_per_packet,
                12,
                SINGLE_FIELDS,
            )),
            UdpProfileLidar::Rng19Rfl8Sig16Nir16Dual => Ok(PacketFormat::eudp(
                profile,
                pixels_per_column,
                columns_per_packet,
                16,
                DUAL_FIELDS,
            )),
            UdpProfileLidar::FiveWordPixel | UdpProfileLidar::Custom(_) => {
                error!("No packet format registered for profile {}", profile);
                Err(Error::UnsupportedProfile {
                    description: format!("no packet format for {}", profile),
                })
            }
        }
    }

    /// Selects the packet format described by the sensor metadata.
    pub fn from_info(info: &SensorInfo) -> Result<PacketFormat> {
        PacketFormat::from_profile(
            info.format.udp_profile_lidar,
            info.format.pixels_per_column,
            info.format.columns_per_packet,
        )
    }

    /// Checks whether packets of format `a` can be reinterpreted as format `b`,
    /// i.e. every field and column header of `b` also exists in `a`.
    pub fn convertible(a: &PacketFormat, b: &PacketFormat) -> bool {
        b.fields.iter().all(|(f, _)| a.has_field(*f))
            && b.headers.iter().all(|(h, _)| a.has_header(*h))
    }

    pub fn profile(&self) -> UdpProfileLidar {
        self.profile
    }

    pub fn pixels_per_column(&self) -> usize {
        self.pixels_per_column
    }

    pub fn columns_per_packet(&self) -> usize {
        self.columns_per_packet
    }

    pub fn packet_header_size(&self) -> usize {
        self.packet_header_size
    }

    pub fn packet_footer_size(&self) -> usize {
        self.packet_footer_size
    }

    pub fn col_header_size(&self) -> usize {
        self.col_header_size
    }

    pub fn col_footer_size(&self) -> usize {
        self.col_footer_size
    }

    /// Bytes of channel data per pixel.
    pub fn channel_data_size(&self) -> usize {
        self.channel_data_size
    }

    /// Bytes per measurement column, including its header and footer.
    pub fn column_size(&self) -> usize {
        self.column_size
    }

    /// Bytes per lidar packet.
    pub fn lidar_packet_size(&self) -> usize {
        self.lidar_packet_size
    }

    /// Channel fields carried by this profile, in table order.
    pub fn fields(&self) -> impl Iterator<Item = ChanField> + '_ {
        self.fields.iter().map(|(f, _)| *f)
    }

    /// Column headers carried by this profile, in table order.
    pub fn headers(&self) -> impl Iterator<Item = ColHeader> + '_ {
        self.headers.iter().map(|(h, _)| *h)
    }

    pub fn has_field(&self, field: ChanField) -> bool {
        self.fields.iter().any(|(f, _)| *f == field)
    }

    pub fn has_header(&self, header: ColHeader) -> bool {
        self.headers.iter().any(|(h, _)| *h == header)
    }

    /// Looks up the descriptor of a channel field.
    pub fn field_descr(&self, field: ChanField) -> Result<FieldDescr> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, d)| *d)
            .ok_or_else(|| Error::UnknownField {
                description: format!("{} is not a field of {}", field, self.profile),
            })
    }

    /// Looks up the descriptor of a column header.
    pub fn header_descr(&self, header: ColHeader) -> Result<FieldDescr> {
        self.headers
            .iter()
            .find(|(h, _)| *h == header)
            .map(|(_, d)| *d)
            .ok_or_else(|| Error::UnknownField {
                description: format!("{} is not a column header of {}", header, self.profile),
            })
    }

    /// Returns a view of one channel field across all pixels and columns of a packet.
    ///
    /// Pass `&buf` for a read-only view or `&mut buf` for a writable one.
    pub fn field<B: AsRef<[u8]>>(&self, data: B, field: ChanField) -> Result<MaskedView<B>> {
        MaskedView::new(data, self, field)
    }

    /// Returns a view of one column header across all columns of a packet.
    pub fn header<B: AsRef<[u8]>>(&self, data: B, header: ColHeader) -> Result<MaskedView<B>> {
        MaskedView::new(data, self, header)
    }

    /// Packet type, 0 for the legacy profile.
    pub fn packet_type(&self, data: &[u8]) -> Result<u16> {
        ensure_len(self.lidar_packet_size, data.len())?;
        match self.layout {
            Layout::Legacy => Ok(0),
            Layout::Eudp => Ok(LittleEndian::read_u16(&data[0..2])),
        }
    }

    pub fn set_packet_type(&self, data: &mut [u8], value: u16) -> Result<()> {
        ensure_len(self.lidar_packet_size, data.len())?;
        if self.layout == Layout::Eudp {
            LittleEndian::write_u16(&mut data[0..2], value);
        }
        Ok(())
    }

    /// Frame id of the packet; the legacy profile reads it from the first column header.
    pub fn frame_id(&self, data: &[u8]) -> Result<u16> {
        ensure_len(self.lidar_packet_size, data.len())?;
        match self.layout {
            Layout::Legacy => {
                let view = self.header(data, ColHeader::FrameId)?;
                Ok(view.get(0, 0).unwrap_or(0) as u16)
            }
            Layout::Eudp => Ok(LittleEndian::read_u16(&data[2..4])),
        }
    }

    /// Sets the frame id; the legacy profile writes it into every column header.
    pub fn set_frame_id(&self, data: &mut [u8], value: u16) -> Result<()> {
        ensure_len(self.lidar_packet_size, data.len())?;
        match self.layout {
            Layout::Legacy => {
                let mut view = self.header(&mut *data, ColHeader::FrameId)?;
                view.fill(value as u64);
            }
            Layout::Eudp => LittleEndian::write_u16(&mut data[2..4], value),
        }
        Ok(())
    }

    /// 24-bit initialization id, 0 for the legacy profile.
    pub fn init_id(&self, data: &[u8]) -> Result<u32> {
        ensure_len(self.lidar_packet_size, data.len())?;
        match self.layout {
            Layout::Legacy => Ok(0),
            Layout::Eudp => Ok(LittleEndian::read_uint(&data[4..7], 3) as u32),
        }
    }

    /// Sets the init id; bits above 24 are dropped.
    pub fn set_init_id(&self, data: &mut [u8], value: u32) -> Result<()> {
        ensure_len(self.lidar_packet_size, data.len())?;
        if self.layout == Layout::Eudp {
            LittleEndian::write_uint(&mut data[4..7], (value & 0x00ff_ffff) as u64, 3);
        }
        Ok(())
    }

    /// 40-bit sensor serial number, 0 for the legacy profile.
    pub fn prod_sn(&self, data: &[u8]) -> Result<u64> {
        ensure_len(self.lidar_packet_size, data.len())?;
        match self.layout {
            Layout::Legacy => Ok(0),
            Layout::Eudp => Ok(LittleEndian::read_uint(&data[7..12], 5)),
        }
    }

    /// Sets the serial number; bits above 40 are dropped.
    pub fn set_prod_sn(&self, data: &mut [u8], value: u64) -> Result<()> {
        ensure_len(self.lidar_packet_size, data.len())?;
        if self.layout == Layout::Eudp {
            LittleEndian::write_uint(&mut data[7..12], value & 0xff_ffff_ffff, 5);
        }
        Ok(())
    }
}
