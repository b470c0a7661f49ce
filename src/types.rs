use crate::base::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Lidar UDP packet profile, selecting the byte layout of lidar packets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UdpProfileLidar {
    /// Original fixed layout with 12-byte pixels and no packet header or footer.
    Legacy,
    /// Low bandwidth profile: 15-bit range, 8-bit reflectivity, 8-bit near IR.
    Rng15Rfl8Nir8,
    /// Single return profile: 19-bit range, 8-bit reflectivity, 16-bit signal and near IR.
    Rng19Rfl8Sig16Nir16,
    /// Dual return profile with a second range/reflectivity/signal per pixel.
    Rng19Rfl8Sig16Nir16Dual,
    /// Dual return fields plus five raw 32-bit words per pixel.
    FiveWordPixel,
    /// A profile registered outside of this crate, identified by its numeric id.
    Custom(u16),
}

impl UdpProfileLidar {
    /// Returns the metadata name of the profile.
    pub fn name(&self) -> String {
        match self {
            UdpProfileLidar::Legacy => "LEGACY".to_owned(),
            UdpProfileLidar::Rng15Rfl8Nir8 => "RNG15_RFL8_NIR8".to_owned(),
            UdpProfileLidar::Rng19Rfl8Sig16Nir16 => "RNG19_RFL8_SIG16_NIR16".to_owned(),
            UdpProfileLidar::Rng19Rfl8Sig16Nir16Dual => "RNG19_RFL8_SIG16_NIR16_DUAL".to_owned(),
            UdpProfileLidar::FiveWordPixel => "FIVE_WORD_PIXEL".to_owned(),
            UdpProfileLidar::Custom(id) => format!("CUSTOM_{}", id),
        }
    }
}

impl fmt::Display for UdpProfileLidar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for UdpProfileLidar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LEGACY" => Ok(UdpProfileLidar::Legacy),
            "RNG15_RFL8_NIR8" => Ok(UdpProfileLidar::Rng15Rfl8Nir8),
            "RNG19_RFL8_SIG16_NIR16" => Ok(UdpProfileLidar::Rng19Rfl8Sig16Nir16),
            "RNG19_RFL8_SIG16_NIR16_DUAL" => Ok(UdpProfileLidar::Rng19Rfl8Sig16Nir16Dual),
            "FIVE_WORD_PIXEL" => Ok(UdpProfileLidar::FiveWordPixel),
            other => Err(Error::UnsupportedProfile {
                description: format!("unknown profile name {:?}", other),
            }),
        }
    }
}

/// Logical per-pixel measurement channel of a scan.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChanField {
    Range,
    Range2,
    Signal,
    Signal2,
    Reflectivity,
    Reflectivity2,
    NearIr,
    Flags,
    Flags2,
    /// Packed packet/column headers and footers, one column of bytes per scan column.
    RawHeaders,
    Raw32Word1,
    Raw32Word2,
    Raw32Word3,
    Raw32Word4,
    Raw32Word5,
}

impl fmt::Display for ChanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChanField::Range => "RANGE",
            ChanField::Range2 => "RANGE2",
            ChanField::Signal => "SIGNAL",
            ChanField::Signal2 => "SIGNAL2",
            ChanField::Reflectivity => "REFLECTIVITY",
            ChanField::Reflectivity2 => "REFLECTIVITY2",
            ChanField::NearIr => "NEAR_IR",
            ChanField::Flags => "FLAGS",
            ChanField::Flags2 => "FLAGS2",
            ChanField::RawHeaders => "RAW_HEADERS",
            ChanField::Raw32Word1 => "RAW32_WORD1",
            ChanField::Raw32Word2 => "RAW32_WORD2",
            ChanField::Raw32Word3 => "RAW32_WORD3",
            ChanField::Raw32Word4 => "RAW32_WORD4",
            ChanField::Raw32Word5 => "RAW32_WORD5",
        };
        write!(f, "{}", name)
    }
}

/// Per-column header value carried in every measurement column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColHeader {
    Timestamp,
    MeasurementId,
    FrameId,
    EncoderCount,
    Status,
}

impl fmt::Display for ColHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColHeader::Timestamp => "TIMESTAMP",
            ColHeader::MeasurementId => "MEASUREMENT_ID",
            ColHeader::FrameId => "FRAME_ID",
            ColHeader::EncoderCount => "ENCODER_COUNT",
            ColHeader::Status => "STATUS",
        };
        write!(f, "{}", name)
    }
}

/// Unsigned storage width of a field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    U8,
    U16,
    U32,
    U64,
}

impl FieldType {
    /// Size of one element in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            FieldType::U8 => 1,
            FieldType::U16 => 2,
            FieldType::U32 => 4,
            FieldType::U64 => 8,
        }
    }

    /// All bits that fit the storage width.
    #[inline]
    pub fn max_value(&self) -> u64 {
        match self {
            FieldType::U8 => u8::MAX as u64,
            FieldType::U16 => u16::MAX as u64,
            FieldType::U32 => u32::MAX as u64,
            FieldType::U64 => u64::MAX,
        }
    }
}

/// Lidar data format section of the sensor metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFormat {
    /// Packet layout used by the sensor.
    pub udp_profile_lidar: UdpProfileLidar,
    /// Number of pixels (beams) per measurement column.
    pub pixels_per_column: usize,
    /// Number of measurement columns carried by one lidar packet.
    pub columns_per_packet: usize,
    /// Number of columns in one full rotation.
    pub columns_per_frame: usize,
}

impl Default for DataFormat {
    fn default() -> Self {
        DataFormat {
            udp_profile_lidar: UdpProfileLidar::Legacy,
            pixels_per_column: 64,
            columns_per_packet: 16,
            columns_per_frame: 1024,
        }
    }
}

/// The subset of sensor metadata consumed by this crate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorInfo {
    pub format: DataFormat,
}

impl SensorInfo {
    /// Creates sensor info for a profile and scan geometry.
    ///
    /// # Arguments
    ///
    /// * `profile` - Lidar packet profile.
    /// * `pixels_per_column` - Scan height `h`.
    /// * `columns_per_packet` - Columns carried by each packet.
    /// * `columns_per_frame` - Scan width `w`.
    pub fn new(
        profile: UdpProfileLidar,
        pixels_per_column: usize,
        columns_per_packet: usize,
        columns_per_frame: usize,
    ) -> SensorInfo {
        SensorInfo {
            format: DataFormat {
                udp_profile_lidar: profile,
                pixels_per_column,
                columns_per_packet,
                columns_per_frame,
            },
        }
    }
}
