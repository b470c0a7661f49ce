use crate::types::{ChanField, FieldType, UdpProfileLidar};
use log::{trace, warn};
use std::collections::BTreeMap;

/// Mapping of scan channel to storage width.
pub type FieldTypes = BTreeMap<ChanField, FieldType>;

fn legacy_fields() -> FieldTypes {
    FieldTypes::from([
        (ChanField::Range, FieldType::U32),
        (ChanField::Signal, FieldType::U32),
        (ChanField::NearIr, FieldType::U32),
        (ChanField::Reflectivity, FieldType::U32),
    ])
}

fn low_bandwidth_fields() -> FieldTypes {
    FieldTypes::from([
        (ChanField::Range, FieldType::U32),
        (ChanField::Reflectivity, FieldType::U16),
        (ChanField::NearIr, FieldType::U16),
    ])
}

fn single_fields() -> FieldTypes {
    FieldTypes::from([
        (ChanField::Range, FieldType::U32),
        (ChanField::Signal, FieldType::U16),
        (ChanField::NearIr, FieldType::U16),
        (ChanField::Reflectivity, FieldType::U16),
    ])
}

fn dual_fields() -> FieldTypes {
    FieldTypes::from([
        (ChanField::Range, FieldType::U32),
        (ChanField::Range2, FieldType::U32),
        (ChanField::Signal, FieldType::U16),
        (ChanField::Signal2, FieldType::U16),
        (ChanField::Reflectivity, FieldType::U16),
        (ChanField::Reflectivity2, FieldType::U16),
        (ChanField::NearIr, FieldType::U16),
    ])
}

fn five_word_pixel_fields() -> FieldTypes {
    let mut fields = dual_fields();
    fields.extend([
        (ChanField::Raw32Word1, FieldType::U32),
        (ChanField::Raw32Word2, FieldType::U32),
        (ChanField::Raw32Word3, FieldType::U32),
        (ChanField::Raw32Word4, FieldType::U32),
        (ChanField::Raw32Word5, FieldType::U32),
    ]);
    fields
}

/// Gets the default fields populated on scans for a profile.
///
/// Every call builds a fresh map, so callers may modify the result freely.
///
/// # Arguments
///
/// * `profile` - The lidar profile.
/// * `flags` - Include `FLAGS` (and `FLAGS2` for the dual return profile) as `u8`.
/// * `raw_headers` - Include `RAW_HEADERS` as `u32`, wide enough for any profile.
///
/// Returns `None` for custom profiles that have no default field set.
pub fn default_scan_fields(
    profile: UdpProfileLidar,
    flags: bool,
    raw_headers: bool,
) -> Option<FieldTypes> {
    let mut fields = match profile {
        UdpProfileLidar::Legacy => legacy_fields(),
        UdpProfileLidar::Rng15Rfl8Nir8 => low_bandwidth_fields(),
        UdpProfileLidar::Rng19Rfl8Sig16Nir16 => single_fields(),
        UdpProfileLidar::Rng19Rfl8Sig16Nir16Dual => dual_fields(),
        UdpProfileLidar::FiveWordPixel => five_word_pixel_fields(),
        UdpProfileLidar::Custom(_) => {
            warn!("No default scan fields for custom profile {}", profile);
            return None;
        }
    };

    if flags {
        fields.insert(ChanField::Flags, FieldType::U8);
        if profile == UdpProfileLidar::Rng19Rfl8Sig16Nir16Dual {
            fields.insert(ChanField::Flags2, FieldType::U8);
        }
    }

    if raw_headers {
        fields.insert(ChanField::RawHeaders, FieldType::U32);
    }

    trace!(
        "Default scan fields for {} (flags={}, raw_headers={}): {:?}",
        profile,
        flags,
        raw_headers,
        fields
    );
    Some(fields)
}
