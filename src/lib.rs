//! # Ouster Packet Parsing
//!
//! `ouster_parsing` reads and writes fields of Ouster lidar packets for every
//! supported lidar profile, and rebuilds packet buffers from the raw headers
//! channel of an assembled scan.
//!
//! * [`PacketFormat`] describes a lidar packet layout; [`MaskedView`] gives
//!   masked, shifted access to one field across all pixels and columns.
//! * [`LidarPacketHeaders`] and [`RawHeadersFormat`] address header and
//!   footer regions in a packet and in a `RAW_HEADERS` column.
//! * [`scan_to_buffers`] and [`terminator_buffer`] produce packet buffers that
//!   a [`ScanBatcher`] turns back into the same scan, see [`buffers_to_scan`].
//!
//! ```
//! use ouster_parsing::{ChanField, PacketFormat, UdpProfileLidar};
//!
//! let pf = PacketFormat::from_profile(UdpProfileLidar::Rng19Rfl8Sig16Nir16, 64, 16)?;
//! let mut buf = vec![0u8; pf.lidar_packet_size()];
//! pf.set_frame_id(&mut buf, 42)?;
//! pf.field(&mut buf, ChanField::Range)?.set(3, 1, 1500);
//!
//! assert_eq!(pf.frame_id(&buf)?, 42);
//! assert_eq!(pf.field(&buf, ChanField::Range)?.get(3, 1), Some(1500));
//! # Ok::<(), ouster_parsing::Error>(())
//! ```

extern crate byteorder;
extern crate log;
extern crate ndarray;

pub mod base;
mod batching;
mod builders;
mod fields;
mod format;
mod headers;
mod masked_view;
mod scan;
pub mod types;
pub mod utils;

pub use crate::base::{Error, Result};
pub use crate::batching::{buffers_to_scan, ScanBatcher};
pub use crate::builders::{
    scan_buffers, scan_buffers_fast, scan_buffers_nice, scan_to_buffers, terminator_buffer,
    ScanBuffers, TERMINATOR_FILL,
};
pub use crate::fields::{default_scan_fields, FieldTypes};
pub use crate::format::{FieldDescr, PacketFormat};
pub use crate::headers::{LidarPacketHeaders, RawHeadersFormat};
pub use crate::masked_view::{MaskedView, ViewKey};
pub use crate::scan::{FieldArray, LidarScan};
pub use crate::types::{ChanField, ColHeader, DataFormat, FieldType, SensorInfo, UdpProfileLidar};
