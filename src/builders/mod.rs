//! Synthetic lidar packet buffers built from scans.

mod scan_buffers;
mod terminator;

pub use self::scan_buffers::{
    scan_buffers, scan_buffers_fast, scan_buffers_nice, scan_to_buffers, ScanBuffers,
};
pub use self::terminator::{terminator_buffer, TERMINATOR_FILL};
