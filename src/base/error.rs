use std::error;
use std::fmt;

/// Represents errors that can occur while reading, writing or rebuilding lidar packets.
#[derive(Debug)]
pub enum Error {
    /// The packet buffer (or raw headers column) is shorter than the layout requires.
    BufferTooSmall { required: usize, actual: usize },

    /// A column index is not below the number of columns in a packet.
    ColumnOutOfRange { col: usize, columns: usize },

    /// The requested channel field or column header is not defined for the profile.
    UnknownField { description: String },

    /// No packet format is registered for the lidar profile.
    UnsupportedProfile { description: String },

    /// Packet buffers do not group into exactly one scan, or two frame id decodes disagree.
    InconsistentScanGrouping { description: String },

    /// The scan grid could not be built with the requested shape.
    ShapeError(ndarray::ShapeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferTooSmall { required, actual } => write!(
                f,
                "buffer is too small: required {} bytes, got {}",
                required, actual
            ),
            Error::ColumnOutOfRange { col, columns } => write!(
                f,
                "column {} is out of range for a packet of {} columns",
                col, columns
            ),
            Error::UnknownField { description } => write!(f, "unknown field: {}", description),
            Error::UnsupportedProfile { description } => {
                write!(f, "unsupported profile: {}", description)
            }
            Error::InconsistentScanGrouping { description } => {
                write!(f, "inconsistent scan grouping: {}", description)
            }
            Error::ShapeError(err) => write!(f, "shape error: {}", err),
        }
    }
}

impl error::Error for Error {}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::ShapeError(err)
    }
}

/// Checks that `actual` bytes cover a layout of `required` bytes.
#[inline]
pub(crate) fn ensure_len(required: usize, actual: usize) -> Result<()> {
    if actual < required {
        Err(Error::BufferTooSmall { required, actual })
    } else {
        Ok(())
    }
}

/// A specialized `Result` type for packet parsing operations.
pub type Result<T> = std::result::Result<T, Error>;
