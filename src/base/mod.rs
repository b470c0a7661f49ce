mod error;

pub(crate) use self::error::ensure_len;
pub use self::error::{Error, Result};
