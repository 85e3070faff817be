use std::borrow::Cow;

use crate::err::Error;

pub mod crc;
pub mod err;
pub mod nvram;
pub mod serial;

pub type Result<T> = core::result::Result<T, Error>;

pub use nvram::hl::{Nvram, Region};
pub use serial::GponSerial;

/// Decode NUL-padded `bytes` up to the first NUL
#[must_use]
pub fn c_str(bytes: &[u8]) -> Cow<'_, str> {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end])
}
