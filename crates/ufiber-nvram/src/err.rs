use derive_more::{Display, IsVariant};
use thiserror::Error as TError;

/// User-settable NVRAM fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IsVariant)]
pub enum Field {
    #[display("base MAC address")]
    BaseMacAddress,
    #[display("GPON vendor id")]
    GponVendorId,
    #[display("GPON serial number")]
    GponSerialNumber,
    #[display("GPON password")]
    GponPassword,
}

#[derive(Debug, TError, IsVariant)]
pub enum Error {
    /// Stored checksum doesn't match the computed one
    #[error("Invalid data, checksum doesn't match: stored {stored:#010x}, computed {computed:#010x}")]
    Integrity { stored: u32, computed: u32 },

    /// Value doesn't fit the field slot
    #[error("Invalid {field} length: got {actual} bytes, slot takes {expected}")]
    Range {
        field: Field,
        expected: usize,
        actual: usize,
    },

    /// Textual value isn't valid hex
    #[error("Invalid hex value: {0}")]
    Format(#[from] hex::FromHexError),

    /// Required value is absent
    #[error("Missing {0}")]
    Missing(Field),

    /// NVRAM region doesn't fit the image
    #[error("NVRAM region {offset:#x}+{length:#x} doesn't fit the image of {size:#x} bytes")]
    Region {
        offset: usize,
        length: usize,
        size: usize,
    },

    /// bincode crate error
    #[error("Bincode decode error: {0}")]
    Bincode(#[from] bincode::error::DecodeError),
}
