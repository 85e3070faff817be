//! CRC-32 as computed by the Broadcom CFE for the NVRAM block
//!
//! Reflected IEEE polynomial, `0xFFFFFFFF` seed and no final inversion
//! (CRC-32/JAMCRC), so the result is the complement of the usual CRC-32.
use crc::{CRC_32_JAMCRC, Crc};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_JAMCRC);

/// Calculate checksum of `data`
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}
