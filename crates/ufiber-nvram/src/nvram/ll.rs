//! Low-level representation of the NVRAM block
//!
//! This matches how NVRAM actually looks like in the `mtdblock3` dump.
use bincode::Decode;

use crate::Result;

/// Size of the decoded field block
pub(crate) const LAYOUT_SIZE: usize = 0x290;

/// Number of entries in the NAND partition tables
pub const NAND_PARTITIONS: usize = 5;

#[derive(Debug, Clone, Decode)]
#[repr(C)]
pub(crate) struct Layout {
    pub version: u32,
    pub boot_line: [u8; 0x100],
    pub board_id: [u8; 0x10],
    pub main_thread: u32,
    pub psi_size: u32,
    pub num_mac_addr: u32,
    pub base_mac_addr: [u8; 6],
    _reserved: [u8; 2],
    pub old_checksum: u32,
    pub gpon_vendor_id: [u8; 4],
    pub gpon_serial_number: [u8; 9],
    pub gpon_password: [u8; 11],
    pub wps_dev_pin: [u8; 8],
    pub wlan_params: [u8; 0x100],
    pub syslog_size: u32,
    pub nand_part_ofs_kb: [u32; NAND_PARTITIONS],
    pub nand_part_size_kb: [u32; NAND_PARTITIONS],
    pub voice_board_id: [u8; 0x10],
    pub afe_id: [u8; 8],
}

impl Layout {
    pub(crate) fn parse(data: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_fixed_int_encoding();
        bincode::decode_from_slice(&data[..LAYOUT_SIZE], config)
            .map(|r| r.0)
            .map_err(|e| e.into())
    }
}
