//! High-level representation of the NVRAM block
//!
//! Intended for end use.
use std::{borrow::Cow, fmt::Display, ops::Range};

use derive_ctor::ctor;
use getset::{CopyGetters, Getters};
use sha2::{Digest, Sha256};

use crate::{
    Result, c_str,
    crc::crc32,
    err::{Error, Field},
    nvram::ll::{self, NAND_PARTITIONS},
};

/// Default NVRAM offset in the `mtdblock3` dump
pub const NVRAM_OFFSET: usize = 0x580;
/// Default NVRAM length
pub const NVRAM_LENGTH: usize = 0x400;
/// Checksum offset relative to the NVRAM start
pub const CHECKSUM_OFFSET: usize = 0x3FC;
const CHECKSUM_LENGTH: usize = 4;

const MAC_OFFSET: usize = 0x120;
const MAC_LENGTH: usize = 6;
const VENDOR_ID_OFFSET: usize = 0x12C;
const VENDOR_ID_LENGTH: usize = 4;
const SERIAL_NUMBER_OFFSET: usize = 0x130;
const SERIAL_NUMBER_LENGTH: usize = 8;
const PASSWORD_OFFSET: usize = 0x139;
const PASSWORD_MAX_LENGTH: usize = 10;

/// Location of the NVRAM block inside the image
///
/// `length` must be at least [`NVRAM_LENGTH`] and the region must fit the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ctor)]
pub struct Region {
    /// Start of the block
    pub offset: usize,
    /// Length covered by the checksum
    pub length: usize,
}

impl Default for Region {
    fn default() -> Self {
        Self::new(NVRAM_OFFSET, NVRAM_LENGTH)
    }
}

impl Region {
    /// Absolute range covered by the checksum
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    /// Absolute range of the checksum slot
    #[must_use]
    pub fn checksum_range(&self) -> Range<usize> {
        let start = self.offset + CHECKSUM_OFFSET;
        start..start + CHECKSUM_LENGTH
    }

    fn validate(&self, size: usize) -> Result<()> {
        match self.offset.checked_add(self.length) {
            Some(end) if end <= size && self.length >= NVRAM_LENGTH => Ok(()),
            _ => Err(Error::Region {
                offset: self.offset,
                length: self.length,
                size,
            }),
        }
    }
}

/// Parsed NVRAM block with its own copy of the image
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Nvram {
    /// NVRAM version
    #[getset(get_copy = "pub")]
    version: u32,

    /// Boot parameters
    #[getset(get = "pub")]
    boot_line: [u8; 0x100],

    /// Board id
    #[getset(get = "pub")]
    board_id: [u8; 0x10],

    #[getset(get_copy = "pub")]
    main_thread: u32,

    /// PSI size
    #[getset(get_copy = "pub")]
    psi_size: u32,

    /// Number of MAC addresses starting from the base one
    #[getset(get_copy = "pub")]
    num_mac_addr: u32,

    /// Base MAC address
    #[getset(get = "pub")]
    base_mac_addr: [u8; 6],

    /// Checksum left by older NVRAM versions
    #[getset(get_copy = "pub")]
    old_checksum: u32,

    /// GPON vendor id
    #[getset(get = "pub")]
    gpon_vendor_id: [u8; 4],

    /// GPON vendor serial number, including the terminator byte
    #[getset(get = "pub")]
    gpon_serial_number: [u8; 9],

    gpon_password: [u8; 11],

    /// WPS device PIN
    #[getset(get = "pub")]
    wps_dev_pin: [u8; 8],

    /// WLAN parameters
    #[getset(get = "pub")]
    wlan_params: [u8; 0x100],

    #[getset(get_copy = "pub")]
    syslog_size: u32,

    /// NAND partition offsets in KB
    #[getset(get = "pub")]
    nand_part_offsets_kb: [u32; NAND_PARTITIONS],

    /// NAND partition sizes in KB
    #[getset(get = "pub")]
    nand_part_sizes_kb: [u32; NAND_PARTITIONS],

    /// Voice board id
    #[getset(get = "pub")]
    voice_board_id: [u8; 0x10],

    /// AFE id
    #[getset(get = "pub")]
    afe_id: [u8; 8],

    /// Stored checksum, updated by [`Nvram::finalize`]
    #[getset(get_copy = "pub")]
    checksum: u32,

    /// NVRAM location
    #[getset(get_copy = "pub")]
    region: Region,

    /// Working copy of the image
    data: Vec<u8>,
}

impl Nvram {
    /// Parse NVRAM at the default location
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_at(data, Region::default())
    }

    /// Parse NVRAM at `region`
    ///
    /// Fails if the stored checksum doesn't match the block contents
    pub fn parse_at(data: &[u8], region: Region) -> Result<Self> {
        region.validate(data.len())?;

        let mut data = data.to_vec();
        let layout = ll::Layout::parse(&data[region.offset..])?;

        let slot = region.checksum_range();
        let stored = read_u32(&data[slot.clone()]);
        data[slot].fill(0);

        let computed = crc32(&data[region.range()]);
        if computed != stored {
            return Err(Error::Integrity { stored, computed });
        }

        Ok(Self::from_layout(layout, stored, region, data))
    }

    fn from_layout(ll: ll::Layout, checksum: u32, region: Region, data: Vec<u8>) -> Self {
        Self {
            version: ll.version,
            boot_line: ll.boot_line,
            board_id: ll.board_id,
            main_thread: ll.main_thread,
            psi_size: ll.psi_size,
            num_mac_addr: ll.num_mac_addr,
            base_mac_addr: ll.base_mac_addr,
            old_checksum: ll.old_checksum,
            gpon_vendor_id: ll.gpon_vendor_id,
            gpon_serial_number: ll.gpon_serial_number,
            gpon_password: ll.gpon_password,
            wps_dev_pin: ll.wps_dev_pin,
            wlan_params: ll.wlan_params,
            syslog_size: ll.syslog_size,
            nand_part_offsets_kb: ll.nand_part_ofs_kb,
            nand_part_sizes_kb: ll.nand_part_size_kb,
            voice_board_id: ll.voice_board_id,
            afe_id: ll.afe_id,
            checksum,
            region,
            data,
        }
    }

    /// Offset of the first NAND partition in KB
    #[must_use]
    pub fn nand_part_ofs_kb(&self) -> u32 {
        self.nand_part_offsets_kb[0]
    }

    /// Size of the first NAND partition in KB
    #[must_use]
    pub fn nand_part_size_kb(&self) -> u32 {
        self.nand_part_sizes_kb[0]
    }

    /// GPON password (SLID) without the NUL padding
    #[must_use]
    pub fn gpon_password(&self) -> Cow<'_, str> {
        c_str(&self.gpon_password)
    }

    /// Working image
    ///
    /// The checksum slot holds zeroes until [`Nvram::finalize`] is called
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Set the base MAC address from raw bytes
    pub fn set_base_mac_address(&mut self, mac: &[u8]) -> Result<()> {
        check_length(Field::BaseMacAddress, MAC_LENGTH, mac.len())?;
        self.write(MAC_OFFSET, mac, false)
    }

    /// Set the base MAC address from hex digits, e.g. `0418D6A1B2C3`
    pub fn set_base_mac_address_hex(&mut self, mac: &str) -> Result<()> {
        self.set_base_mac_address(&hex::decode(mac)?)
    }

    /// Set the 4 byte GPON vendor id
    ///
    /// The byte after the id, which is the first byte of the serial number, is zeroed
    pub fn set_gpon_vendor_id(&mut self, id: impl AsRef<[u8]>) -> Result<()> {
        let id = id.as_ref();
        check_length(Field::GponVendorId, VENDOR_ID_LENGTH, id.len())?;
        self.write(VENDOR_ID_OFFSET, id, true)
    }

    /// Set the 8 byte GPON serial number
    pub fn set_gpon_serial_number(&mut self, serial: impl AsRef<[u8]>) -> Result<()> {
        let serial = serial.as_ref();
        check_length(Field::GponSerialNumber, SERIAL_NUMBER_LENGTH, serial.len())?;
        self.write(SERIAL_NUMBER_OFFSET, serial, true)
    }

    /// Set the GPON password (SLID), up to 10 bytes
    pub fn set_gpon_password(&mut self, password: &str) -> Result<()> {
        let password = password.as_bytes();
        if password.len() > PASSWORD_MAX_LENGTH {
            return Err(Error::Range {
                field: Field::GponPassword,
                expected: PASSWORD_MAX_LENGTH,
                actual: password.len(),
            });
        }
        self.write(PASSWORD_OFFSET, password, true)
    }

    /// Recalculate the checksum and return the patched image
    pub fn finalize(&mut self) -> &[u8] {
        let slot = self.region.checksum_range();
        self.data[slot.clone()].fill(0);
        self.checksum = crc32(&self.data[self.region.range()]);
        self.data[slot].copy_from_slice(&self.checksum.to_be_bytes());
        &self.data
    }

    /// Finalize and take the patched image
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.finalize();
        self.data
    }

    fn write(&mut self, relative: usize, bytes: &[u8], terminate: bool) -> Result<()> {
        let at = self.region.offset + relative;
        self.data[at..at + bytes.len()].copy_from_slice(bytes);
        if terminate {
            self.data[at + bytes.len()] = 0;
        }
        self.refresh()
    }

    fn refresh(&mut self) -> Result<()> {
        let ll = ll::Layout::parse(&self.data[self.region.offset..])?;
        let data = std::mem::take(&mut self.data);
        *self = Self::from_layout(ll, self.checksum, self.region, data);
        Ok(())
    }
}

impl Display for Nvram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mac = self
            .base_mac_addr
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":");

        writeln!(f, "--- NVRAM Information ---")?;
        writeln!(f, "- Image hash: {}", hex::encode(Sha256::digest(&self.data)))?;
        writeln!(f, "- NVRAM version: {}", self.version)?;
        writeln!(f, "- Boot parameters: {}", c_str(&self.boot_line))?;
        writeln!(f, "- Board Id: {}", c_str(&self.board_id))?;
        writeln!(f, "- PSI size: {}", self.psi_size)?;
        writeln!(f, "- Total MAC addresses: {}", self.num_mac_addr)?;
        writeln!(f, "- GPON MAC address: {mac}")?;
        writeln!(f, "- GPON Vendor Id: {}", c_str(&self.gpon_vendor_id))?;
        writeln!(f, "- GPON Serial Number: {}", c_str(&self.gpon_serial_number))?;
        writeln!(f, "- GPON SLID (password): {}", self.gpon_password())?;
        write!(f, "- Checksum: {:#010X}", self.checksum)
    }
}

fn check_length(field: Field, expected: usize, actual: usize) -> Result<()> {
    if actual != expected {
        Err(Error::Range {
            field,
            expected,
            actual,
        })
    } else {
        Ok(())
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Valid image with the NVRAM at the default location
    pub(crate) fn image() -> Vec<u8> {
        let mut data = vec![0xFFu8; 0x10000];
        let base = NVRAM_OFFSET;
        data[base..base + NVRAM_LENGTH].fill(0);
        data[base..base + 4].copy_from_slice(&6u32.to_be_bytes());
        data[base + 0x4..base + 0x4 + 17].copy_from_slice(b"e=192.168.1.1:ff0");
        data[base + 0x104..base + 0x104 + 8].copy_from_slice(b"UFIBER01");
        data[base + 0x118..base + 0x11C].copy_from_slice(&0x18u32.to_be_bytes());
        data[base + 0x11C..base + 0x120].copy_from_slice(&10u32.to_be_bytes());
        data[base + 0x120..base + 0x126].copy_from_slice(&[0x18, 0xE8, 0x29, 0x01, 0x02, 0x03]);
        data[base + 0x12C..base + 0x130].copy_from_slice(b"UBNT");
        data[base + 0x130..base + 0x138].copy_from_slice(b"a1b2c3d4");
        data[base + 0x139..base + 0x139 + 10].copy_from_slice(b"0123456789");
        data[base + 0x250..base + 0x254].copy_from_slice(&0x100u32.to_be_bytes());
        data[base + 0x264..base + 0x268].copy_from_slice(&0x7000u32.to_be_bytes());

        let crc = crc32(&data[base..base + NVRAM_LENGTH]);
        data[base + CHECKSUM_OFFSET..base + NVRAM_LENGTH].copy_from_slice(&crc.to_be_bytes());
        data
    }

    #[test]
    fn test_parse() {
        let nvram = Nvram::parse(&image()).unwrap();
        assert_eq!(nvram.version(), 6);
        assert_eq!(c_str(nvram.boot_line()), "e=192.168.1.1:ff0");
        assert_eq!(c_str(nvram.board_id()), "UFIBER01");
        assert_eq!(nvram.psi_size(), 0x18);
        assert_eq!(nvram.num_mac_addr(), 10);
        assert_eq!(nvram.base_mac_addr(), &[0x18, 0xE8, 0x29, 0x01, 0x02, 0x03]);
        assert_eq!(nvram.gpon_vendor_id(), b"UBNT");
        assert_eq!(&nvram.gpon_serial_number()[..8], b"a1b2c3d4");
        assert_eq!(nvram.gpon_password(), "0123456789");
        assert_eq!(nvram.nand_part_ofs_kb(), 0x100);
        assert_eq!(nvram.nand_part_size_kb(), 0x7000);
        assert_eq!(nvram.region(), Region::default());
    }

    #[test]
    fn test_checksum_slot_zeroed() {
        let data = image();
        let nvram = Nvram::parse(&data).unwrap();
        let slot = nvram.region().checksum_range();
        assert_eq!(nvram.checksum(), read_u32(&data[slot.clone()]));
        assert_eq!(&nvram.data()[slot], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_region_too_small() {
        let data = image();
        let err = Nvram::parse_at(&data, Region::new(NVRAM_OFFSET, 0x200)).unwrap_err();
        assert!(err.is_region());
    }

    #[test]
    fn test_region_out_of_image() {
        let data = image();
        let err = Nvram::parse_at(&data, Region::new(data.len() - 0x100, NVRAM_LENGTH)).unwrap_err();
        assert!(err.is_region());
        let err = Nvram::parse_at(&data, Region::new(usize::MAX, NVRAM_LENGTH)).unwrap_err();
        assert!(err.is_region());
    }

    #[test]
    fn test_vendor_id_terminator() {
        let mut nvram = Nvram::parse(&image()).unwrap();
        nvram.set_gpon_vendor_id("ALCL").unwrap();
        assert_eq!(nvram.gpon_vendor_id(), b"ALCL");
        assert_eq!(&nvram.gpon_serial_number()[..], b"\x001b2c3d4\x00");
    }

    #[test]
    fn test_password_shorter() {
        let mut nvram = Nvram::parse(&image()).unwrap();
        nvram.set_gpon_password("abc").unwrap();
        assert_eq!(nvram.gpon_password(), "abc");
        let at = NVRAM_OFFSET + PASSWORD_OFFSET;
        assert_eq!(&nvram.data()[at..at + 5], b"abc\x004");
    }

    #[test]
    fn test_summary() {
        let mut nvram = Nvram::parse(&image()).unwrap();
        let summary = nvram.to_string();
        let lines: Vec<_> = summary.lines().collect();
        assert_eq!(lines[0], "--- NVRAM Information ---");
        let hash = lines[1].strip_prefix("- Image hash: ").unwrap().to_owned();
        assert_eq!(hash, hex::encode(Sha256::digest(nvram.data())));
        assert!(summary.contains("- Boot parameters: e=192.168.1.1:ff0\n"));
        assert!(summary.contains("- GPON MAC address: 18:E8:29:01:02:03\n"));
        assert!(summary.contains("- GPON Vendor Id: UBNT\n"));
        assert!(summary.contains("- GPON Serial Number: a1b2c3d4\n"));
        assert!(summary.contains("- GPON SLID (password): 0123456789\n"));
        assert_eq!(summary, nvram.to_string());

        nvram.set_gpon_password("abc").unwrap();
        let summary = nvram.to_string();
        let changed = summary.lines().nth(1).unwrap().strip_prefix("- Image hash: ").unwrap();
        assert_ne!(changed, hash);
        assert_eq!(changed, hex::encode(Sha256::digest(nvram.data())));
    }
}
