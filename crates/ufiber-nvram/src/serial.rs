//! GPON serial number as entered by the user
//!
//! Either a vendor id with an 8 character serial (`ALCL` + `1234ABCD`), or the
//! full 16 hex digit form (`41-4C-43-4C-12-34-AB-CD`) where the first 4 bytes
//! are the vendor id.
use getset::Getters;

use crate::{
    Nvram, Result,
    err::{Error, Field},
};

const HEX_SERIAL_DIGITS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct GponSerial {
    /// Vendor id, kept as is in the NVRAM if absent
    #[getset(get = "pub")]
    vendor_id: Option<Vec<u8>>,

    /// Vendor-specific serial number
    #[getset(get = "pub")]
    serial_number: Vec<u8>,
}

impl GponSerial {
    /// Build the serial from optional user input
    ///
    /// Blank values are treated as absent. Returns `None` if nothing was given
    pub fn parse(vendor: Option<&str>, serial: Option<&str>) -> Result<Option<Self>> {
        let vendor = vendor.filter(|v| !v.trim().is_empty());
        let serial = serial.filter(|s| !s.trim().is_empty());

        match (vendor, serial) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::Missing(Field::GponSerialNumber)),
            (vendor, Some(serial)) => Self::from_parts(vendor, serial).map(Some),
        }
    }

    fn from_parts(vendor: Option<&str>, serial: &str) -> Result<Self> {
        let digits: String = serial.chars().filter(|c| !matches!(c, '-' | ':')).collect();

        if digits.len() == HEX_SERIAL_DIGITS && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            let (vendor_id, serial_number) = digits.split_at(HEX_SERIAL_DIGITS / 2);
            Ok(Self {
                vendor_id: Some(hex::decode(vendor_id)?),
                serial_number: serial_number.as_bytes().to_vec(),
            })
        } else {
            Ok(Self {
                vendor_id: vendor.map(|v| v.as_bytes().to_vec()),
                serial_number: serial.as_bytes().to_vec(),
            })
        }
    }

    /// Write the vendor id and then the serial number to `nvram`
    ///
    /// Nothing is written if either of them is rejected
    pub fn apply(&self, nvram: &mut Nvram) -> Result<()> {
        let mut patched = nvram.clone();
        if let Some(vendor_id) = &self.vendor_id {
            patched.set_gpon_vendor_id(vendor_id)?;
        }
        patched.set_gpon_serial_number(&self.serial_number)?;

        *nvram = patched;
        Ok(())
    }
}
