//! MAC address parsing and formatting.

use std::fmt;
use std::str::FromStr;

use crate::netlink::{Error, Result};

/// A 6-byte MAC address.
///
/// The textual form is the CFM tool convention: uppercase hex octets
/// separated by dashes, `XX-XX-XX-XX-XX-XX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Construct from raw octets.
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// The raw octets.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// View as a byte slice for attribute encoding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for MacAddr {
    type Err = Error;

    /// Parse `XX-XX-XX-XX-XX-XX`.
    ///
    /// The length is checked before any octet parsing; anything that is
    /// not exactly 17 characters is rejected outright.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 17 {
            return Err(Error::InvalidArgument(format!(
                "MAC '{}': expected XX-XX-XX-XX-XX-XX",
                s
            )));
        }

        let mut octets = [0u8; 6];
        for (i, part) in s.split('-').enumerate() {
            if i >= 6 || part.len() != 2 {
                return Err(Error::InvalidArgument(format!(
                    "MAC '{}': expected XX-XX-XX-XX-XX-XX",
                    s
                )));
            }
            octets[i] = u8::from_str_radix(part, 16)
                .map_err(|_| Error::InvalidArgument(format!("MAC '{}': invalid hex octet", s)))?;
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}-{:02X}-{:02X}-{:02X}-{:02X}-{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

#[cfg(feature = "output")]
impl serde::Serialize for MacAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let mac: MacAddr = "0A-1B-2C-3D-4E-5F".parse().unwrap();
        assert_eq!(mac.octets(), [0x0A, 0x1B, 0x2C, 0x3D, 0x4E, 0x5F]);
    }

    #[test]
    fn test_parse_lowercase_hex() {
        let mac: MacAddr = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        assert_eq!(mac.octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn test_reject_wrong_length() {
        assert!("0A-1B-2C".parse::<MacAddr>().is_err());
        assert!("0A-1B-2C-3D-4E-5F-6A".parse::<MacAddr>().is_err());
        assert!("".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_reject_wrong_separator() {
        // Right length, wrong shape
        assert!("0A:1B:2C:3D:4E:5F".parse::<MacAddr>().is_err());
        assert!("0A-1B-2C-3D-4E5-F".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_reject_bad_hex() {
        assert!("0A-1B-2C-3D-4E-5G".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let mac = MacAddr::new([0x00, 0x01, 0xAB, 0xCD, 0xEF, 0x99]);
        let text = mac.to_string();
        assert_eq!(text, "00-01-AB-CD-EF-99");
        assert_eq!(text.parse::<MacAddr>().unwrap(), mac);
    }

    #[test]
    fn test_all_zero() {
        let mac: MacAddr = "00-00-00-00-00-00".parse().unwrap();
        assert_eq!(mac, MacAddr::default());
    }
}
