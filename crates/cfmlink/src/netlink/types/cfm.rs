//! CFM attribute constants and typed payload values.
//!
//! The tag values track the bridge driver's uapi (`linux/if_bridge.h`):
//! tags 1..=16 match mainline, the event and counter-clear tags are the
//! driver's extensions appended after `CC_PEER_STATUS_INFO`.

use std::fmt;
use std::str::FromStr;

use crate::netlink::error::{Error, Result};

/// Sub-attributes of `IFLA_BRIDGE_CFM`: operation blocks on requests,
/// info records on dump replies and events.
pub mod cfm_attr {
    pub const MEP_CREATE: u16 = 1;
    pub const MEP_DELETE: u16 = 2;
    pub const MEP_CONFIG: u16 = 3;
    pub const CC_CONFIG: u16 = 4;
    pub const CC_PEER_MEP_ADD: u16 = 5;
    pub const CC_PEER_MEP_REMOVE: u16 = 6;
    pub const CC_RDI: u16 = 7;
    pub const CC_CCM_TX: u16 = 8;
    pub const MEP_CREATE_INFO: u16 = 9;
    pub const MEP_CONFIG_INFO: u16 = 10;
    pub const CC_CONFIG_INFO: u16 = 11;
    pub const CC_RDI_INFO: u16 = 12;
    pub const CC_CCM_TX_INFO: u16 = 13;
    pub const CC_PEER_MEP_INFO: u16 = 14;
    pub const MEP_STATUS_INFO: u16 = 15;
    pub const CC_PEER_STATUS_INFO: u16 = 16;
    pub const CC_PEER_EVENT_INFO: u16 = 17;
    pub const MIP_EVENT_INFO: u16 = 18;
    pub const MEP_CNT_CLEAR: u16 = 19;
    pub const CC_CNT_CLEAR: u16 = 20;
}

/// Fields of `MEP_CREATE` / `MEP_CREATE_INFO`.
pub mod mep_create {
    pub const INSTANCE: u16 = 1;
    pub const DOMAIN: u16 = 2;
    pub const DIRECTION: u16 = 3;
    pub const VID: u16 = 4;
    pub const IFINDEX: u16 = 5;
}

/// Fields of `MEP_DELETE`.
pub mod mep_delete {
    pub const INSTANCE: u16 = 1;
}

/// Fields of `MEP_CONFIG` / `MEP_CONFIG_INFO`.
pub mod mep_config {
    pub const INSTANCE: u16 = 1;
    pub const UNICAST_MAC: u16 = 2;
    pub const MDLEVEL: u16 = 3;
    pub const MEPID: u16 = 4;
    pub const VID: u16 = 5;
}

/// Fields of `CC_CONFIG` / `CC_CONFIG_INFO`.
pub mod cc_config {
    pub const INSTANCE: u16 = 1;
    pub const ENABLE: u16 = 2;
    pub const EXP_INTERVAL: u16 = 3;
    pub const PRIORITY: u16 = 4;
    pub const EXP_MAID: u16 = 5;
}

/// Fields of `CC_PEER_MEP_ADD` / `CC_PEER_MEP_REMOVE` / `CC_PEER_MEP_INFO`.
pub mod cc_peer_mep {
    pub const INSTANCE: u16 = 1;
    pub const MEPID: u16 = 2;
}

/// Fields of `CC_RDI` / `CC_RDI_INFO`.
pub mod cc_rdi {
    pub const INSTANCE: u16 = 1;
    pub const RDI: u16 = 2;
}

/// Fields of `CC_CCM_TX` / `CC_CCM_TX_INFO`.
pub mod cc_ccm_tx {
    pub const INSTANCE: u16 = 1;
    pub const DMAC: u16 = 2;
    pub const SEQ_NO_UPDATE: u16 = 3;
    pub const PERIOD: u16 = 4;
    pub const IF_TLV: u16 = 5;
    pub const IF_TLV_VALUE: u16 = 6;
    pub const PORT_TLV: u16 = 7;
    pub const PORT_TLV_VALUE: u16 = 8;
}

/// Fields of `MEP_STATUS_INFO`.
pub mod mep_status {
    pub const INSTANCE: u16 = 1;
    pub const OPCODE_UNEXP_SEEN: u16 = 2;
    pub const DMAC_UNEXP_SEEN: u16 = 3;
    pub const TX_LEVEL_LOW_SEEN: u16 = 4;
    pub const VERSION_UNEXP_SEEN: u16 = 5;
    pub const RX_LEVEL_LOW_SEEN: u16 = 6;
}

/// Fields of `CC_PEER_EVENT_INFO`.
pub mod cc_peer_event {
    pub const INSTANCE: u16 = 1;
    pub const PEER_MEPID: u16 = 2;
    pub const CCM_DEFECT: u16 = 3;
}

/// Fields of `MIP_EVENT_INFO`.
pub mod mip_event {
    pub const INSTANCE: u16 = 1;
    pub const RAPS_REQUEST_SUBCODE: u16 = 2;
    pub const RAPS_STATUS: u16 = 3;
    pub const RAPS_NODE_ID: u16 = 4;
}

/// Fields of `MEP_CNT_CLEAR` / `CC_CNT_CLEAR`.
pub mod cnt_clear {
    pub const INSTANCE: u16 = 1;
}

/// MEP domain (br_cfm_domain).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(rename_all = "lowercase"))]
#[repr(u32)]
pub enum Domain {
    /// Down-MEP on a physical port.
    Port = 0,
    /// MEP bound to a VLAN.
    Vlan = 1,
}

impl Domain {
    /// Decode a raw attribute value.
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Port),
            1 => Some(Self::Vlan),
            _ => None,
        }
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "port" => Ok(Self::Port),
            "vlan" => Ok(Self::Vlan),
            other => Err(Error::InvalidArgument(format!(
                "domain '{}': expected port|vlan",
                other
            ))),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port => write!(f, "port"),
            Self::Vlan => write!(f, "vlan"),
        }
    }
}

/// MEP direction (br_cfm_mep_direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(rename_all = "lowercase"))]
#[repr(u32)]
pub enum Direction {
    /// Monitoring frames towards the wire.
    Down = 0,
    /// Monitoring frames towards the bridge relay.
    Up = 1,
}

impl Direction {
    /// Decode a raw attribute value.
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Down),
            1 => Some(Self::Up),
            _ => None,
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "down" => Ok(Self::Down),
            "up" => Ok(Self::Up),
            other => Err(Error::InvalidArgument(format!(
                "direction '{}': expected up|down",
                other
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Up => write!(f, "up"),
        }
    }
}

/// CCM transmission interval (br_cfm_ccm_interval).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[repr(u32)]
pub enum CcmInterval {
    /// No CCM transmission.
    None = 0,
    /// 3.3 milliseconds.
    Ms3_3 = 1,
    Ms10 = 2,
    Ms100 = 3,
    Sec1 = 4,
    Sec10 = 5,
    Min1 = 6,
    Min10 = 7,
}

impl CcmInterval {
    /// Decode a raw attribute value.
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Ms3_3),
            2 => Some(Self::Ms10),
            3 => Some(Self::Ms100),
            4 => Some(Self::Sec1),
            5 => Some(Self::Sec10),
            6 => Some(Self::Min1),
            7 => Some(Self::Min10),
            _ => None,
        }
    }
}

impl FromStr for CcmInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "3ms3" => Ok(Self::Ms3_3),
            "10ms" => Ok(Self::Ms10),
            "100ms" => Ok(Self::Ms100),
            "1s" => Ok(Self::Sec1),
            "10s" => Ok(Self::Sec10),
            "1m" => Ok(Self::Min1),
            "10m" => Ok(Self::Min10),
            other => Err(Error::InvalidArgument(format!(
                "interval '{}': expected 3ms3|10ms|100ms|1s|10s|1m|10m",
                other
            ))),
        }
    }
}

impl fmt::Display for CcmInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::None => "none",
            Self::Ms3_3 => "3ms3",
            Self::Ms10 => "10ms",
            Self::Ms100 => "100ms",
            Self::Sec1 => "1s",
            Self::Sec10 => "10s",
            Self::Min1 => "1m",
            Self::Min10 => "10m",
        };
        write!(f, "{}", token)
    }
}

/// Wire size of a MAID blob (BR_CFM_MAID_LENGTH).
pub const MAID_LENGTH: usize = 48;

/// Longest name that fits the blob after the three header bytes.
pub const MAID_NAME_MAX: usize = MAID_LENGTH - 3;

/// Maintenance Association Identifier.
///
/// Fixed 48-byte blob: `[format, name_format, length]` followed by the
/// association name, zero padded. The driver expects MD format 1
/// ("no domain name") and short-name format 2 (character string).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Maid([u8; MAID_LENGTH]);

impl Maid {
    const MD_FORMAT_NONE: u8 = 1;
    const NAME_FORMAT_CHAR_STRING: u8 = 2;

    /// Build a MAID from an association name.
    ///
    /// Names longer than [`MAID_NAME_MAX`] bytes are truncated. An empty
    /// name is rejected: the header-only encoding reads back as "no MAID"
    /// on the driver side, which cannot be what a caller meant.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("MAID name must not be empty".into()));
        }

        let name = name.as_bytes();
        let len = name.len().min(MAID_NAME_MAX);

        let mut buf = [0u8; MAID_LENGTH];
        buf[0] = Self::MD_FORMAT_NONE;
        buf[1] = Self::NAME_FORMAT_CHAR_STRING;
        buf[2] = len as u8;
        buf[3..3 + len].copy_from_slice(&name[..len]);

        Ok(Self(buf))
    }

    /// Reconstruct a MAID from a decoded attribute payload.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MAID_LENGTH {
            return Err(Error::InvalidAttribute(format!(
                "MAID payload too short: {} bytes",
                data.len()
            )));
        }
        let mut buf = [0u8; MAID_LENGTH];
        buf.copy_from_slice(&data[..MAID_LENGTH]);
        Ok(Self(buf))
    }

    /// The association name carried after the header bytes.
    ///
    /// Bounded by the declared length byte and the blob size, whichever is
    /// smaller; non-UTF-8 bytes are replaced.
    pub fn name(&self) -> String {
        let len = (self.0[2] as usize).min(MAID_NAME_MAX);
        let name = &self.0[3..3 + len];
        String::from_utf8_lossy(name).into_owned()
    }

    /// The raw 48-byte wire encoding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Maid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Maid").field(&self.name()).finish()
    }
}

impl fmt::Display for Maid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_tokens() {
        assert_eq!("port".parse::<Domain>().unwrap(), Domain::Port);
        assert_eq!("vlan".parse::<Domain>().unwrap(), Domain::Vlan);
        assert!("bridge".parse::<Domain>().is_err());
        assert_eq!(Domain::from_raw(1), Some(Domain::Vlan));
        assert_eq!(Domain::from_raw(2), None);
    }

    #[test]
    fn test_direction_tokens() {
        assert_eq!("down".parse::<Direction>().unwrap(), Direction::Down);
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Up);
        assert!("both".parse::<Direction>().is_err());
        assert_eq!(Direction::Down as u32, 0);
        assert_eq!(Direction::Up as u32, 1);
    }

    #[test]
    fn test_interval_codes() {
        for (token, code) in [
            ("none", 0),
            ("3ms3", 1),
            ("10ms", 2),
            ("100ms", 3),
            ("1s", 4),
            ("10s", 5),
            ("1m", 6),
            ("10m", 7),
        ] {
            let interval: CcmInterval = token.parse().unwrap();
            assert_eq!(interval as u32, code);
            assert_eq!(CcmInterval::from_raw(code), Some(interval));
            assert_eq!(interval.to_string(), token);
        }
        assert!("5s".parse::<CcmInterval>().is_err());
        assert_eq!(CcmInterval::from_raw(8), None);
    }

    #[test]
    fn test_maid_encoding() {
        let maid = Maid::new("dom1").unwrap();
        let bytes = maid.as_bytes();
        assert_eq!(bytes.len(), MAID_LENGTH);
        assert_eq!(&bytes[..7], &[1, 2, 4, b'd', b'o', b'm', b'1']);
        assert!(bytes[7..].iter().all(|&b| b == 0));
        assert_eq!(maid.name(), "dom1");
    }

    #[test]
    fn test_maid_empty_name_rejected() {
        assert!(Maid::new("").is_err());
    }

    #[test]
    fn test_maid_truncates_long_name() {
        let long = "x".repeat(60);
        let maid = Maid::new(&long).unwrap();
        assert_eq!(maid.as_bytes().len(), MAID_LENGTH);
        assert_eq!(maid.as_bytes()[2] as usize, MAID_NAME_MAX);
        assert_eq!(maid.name().len(), MAID_NAME_MAX);
    }

    #[test]
    fn test_maid_max_length_name() {
        let name = "y".repeat(MAID_NAME_MAX);
        let maid = Maid::new(&name).unwrap();
        assert_eq!(maid.name(), name);
    }

    #[test]
    fn test_maid_roundtrip() {
        let maid = Maid::new("assoc-7").unwrap();
        let decoded = Maid::from_bytes(maid.as_bytes()).unwrap();
        assert_eq!(decoded, maid);
        assert_eq!(decoded.name(), "assoc-7");
    }

    #[test]
    fn test_maid_short_payload() {
        assert!(Maid::from_bytes(&[1, 2, 0]).is_err());
    }

    #[test]
    fn test_maid_bogus_length_byte_is_bounded() {
        let mut raw = [0u8; MAID_LENGTH];
        raw[0] = 1;
        raw[1] = 2;
        raw[2] = 200; // larger than the blob
        let maid = Maid::from_bytes(&raw).unwrap();
        assert_eq!(maid.name().len(), MAID_NAME_MAX);
    }
}
