//! Link (network interface) message types.

use crate::netlink::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Interface info message (struct ifinfomsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfInfoMsg {
    /// Address family (AF_BRIDGE for everything this crate sends).
    pub ifi_family: u8,
    /// Padding.
    pub __ifi_pad: u8,
    /// Device type (ARPHRD_*).
    pub ifi_type: u16,
    /// Interface index.
    pub ifi_index: i32,
    /// Device flags (IFF_*).
    pub ifi_flags: u32,
    /// Change mask.
    pub ifi_change: u32,
}

impl IfInfoMsg {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a new interface info message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interface index.
    pub fn with_index(mut self, index: i32) -> Self {
        self.ifi_index = index;
        self
    }

    /// Set the address family.
    pub fn with_family(mut self, family: u8) -> Self {
        self.ifi_family = family;
        self
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: Self::SIZE,
                actual: data.len(),
            })
    }
}

/// Interface link attributes (IFLA_*), the subset this crate touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum IflaAttr {
    Unspec = 0,
    Address = 1,
    Ifname = 3,
    Mtu = 4,
    Master = 10,
    AfSpec = 26,
    ExtMask = 29,
}

/// Nested attributes inside `IFLA_AF_SPEC` for the bridge family
/// (IFLA_BRIDGE_*).
pub mod bridge_af {
    pub const IFLA_BRIDGE_FLAGS: u16 = 0;
    pub const IFLA_BRIDGE_MODE: u16 = 1;
    pub const IFLA_BRIDGE_VLAN_INFO: u16 = 2;
    pub const IFLA_BRIDGE_VLAN_TUNNEL_INFO: u16 = 3;
    pub const IFLA_BRIDGE_MRP: u16 = 4;
    pub const IFLA_BRIDGE_CFM: u16 = 5;
}

/// `IFLA_BRIDGE_FLAGS` values.
pub mod bridge_flags {
    /// Operate on the bridge master.
    pub const MASTER: u16 = 1;
    /// Operate on the device itself (the bridge driver, not a port).
    pub const SELF: u16 = 2;
}

/// `IFLA_EXT_MASK` filters (RTEXT_FILTER_*) selecting what the kernel
/// fills into link dumps.
pub mod rtext_filter {
    pub const VF: u32 = 1 << 0;
    pub const BRVLAN: u32 = 1 << 1;
    pub const BRVLAN_COMPRESSED: u32 = 1 << 2;
    pub const SKIP_STATS: u32 = 1 << 3;
    pub const MRP: u32 = 1 << 4;
    pub const CFM_CONFIG: u32 = 1 << 5;
    pub const CFM_STATUS: u32 = 1 << 6;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ifinfomsg_roundtrip() {
        let msg = IfInfoMsg::new()
            .with_family(libc::AF_BRIDGE as u8)
            .with_index(4);
        let parsed = IfInfoMsg::from_bytes(msg.as_bytes()).unwrap();
        assert_eq!(parsed.ifi_family, libc::AF_BRIDGE as u8);
        assert_eq!(parsed.ifi_index, 4);
    }

    #[test]
    fn test_ifinfomsg_truncated() {
        assert!(IfInfoMsg::from_bytes(&[0u8; 4]).is_err());
    }
}
