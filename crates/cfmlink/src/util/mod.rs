//! Shared utilities: interface name/index conversion and MAC addresses.

pub mod ifname;
pub mod mac;

pub use ifname::{get_ifindex, get_ifname, get_ifname_or_index};
pub use mac::MacAddr;
