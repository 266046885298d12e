//! Interface name and index utilities.

use std::ffi::CString;

use crate::netlink::{Error, Result};

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

/// Convert an interface name to its index.
pub fn get_ifindex(name: &str) -> Result<u32> {
    if name.is_empty() || name.len() >= IFNAMSIZ {
        return Err(Error::InterfaceNotFound { name: name.into() });
    }

    let cname = CString::new(name).map_err(|_| Error::InterfaceNotFound { name: name.into() })?;
    let index = unsafe { libc::if_nametoindex(cname.as_ptr()) };
    if index == 0 {
        return Err(Error::InterfaceNotFound { name: name.into() });
    }
    Ok(index)
}

/// Convert an interface index to its name.
pub fn get_ifname(index: u32) -> Result<String> {
    let mut buf = [0u8; IFNAMSIZ];
    let ret = unsafe { libc::if_indextoname(index, buf.as_mut_ptr() as *mut libc::c_char) };
    if ret.is_null() {
        return Err(Error::InterfaceNotFound {
            name: format!("if{}", index),
        });
    }

    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}

/// Convert an interface index to its name, falling back to `ifN`.
///
/// For display purposes where a missing interface should not abort
/// rendering of an otherwise valid record.
pub fn get_ifname_or_index(index: u32) -> String {
    get_ifname(index).unwrap_or_else(|_| format!("if{}", index))
}
