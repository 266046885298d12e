//! Netlink attribute (rtattr/nlattr) handling.

use std::collections::HashMap;

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4; // nla_align(size_of::<NlAttr>())

/// Netlink attribute header (mirrors struct nlattr / struct rtattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Check if this is a nested attribute.
    pub fn is_nested(&self) -> bool {
        self.nla_type & NLA_F_NESTED != 0
    }

    /// Get the payload length (total length minus header).
    pub fn payload_len(&self) -> usize {
        (self.nla_len as usize).saturating_sub(NLA_HDRLEN)
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
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Iterator over netlink attributes in a buffer.
///
/// Iteration stops at the first record whose declared length is shorter
/// than a header or longer than the remaining buffer; repeated-attribute
/// streams have no self-describing resynchronization point.
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    /// Create a new attribute iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Check if there are no more attributes.
    pub fn is_empty(&self) -> bool {
        self.data.len() < NLA_HDRLEN
    }
}

impl<'a> Iterator for AttrIter<'a> {
    /// Returns (attribute type, payload data).
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLA_HDRLEN {
            return None;
        }

        let attr = match NlAttr::from_bytes(self.data) {
            Ok(a) => a,
            Err(_) => return None,
        };

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN || len > self.data.len() {
            return None;
        }

        let payload = &self.data[NLA_HDRLEN..len];
        let aligned_len = nla_align(len);

        // Move to next attribute
        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some((attr.kind(), payload))
    }
}

/// Tag-indexed view of one attribute block.
///
/// Built per decode call from an [`AttrIter`] pass; only the first
/// occurrence of a tag is indexed. Repeated records (peer-MEP lists, event
/// records) must be iterated linearly with [`AttrIter`] instead, since a
/// single-slot index would silently drop all but one occurrence.
pub struct AttrMap<'a> {
    by_tag: HashMap<u16, &'a [u8]>,
}

impl<'a> AttrMap<'a> {
    /// Index the attributes in `data` by type tag.
    pub fn parse(data: &'a [u8]) -> Self {
        let mut by_tag = HashMap::new();
        for (kind, payload) in AttrIter::new(data) {
            by_tag.entry(kind).or_insert(payload);
        }
        Self { by_tag }
    }

    /// Get the raw payload for a tag.
    pub fn get(&self, tag: u16) -> Option<&'a [u8]> {
        self.by_tag.get(&tag).copied()
    }

    /// Check whether a tag is present.
    pub fn contains(&self, tag: u16) -> bool {
        self.by_tag.contains_key(&tag)
    }

    /// Get a u16 payload for a tag, erroring if absent or truncated.
    pub fn get_u16(&self, tag: u16) -> Result<u16> {
        self.require(tag).and_then(get::u16_ne)
    }

    /// Get a u32 payload for a tag, erroring if absent or truncated.
    pub fn get_u32(&self, tag: u16) -> Result<u32> {
        self.require(tag).and_then(get::u32_ne)
    }

    /// Get a 6-byte MAC payload for a tag, erroring if absent or truncated.
    pub fn get_mac(&self, tag: u16) -> Result<[u8; 6]> {
        self.require(tag).and_then(get::mac)
    }

    fn require(&self, tag: u16) -> Result<&'a [u8]> {
        self.get(tag)
            .ok_or_else(|| Error::InvalidAttribute(format!("missing attribute {}", tag)))
    }
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        if data.is_empty() {
            return Err(Error::InvalidAttribute("empty u8 attribute".into()));
        }
        Ok(data[0])
    }

    /// Extract a u16 value (native endian).
    pub fn u16_ne(data: &[u8]) -> Result<u16> {
        if data.len() < 2 {
            return Err(Error::InvalidAttribute("truncated u16 attribute".into()));
        }
        Ok(u16::from_ne_bytes([data[0], data[1]]))
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        if data.len() < 4 {
            return Err(Error::InvalidAttribute("truncated u32 attribute".into()));
        }
        Ok(u32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Extract a 6-byte MAC address (no byte order interpretation).
    pub fn mac(data: &[u8]) -> Result<[u8; 6]> {
        if data.len() < 6 {
            return Err(Error::InvalidAttribute("truncated MAC attribute".into()));
        }
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&data[..6]);
        Ok(mac)
    }

    /// Extract bytes (no interpretation).
    pub fn bytes(data: &[u8]) -> &[u8] {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr_bytes(tag: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = NlAttr::new(tag, payload.len()).as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(nla_align(buf.len()), 0);
        buf
    }

    #[test]
    fn test_iter_multiple() {
        let mut buf = attr_bytes(1, &10u32.to_ne_bytes());
        buf.extend_from_slice(&attr_bytes(2, &20u16.to_ne_bytes()));

        let attrs: Vec<_> = AttrIter::new(&buf).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].0, 1);
        assert_eq!(get::u32_ne(attrs[0].1).unwrap(), 10);
        assert_eq!(attrs[1].0, 2);
        assert_eq!(get::u16_ne(attrs[1].1).unwrap(), 20);
    }

    #[test]
    fn test_iter_strips_nested_flag() {
        let buf = attr_bytes(5 | NLA_F_NESTED, &[]);
        let attrs: Vec<_> = AttrIter::new(&buf).collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].0, 5);
    }

    #[test]
    fn test_iter_overdeclared_length() {
        // Declared length runs past the end of the buffer: iteration must
        // stop without reading out of bounds.
        let mut buf = attr_bytes(1, &1u32.to_ne_bytes());
        buf[0] = 200;
        let attrs: Vec<_> = AttrIter::new(&buf).collect();
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_iter_underdeclared_length() {
        let mut buf = attr_bytes(1, &1u32.to_ne_bytes());
        buf[0] = 2; // shorter than a header
        let attrs: Vec<_> = AttrIter::new(&buf).collect();
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_map_lookup() {
        let mut buf = attr_bytes(1, &7u32.to_ne_bytes());
        buf.extend_from_slice(&attr_bytes(3, &[0, 1, 2, 3, 4, 5]));

        let map = AttrMap::parse(&buf);
        assert_eq!(map.get_u32(1).unwrap(), 7);
        assert_eq!(map.get_mac(3).unwrap(), [0, 1, 2, 3, 4, 5]);
        assert!(!map.contains(2));
        assert!(map.get_u32(2).is_err());
    }

    #[test]
    fn test_map_keeps_first_occurrence() {
        let mut buf = attr_bytes(1, &7u32.to_ne_bytes());
        buf.extend_from_slice(&attr_bytes(1, &9u32.to_ne_bytes()));

        let map = AttrMap::parse(&buf);
        assert_eq!(map.get_u32(1).unwrap(), 7);
    }

    #[test]
    fn test_get_truncated() {
        assert!(get::u32_ne(&[1, 2]).is_err());
        assert!(get::u16_ne(&[1]).is_err());
        assert!(get::mac(&[1, 2, 3]).is_err());
        assert!(get::u8(&[]).is_err());
    }
}
