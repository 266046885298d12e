//! Async rtnetlink protocol implementation.
//!
//! The building blocks are the same for every operation this crate
//! performs: a [`MessageBuilder`] constructs a link message whose
//! `IFLA_AF_SPEC` attribute nests a `IFLA_BRIDGE_CFM` or
//! `IFLA_BRIDGE_MRP` block, a [`Connection`] sends it and awaits the
//! kernel's ACK or dump reply, and [`AttrIter`]/[`AttrMap`] walk the
//! nested attributes of whatever comes back.
//!
//! # Quick Start
//!
//! ```ignore
//! use cfmlink::netlink::Connection;
//!
//! let conn = Connection::new()?;
//! let report = conn.cfm_mep_config_show().await?;
//! for rec in &report.creates {
//!     println!("instance {} on ifindex {}", rec.instance, rec.ifindex);
//! }
//! ```

pub mod attr;
mod builder;
pub mod cfm;
pub mod connection;
mod error;
pub mod events;
pub mod message;
pub mod mrp;
mod socket;
pub mod types;

pub use attr::{AttrIter, AttrMap, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use connection::Connection;
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use socket::{NetlinkSocket, rtnetlink_groups};
