//! Async rtnetlink library for Linux bridge CFM/MRP offload configuration.
//!
//! The Linux bridge driver exposes Connectivity Fault Management (IEEE
//! 802.1ag / ITU-T Y.1731) and Media Redundancy Protocol offload state
//! through nested `IFLA_AF_SPEC` attributes on link messages. This crate
//! builds those attribute trees, talks to the kernel over a routing
//! netlink socket, and parses dump replies and asynchronous link events
//! back into typed records.
//!
//! # Example
//!
//! ```ignore
//! use cfmlink::netlink::Connection;
//! use cfmlink::netlink::cfm::MepCreate;
//! use cfmlink::netlink::types::cfm::{Domain, Direction};
//!
//! #[tokio::main]
//! async fn main() -> cfmlink::netlink::Result<()> {
//!     let conn = Connection::new()?;
//!     let br = cfmlink::util::get_ifindex("br0")?;
//!     let port = cfmlink::util::get_ifindex("eth0")?;
//!
//!     conn.cfm_mep_create(br, &MepCreate {
//!         instance: 1,
//!         domain: Domain::Vlan,
//!         direction: Direction::Down,
//!         vid: 10,
//!         ifindex: port,
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Event Monitoring
//!
//! ```ignore
//! use cfmlink::netlink::events::{CfmEvent, CfmEventStream};
//! use tokio_stream::StreamExt;
//!
//! let mut stream = CfmEventStream::new()?;
//! while let Some(event) = stream.try_next().await? {
//!     match event {
//!         CfmEvent::PeerDefect(ev) => println!("instance {} peer {}", ev.instance, ev.peer_mepid),
//!         CfmEvent::MipRaps(ev) => println!("RAPS request {}", ev.request()),
//!     }
//! }
//! ```

pub mod netlink;
pub mod util;
