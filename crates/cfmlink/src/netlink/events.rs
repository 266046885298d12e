//! Asynchronous CFM event monitoring.
//!
//! The bridge driver multicasts link notifications carrying CFM event
//! records when continuity checking detects a peer defect or a MIP sees a
//! RAPS frame. [`CfmEventStream`] subscribes to the link group and decodes
//! those notifications; everything else arriving on the group is ignored.
//!
//! # Example
//!
//! ```ignore
//! use cfmlink::netlink::events::{CfmEvent, CfmEventStream};
//! use tokio_stream::StreamExt;
//!
//! let mut stream = CfmEventStream::new()?;
//! while let Some(event) = stream.try_next().await? {
//!     match event {
//!         CfmEvent::PeerDefect(ev) => {
//!             println!("instance {} peer {} defect {}", ev.instance, ev.peer_mepid, ev.ccm_defect);
//!         }
//!         CfmEvent::MipRaps(ev) => {
//!             println!("instance {} request {} from {}", ev.instance, ev.request(), ev.node_id);
//!         }
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio_stream::Stream;
use tracing::warn;

use super::attr::{AttrIter, AttrMap};
use super::cfm::cfm_block;
use super::connection::Connection;
use super::error::Result;
use super::message::{NLMSG_HDRLEN, NlMsgHdr, NlMsgType, nlmsg_align};
use super::socket::rtnetlink_groups::RTNLGRP_LINK;
use super::types::cfm::{cc_peer_event, cfm_attr, mip_event};
use crate::util::MacAddr;

/// A continuity-check peer state change.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct PeerDefectEvent {
    pub instance: u32,
    /// The peer whose state changed.
    pub peer_mepid: u32,
    /// Nonzero while CCMs from this peer are missing or defective.
    pub ccm_defect: u32,
}

/// A RAPS frame observed by a MIP.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct MipRapsEvent {
    pub instance: u32,
    /// Combined request/sub-code octet as carried on the wire.
    pub request_subcode: u32,
    pub status: u32,
    /// Originating ring node.
    pub node_id: MacAddr,
}

impl MipRapsEvent {
    /// RAPS request (high nibble of the combined octet).
    pub fn request(&self) -> u32 {
        (self.request_subcode & 0xF0) >> 4
    }

    /// RAPS sub-code (low nibble of the combined octet).
    pub fn sub_code(&self) -> u32 {
        self.request_subcode & 0x0F
    }
}

/// CFM events decoded from link notifications.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(tag = "type", rename_all = "snake_case"))]
pub enum CfmEvent {
    /// Peer MEP defect state changed.
    PeerDefect(PeerDefectEvent),
    /// MIP received a RAPS frame.
    MipRaps(MipRapsEvent),
}

impl CfmEvent {
    /// The MEP instance the event belongs to.
    pub fn instance(&self) -> u32 {
        match self {
            Self::PeerDefect(ev) => ev.instance,
            Self::MipRaps(ev) => ev.instance,
        }
    }
}

/// Decode the CFM events of one full link message.
///
/// Returns an empty vector for messages that carry no CFM event data.
/// Records missing their instance field are skipped, matching the
/// listener's tolerance for partially filled notifications.
pub fn parse_cfm_events(msg: &[u8]) -> Result<Vec<CfmEvent>> {
    let mut events = Vec::new();

    let header = NlMsgHdr::from_bytes(msg)?;
    if header.nlmsg_type != NlMsgType::RTM_NEWLINK {
        return Ok(events);
    }

    let Some(block) = cfm_block(msg)? else {
        return Ok(events);
    };

    for (kind, payload) in AttrIter::new(block) {
        match kind {
            cfm_attr::CC_PEER_EVENT_INFO => {
                let fields = AttrMap::parse(payload);
                if !fields.contains(cc_peer_event::INSTANCE) {
                    continue;
                }
                events.push(CfmEvent::PeerDefect(PeerDefectEvent {
                    instance: fields.get_u32(cc_peer_event::INSTANCE)?,
                    peer_mepid: fields.get_u32(cc_peer_event::PEER_MEPID)?,
                    ccm_defect: fields.get_u32(cc_peer_event::CCM_DEFECT)?,
                }));
            }
            cfm_attr::MIP_EVENT_INFO => {
                let fields = AttrMap::parse(payload);
                if !fields.contains(mip_event::INSTANCE) {
                    continue;
                }
                events.push(CfmEvent::MipRaps(MipRapsEvent {
                    instance: fields.get_u32(mip_event::INSTANCE)?,
                    request_subcode: fields.get_u32(mip_event::RAPS_REQUEST_SUBCODE)?,
                    status: fields.get_u32(mip_event::RAPS_STATUS)?,
                    node_id: MacAddr::new(fields.get_mac(mip_event::RAPS_NODE_ID)?),
                }));
            }
            _ => {}
        }
    }

    Ok(events)
}

/// Stream of CFM events from the kernel's link multicast group.
///
/// One receive buffer can carry several netlink messages and each message
/// several event records; decoded events are queued and yielded one at a
/// time. Malformed messages are logged and dropped, the stream keeps
/// listening.
pub struct CfmEventStream {
    conn: Connection,
    pending: VecDeque<CfmEvent>,
}

impl CfmEventStream {
    /// Open a socket and subscribe to link notifications.
    pub fn new() -> Result<Self> {
        let mut conn = Connection::new()?;
        conn.subscribe(RTNLGRP_LINK)?;
        Ok(Self {
            conn,
            pending: VecDeque::new(),
        })
    }

    /// Wrap an existing connection that is already subscribed.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            pending: VecDeque::new(),
        }
    }

    /// Receive the next event, surfacing socket errors through `?`.
    pub async fn try_next(&mut self) -> Result<Option<CfmEvent>> {
        use tokio_stream::StreamExt;
        match self.next().await {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Decode every message in one receive buffer, queueing its events.
    ///
    /// The decoders want full message slices (header included), so this
    /// walks the buffer by declared message lengths rather than through
    /// [`MessageIter`](super::message::MessageIter), which yields payloads
    /// only.
    fn decode_buffer(&mut self, data: &[u8]) {
        let mut offset = 0;
        while offset + NLMSG_HDRLEN <= data.len() {
            let header = match NlMsgHdr::from_bytes(&data[offset..]) {
                Ok(h) => h,
                Err(e) => {
                    warn!(error = %e, "dropping malformed netlink buffer");
                    return;
                }
            };
            let len = header.nlmsg_len as usize;
            if len < NLMSG_HDRLEN || offset + len > data.len() {
                warn!(declared = len, "dropping message with invalid length");
                return;
            }

            match parse_cfm_events(&data[offset..offset + len]) {
                Ok(events) => self.pending.extend(events),
                Err(e) => warn!(error = %e, "dropping undecodable link message"),
            }

            offset += nlmsg_align(len);
        }
    }
}

impl Stream for CfmEventStream {
    type Item = Result<CfmEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            match this.conn.poll_recv_event(cx) {
                Poll::Ready(Ok(data)) => this.decode_buffer(&data),
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(e))),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
