//! High-level netlink connection with request/response handling.

use std::task::{Context, Poll};

use tracing::debug;

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{
    MessageIter, NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NlMsgError, NlMsgHdr, NlMsgType,
};
use super::socket::NetlinkSocket;

/// High-level rtnetlink connection.
///
/// Owns the process's one routing socket; all CFM and MRP operations are
/// methods on this type (see the `cfm` and `mrp` modules). The socket is
/// closed when the connection is dropped.
pub struct Connection {
    socket: NetlinkSocket,
}

impl Connection {
    /// Open a new routing netlink connection.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
        })
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    /// Send a request that expects an ACK only (no data response).
    ///
    /// Blocks until the kernel's correlated reply arrives; there is no
    /// timeout on this path.
    pub async fn request_ack(&self, mut builder: MessageBuilder) -> Result<()> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        debug!(len = msg.len(), seq, "sending netlink request");
        self.socket.send(&msg).await?;

        // Receive ACK
        let response = self.socket.recv_msg().await?;
        self.process_ack(&response, seq)
    }

    /// Send a dump request and collect all response messages.
    ///
    /// Each returned buffer is one full message (header plus payload).
    pub async fn dump(&self, mut builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        debug!(len = msg.len(), seq, "sending netlink dump request");
        self.socket.send(&msg).await?;

        let mut responses = Vec::new();

        loop {
            let data = self.socket.recv_msg().await?;
            let mut done = false;

            for result in MessageIter::new(&data) {
                let (header, payload) = result?;

                // Check sequence number
                if header.nlmsg_seq != seq {
                    continue;
                }

                if header.is_error() {
                    let err = NlMsgError::from_bytes(payload)?;
                    if !err.is_ack() {
                        return Err(Error::from_errno(err.error));
                    }
                }

                if header.is_done() {
                    done = true;
                    break;
                }

                // Collect the full message (header + payload)
                let msg_len = header.nlmsg_len as usize;
                let msg_start = payload.as_ptr() as usize
                    - data.as_ptr() as usize
                    - std::mem::size_of::<NlMsgHdr>();
                if msg_start + msg_len <= data.len() {
                    responses.push(data[msg_start..msg_start + msg_len].to_vec());
                }
            }

            if done {
                break;
            }
        }

        Ok(responses)
    }

    /// Process an ACK response.
    fn process_ack(&self, data: &[u8], expected_seq: u32) -> Result<()> {
        for result in MessageIter::new(data) {
            let (header, payload) = result?;

            if header.nlmsg_seq != expected_seq {
                continue;
            }

            if header.is_error() {
                let err = NlMsgError::from_bytes(payload)?;
                if !err.is_ack() {
                    return Err(Error::from_errno(err.error));
                }
                return Ok(());
            }
        }

        Err(Error::InvalidMessage("expected ACK message".into()))
    }

    /// Subscribe to a multicast group for monitoring.
    pub fn subscribe(&mut self, group: u32) -> Result<()> {
        self.socket.add_membership(group)
    }

    /// Receive the next unsolicited event buffer (for monitoring).
    pub async fn recv_event(&self) -> Result<Vec<u8>> {
        self.socket.recv_msg().await
    }

    /// Poll for incoming event data.
    ///
    /// This is the poll-based version of `recv_event()` for use with
    /// `Stream` implementations.
    pub(crate) fn poll_recv_event(&self, cx: &mut Context<'_>) -> Poll<Result<Vec<u8>>> {
        self.socket.poll_recv(cx)
    }
}

/// Helper to build a dump request.
pub fn dump_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_DUMP)
}

/// Helper to build a request expecting ACK.
pub fn ack_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_ACK)
}

/// Helper to build a link dump filtered by `IFLA_EXT_MASK`.
///
/// Equivalent to iproute2's `rtnl_linkdump_req_filter`: an `RTM_GETLINK`
/// dump scoped to the bridge family, asking the kernel to fill in only the
/// AF_SPEC data selected by `ext_filter` (e.g. CFM config or status).
pub fn bridge_linkdump_request(ext_filter: u32) -> MessageBuilder {
    use super::types::link::{IfInfoMsg, IflaAttr};

    let mut builder = dump_request(NlMsgType::RTM_GETLINK);
    let ifinfo = IfInfoMsg::new().with_family(libc::AF_BRIDGE as u8);
    builder.append(&ifinfo);
    builder.append_attr_u32(IflaAttr::ExtMask as u16, ext_filter);
    builder
}
