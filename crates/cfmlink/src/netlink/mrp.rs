//! MRP ring instance configuration in the bridge driver.
//!
//! Rides the same nesting path as the CFM operations with
//! `IFLA_BRIDGE_MRP` as the domain block. Only ring instance creation and
//! deletion are offloaded here; ring state machines live in the kernel.

use super::builder::MessageBuilder;
use super::cfm::BridgeRequest;
use super::connection::Connection;
use super::error::Result;
use super::message::NlMsgType;
use super::types::mrp::{mrp_attr, mrp_instance};

/// Parameters describing one MRP ring instance.
#[derive(Debug, Clone, Copy)]
pub struct MrpInstance {
    /// Ring identifier.
    pub ring_id: u32,
    /// Primary ring port ifindex.
    pub p_ifindex: u32,
    /// Secondary ring port ifindex.
    pub s_ifindex: u32,
    /// Ring manager priority.
    pub prio: u16,
}

fn build_instance(bridge_ifindex: u32, cfg: &MrpInstance) -> MessageBuilder {
    let mut req = BridgeRequest::mrp(bridge_ifindex, mrp_attr::INSTANCE);
    req.attr_u32(mrp_instance::RING_ID, cfg.ring_id)
        .attr_u32(mrp_instance::P_IFINDEX, cfg.p_ifindex)
        .attr_u32(mrp_instance::S_IFINDEX, cfg.s_ifindex)
        .attr_u16(mrp_instance::PRIO, cfg.prio);
    req.finish()
}

impl Connection {
    /// Create an MRP ring instance on a bridge.
    ///
    /// The kernel distinguishes add from delete by the message type, so
    /// this sends `RTM_SETLINK` like every other bridge offload request;
    /// deleting sends the same instance block with `RTM_DELLINK`.
    pub async fn mrp_instance_add(&self, bridge_ifindex: u32, cfg: &MrpInstance) -> Result<()> {
        self.request_ack(build_instance(bridge_ifindex, cfg)).await
    }

    /// Delete an MRP ring instance from a bridge.
    pub async fn mrp_instance_del(&self, bridge_ifindex: u32, cfg: &MrpInstance) -> Result<()> {
        let mut builder = build_instance(bridge_ifindex, cfg);
        builder.set_type(NlMsgType::RTM_DELLINK);
        self.request_ack(builder).await
    }
}
