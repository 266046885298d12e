//! CFM (802.1ag/Y.1731) offload configuration in the bridge driver.
//!
//! Every operation is carried by the same three-level attribute tree on a
//! link message: `IFLA_AF_SPEC` → `IFLA_BRIDGE_CFM` → one operation block.
//! [`BridgeRequest`] owns that scaffold; the per-operation functions only
//! differ in the block tag and the typed fields appended inside it.
//!
//! # Example
//!
//! ```ignore
//! use cfmlink::netlink::Connection;
//! use cfmlink::netlink::cfm::{CcConfig, MepCreate};
//! use cfmlink::netlink::types::cfm::{CcmInterval, Direction, Domain, Maid};
//!
//! let conn = Connection::new()?;
//! let br = cfmlink::util::get_ifindex("br0")?;
//!
//! conn.cfm_mep_create(br, &MepCreate {
//!     instance: 1,
//!     domain: Domain::Vlan,
//!     direction: Direction::Down,
//!     vid: 10,
//!     ifindex: cfmlink::util::get_ifindex("eth0")?,
//! }).await?;
//!
//! conn.cfm_cc_config(br, &CcConfig {
//!     instance: 1,
//!     enable: true,
//!     interval: CcmInterval::Sec1,
//!     priority: 3,
//!     maid: Maid::new("dom1")?,
//! }).await?;
//!
//! let report = conn.cfm_mep_config_show().await?;
//! ```

use super::attr::{AttrIter, AttrMap};
use super::builder::{MessageBuilder, NestToken};
use super::connection::{Connection, ack_request, bridge_linkdump_request};
use super::error::Result;
use super::message::{NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
use super::types::cfm::{
    CcmInterval, Direction, Domain, Maid, cc_ccm_tx, cc_config, cc_peer_mep, cc_rdi, cfm_attr,
    cnt_clear, mep_config, mep_create, mep_delete, mep_status,
};
use super::types::link::{IfInfoMsg, IflaAttr, bridge_af, bridge_flags, rtext_filter};
use crate::util::MacAddr;

// ============================================================================
// Request scaffold
// ============================================================================

/// An in-progress bridge offload request.
///
/// Opens the fixed nesting path ifinfomsg(AF_BRIDGE) → `IFLA_AF_SPEC`
/// (with a `BRIDGE_FLAGS_SELF` marker) → domain block → operation block.
/// Fields are appended through the `attr_*` methods; [`finish`] closes the
/// three nests in reverse order of opening and yields the message.
///
/// [`finish`]: BridgeRequest::finish
pub struct BridgeRequest {
    builder: MessageBuilder,
    af_spec: NestToken,
    domain: NestToken,
    op: NestToken,
}

impl BridgeRequest {
    fn new(bridge_ifindex: u32, domain_attr: u16, op_attr: u16) -> Self {
        let mut builder = ack_request(NlMsgType::RTM_SETLINK);

        let ifinfo = IfInfoMsg::new()
            .with_family(libc::AF_BRIDGE as u8)
            .with_index(bridge_ifindex as i32);
        builder.append(&ifinfo);

        let af_spec = builder.nest_start_plain(IflaAttr::AfSpec as u16);
        builder.append_attr_u16(bridge_af::IFLA_BRIDGE_FLAGS, bridge_flags::SELF);

        let domain = builder.nest_start(domain_attr);
        let op = builder.nest_start(op_attr);

        Self {
            builder,
            af_spec,
            domain,
            op,
        }
    }

    /// Start a CFM request with the given operation block tag.
    pub fn cfm(bridge_ifindex: u32, op_attr: u16) -> Self {
        Self::new(bridge_ifindex, bridge_af::IFLA_BRIDGE_CFM, op_attr)
    }

    /// Start an MRP request with the given operation block tag.
    pub fn mrp(bridge_ifindex: u32, op_attr: u16) -> Self {
        Self::new(bridge_ifindex, bridge_af::IFLA_BRIDGE_MRP, op_attr)
    }

    /// Append a u8 field to the operation block.
    pub fn attr_u8(&mut self, tag: u16, value: u8) -> &mut Self {
        self.builder.append_attr_u8(tag, value);
        self
    }

    /// Append a u16 field to the operation block.
    pub fn attr_u16(&mut self, tag: u16, value: u16) -> &mut Self {
        self.builder.append_attr_u16(tag, value);
        self
    }

    /// Append a u32 field to the operation block.
    pub fn attr_u32(&mut self, tag: u16, value: u32) -> &mut Self {
        self.builder.append_attr_u32(tag, value);
        self
    }

    /// Append a raw byte field (MAC, MAID) to the operation block.
    pub fn attr_bytes(&mut self, tag: u16, value: &[u8]) -> &mut Self {
        self.builder.append_attr(tag, value);
        self
    }

    /// Close the operation, domain and AF_SPEC nests and return the
    /// finished message builder.
    pub fn finish(mut self) -> MessageBuilder {
        self.builder.nest_end(self.op);
        self.builder.nest_end(self.domain);
        self.builder.nest_end(self.af_spec);
        self.builder
    }
}

// ============================================================================
// Operation parameters
// ============================================================================

/// Parameters for creating a MEP instance.
#[derive(Debug, Clone, Copy)]
pub struct MepCreate {
    /// Instance number, the kernel-side lookup key for later operations.
    pub instance: u32,
    /// Port or VLAN domain.
    pub domain: Domain,
    /// Up- or down-MEP.
    pub direction: Direction,
    /// VLAN ID (meaningful for VLAN-domain MEPs).
    pub vid: u16,
    /// Residence port ifindex.
    pub ifindex: u32,
}

/// Parameters for configuring an existing MEP instance.
#[derive(Debug, Clone, Copy)]
pub struct MepConfig {
    pub instance: u32,
    /// Unicast MAC the MEP answers on.
    pub unicast_mac: MacAddr,
    /// Maintenance domain level (0-7).
    pub mdlevel: u32,
    /// This MEP's own MEP ID.
    pub mepid: u32,
    pub vid: u16,
}

/// Parameters for continuity-check configuration.
#[derive(Debug, Clone, Copy)]
pub struct CcConfig {
    pub instance: u32,
    /// Enable or disable CCM reception checking.
    pub enable: bool,
    /// Expected CCM interval.
    pub interval: CcmInterval,
    /// Expected CCM priority.
    pub priority: u32,
    /// Expected MAID.
    pub maid: Maid,
}

/// Parameters for CCM frame transmission.
#[derive(Debug, Clone, Copy)]
pub struct CcCcmTx {
    pub instance: u32,
    /// Destination MAC of transmitted CCM frames.
    pub dmac: MacAddr,
    /// Update the sequence number on each transmitted frame.
    pub seq_no_update: bool,
    /// Transmission period in seconds; 0 stops transmission.
    pub period: u32,
    /// Include an interface status TLV.
    pub if_tlv: bool,
    pub if_tlv_value: u8,
    /// Include a port status TLV.
    pub port_tlv: bool,
    pub port_tlv_value: u8,
}

// ============================================================================
// Request construction (one function per operation kind)
// ============================================================================

fn build_mep_create(bridge_ifindex: u32, cfg: &MepCreate) -> MessageBuilder {
    let mut req = BridgeRequest::cfm(bridge_ifindex, cfm_attr::MEP_CREATE);
    req.attr_u32(mep_create::INSTANCE, cfg.instance)
        .attr_u32(mep_create::DOMAIN, cfg.domain as u32)
        .attr_u32(mep_create::DIRECTION, cfg.direction as u32)
        .attr_u16(mep_create::VID, cfg.vid)
        .attr_u32(mep_create::IFINDEX, cfg.ifindex);
    req.finish()
}

fn build_mep_delete(bridge_ifindex: u32, instance: u32) -> MessageBuilder {
    let mut req = BridgeRequest::cfm(bridge_ifindex, cfm_attr::MEP_DELETE);
    req.attr_u32(mep_delete::INSTANCE, instance);
    req.finish()
}

fn build_mep_config(bridge_ifindex: u32, cfg: &MepConfig) -> MessageBuilder {
    let mut req = BridgeRequest::cfm(bridge_ifindex, cfm_attr::MEP_CONFIG);
    req.attr_u32(mep_config::INSTANCE, cfg.instance)
        .attr_bytes(mep_config::UNICAST_MAC, cfg.unicast_mac.as_bytes())
        .attr_u32(mep_config::MDLEVEL, cfg.mdlevel)
        .attr_u32(mep_config::MEPID, cfg.mepid)
        .attr_u16(mep_config::VID, cfg.vid);
    req.finish()
}

fn build_cc_config(bridge_ifindex: u32, cfg: &CcConfig) -> MessageBuilder {
    let mut req = BridgeRequest::cfm(bridge_ifindex, cfm_attr::CC_CONFIG);
    req.attr_u32(cc_config::INSTANCE, cfg.instance)
        .attr_u32(cc_config::ENABLE, cfg.enable as u32)
        .attr_u32(cc_config::EXP_INTERVAL, cfg.interval as u32)
        .attr_u32(cc_config::PRIORITY, cfg.priority)
        .attr_bytes(cc_config::EXP_MAID, cfg.maid.as_bytes());
    req.finish()
}

fn build_cc_peer(bridge_ifindex: u32, op: u16, instance: u32, mepid: u32) -> MessageBuilder {
    let mut req = BridgeRequest::cfm(bridge_ifindex, op);
    req.attr_u32(cc_peer_mep::INSTANCE, instance)
        .attr_u32(cc_peer_mep::MEPID, mepid);
    req.finish()
}

fn build_cc_rdi(bridge_ifindex: u32, instance: u32, rdi: bool) -> MessageBuilder {
    let mut req = BridgeRequest::cfm(bridge_ifindex, cfm_attr::CC_RDI);
    req.attr_u32(cc_rdi::INSTANCE, instance)
        .attr_u32(cc_rdi::RDI, rdi as u32);
    req.finish()
}

fn build_cc_ccm_tx(bridge_ifindex: u32, cfg: &CcCcmTx) -> MessageBuilder {
    let mut req = BridgeRequest::cfm(bridge_ifindex, cfm_attr::CC_CCM_TX);
    req.attr_u32(cc_ccm_tx::INSTANCE, cfg.instance)
        .attr_bytes(cc_ccm_tx::DMAC, cfg.dmac.as_bytes())
        .attr_u32(cc_ccm_tx::SEQ_NO_UPDATE, cfg.seq_no_update as u32)
        .attr_u32(cc_ccm_tx::PERIOD, cfg.period)
        .attr_u32(cc_ccm_tx::IF_TLV, cfg.if_tlv as u32)
        .attr_u8(cc_ccm_tx::IF_TLV_VALUE, cfg.if_tlv_value)
        .attr_u32(cc_ccm_tx::PORT_TLV, cfg.port_tlv as u32)
        .attr_u8(cc_ccm_tx::PORT_TLV_VALUE, cfg.port_tlv_value);
    req.finish()
}

fn build_cnt_clear(bridge_ifindex: u32, op: u16, instance: u32) -> MessageBuilder {
    let mut req = BridgeRequest::cfm(bridge_ifindex, op);
    req.attr_u32(cnt_clear::INSTANCE, instance);
    req.finish()
}

// ============================================================================
// Decoded records
// ============================================================================

/// One `MEP_CREATE_INFO` record from a config dump.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct MepCreateInfo {
    pub instance: u32,
    /// Raw domain code; see [`domain`](Self::domain).
    pub domain: u32,
    /// Raw direction code; see [`direction`](Self::direction).
    pub direction: u32,
    pub vid: u16,
    pub ifindex: u32,
}

impl MepCreateInfo {
    /// Typed domain, if the code is known.
    pub fn domain(&self) -> Option<Domain> {
        Domain::from_raw(self.domain)
    }

    /// Typed direction, if the code is known.
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_raw(self.direction)
    }
}

/// One `MEP_CONFIG_INFO` record from a config dump.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct MepConfigInfo {
    pub instance: u32,
    pub unicast_mac: MacAddr,
    pub mdlevel: u32,
    pub mepid: u32,
    pub vid: u16,
}

/// One `CC_CONFIG_INFO` record from a config dump.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct CcConfigInfo {
    pub instance: u32,
    pub enable: bool,
    /// Raw interval code; see [`interval`](Self::interval).
    pub interval: u32,
    pub priority: u32,
    /// Expected MAID name.
    pub maid: String,
}

impl CcConfigInfo {
    /// Typed interval, if the code is known.
    pub fn interval(&self) -> Option<CcmInterval> {
        CcmInterval::from_raw(self.interval)
    }
}

/// Peer MEP IDs of one instance, grouped from consecutive
/// `CC_PEER_MEP_INFO` records.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct PeerMepGroup {
    pub instance: u32,
    pub mepids: Vec<u32>,
}

/// One `MEP_STATUS_INFO` record from a status dump.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct MepStatus {
    pub instance: u32,
    pub opcode_unexp_seen: u32,
    pub dmac_unexp_seen: u32,
    pub tx_level_low_seen: u32,
    pub version_unexp_seen: u32,
    pub rx_level_low_seen: u32,
}

/// Everything a CFM config dump reports, per bridge.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct CfmConfigReport {
    pub creates: Vec<MepCreateInfo>,
    pub configs: Vec<MepConfigInfo>,
    pub cc_configs: Vec<CcConfigInfo>,
    pub peer_groups: Vec<PeerMepGroup>,
}

impl CfmConfigReport {
    /// Check whether the dump carried any CFM data at all.
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty()
            && self.configs.is_empty()
            && self.cc_configs.is_empty()
            && self.peer_groups.is_empty()
    }

    fn merge(&mut self, other: CfmConfigReport) {
        self.creates.extend(other.creates);
        self.configs.extend(other.configs);
        self.cc_configs.extend(other.cc_configs);
        self.peer_groups.extend(other.peer_groups);
    }
}

// ============================================================================
// Reply decoding
// ============================================================================

/// Locate the `IFLA_BRIDGE_CFM` block inside one full link message.
///
/// Returns `None` for messages that carry no CFM data: wrong family,
/// wrong message type, or no AF_SPEC/CFM attribute. A message shorter
/// than its own headers is an error.
pub fn cfm_block(msg: &[u8]) -> Result<Option<&[u8]>> {
    let header = NlMsgHdr::from_bytes(msg)?;
    if header.nlmsg_type != NlMsgType::RTM_NEWLINK && header.nlmsg_type != NlMsgType::RTM_SETLINK {
        return Ok(None);
    }

    let payload = &msg[NLMSG_HDRLEN..];
    let ifinfo = IfInfoMsg::from_bytes(payload)?;
    if ifinfo.ifi_family != libc::AF_BRIDGE as u8 {
        return Ok(None);
    }

    let attrs = &payload[IfInfoMsg::SIZE..];
    for (kind, af_payload) in AttrIter::new(attrs) {
        if kind != IflaAttr::AfSpec as u16 {
            continue;
        }
        for (af_kind, block) in AttrIter::new(af_payload) {
            if af_kind == bridge_af::IFLA_BRIDGE_CFM {
                return Ok(Some(block));
            }
        }
    }

    Ok(None)
}

/// Decode the config-dump records of one link message.
pub fn parse_config_report(msg: &[u8]) -> Result<CfmConfigReport> {
    let mut report = CfmConfigReport::default();
    let Some(block) = cfm_block(msg)? else {
        return Ok(report);
    };

    let mut peer_records = Vec::new();

    for (kind, payload) in AttrIter::new(block) {
        match kind {
            cfm_attr::MEP_CREATE_INFO => {
                let fields = AttrMap::parse(payload);
                if !fields.contains(mep_create::INSTANCE) {
                    break;
                }
                report.creates.push(MepCreateInfo {
                    instance: fields.get_u32(mep_create::INSTANCE)?,
                    domain: fields.get_u32(mep_create::DOMAIN)?,
                    direction: fields.get_u32(mep_create::DIRECTION)?,
                    vid: fields.get_u16(mep_create::VID)?,
                    ifindex: fields.get_u32(mep_create::IFINDEX)?,
                });
            }
            cfm_attr::MEP_CONFIG_INFO => {
                let fields = AttrMap::parse(payload);
                if !fields.contains(mep_config::INSTANCE) {
                    break;
                }
                report.configs.push(MepConfigInfo {
                    instance: fields.get_u32(mep_config::INSTANCE)?,
                    unicast_mac: MacAddr::new(fields.get_mac(mep_config::UNICAST_MAC)?),
                    mdlevel: fields.get_u32(mep_config::MDLEVEL)?,
                    mepid: fields.get_u32(mep_config::MEPID)?,
                    vid: fields.get_u16(mep_config::VID)?,
                });
            }
            cfm_attr::CC_CONFIG_INFO => {
                let fields = AttrMap::parse(payload);
                if !fields.contains(cc_config::INSTANCE) {
                    break;
                }
                let maid = fields
                    .get(cc_config::EXP_MAID)
                    .map(Maid::from_bytes)
                    .transpose()?
                    .map(|m| m.name())
                    .unwrap_or_default();
                report.cc_configs.push(CcConfigInfo {
                    instance: fields.get_u32(cc_config::INSTANCE)?,
                    enable: fields.get_u32(cc_config::ENABLE)? != 0,
                    interval: fields.get_u32(cc_config::EXP_INTERVAL)?,
                    priority: fields.get_u32(cc_config::PRIORITY)?,
                    maid,
                });
            }
            cfm_attr::CC_PEER_MEP_INFO => {
                let fields = AttrMap::parse(payload);
                if !fields.contains(cc_peer_mep::INSTANCE) {
                    break;
                }
                peer_records.push((
                    fields.get_u32(cc_peer_mep::INSTANCE)?,
                    fields.get_u32(cc_peer_mep::MEPID)?,
                ));
            }
            // Forward-compatible: future kernel attributes are skipped.
            _ => {}
        }
    }

    report.peer_groups = group_peer_meps(&peer_records);
    Ok(report)
}

/// Decode the status records of one link message.
pub fn parse_status_records(msg: &[u8]) -> Result<Vec<MepStatus>> {
    let mut records = Vec::new();
    let Some(block) = cfm_block(msg)? else {
        return Ok(records);
    };

    for (kind, payload) in AttrIter::new(block) {
        if kind != cfm_attr::MEP_STATUS_INFO {
            continue;
        }
        let fields = AttrMap::parse(payload);
        if !fields.contains(mep_status::INSTANCE) {
            break;
        }
        records.push(MepStatus {
            instance: fields.get_u32(mep_status::INSTANCE)?,
            opcode_unexp_seen: fields.get_u32(mep_status::OPCODE_UNEXP_SEEN)?,
            dmac_unexp_seen: fields.get_u32(mep_status::DMAC_UNEXP_SEEN)?,
            tx_level_low_seen: fields.get_u32(mep_status::TX_LEVEL_LOW_SEEN)?,
            version_unexp_seen: fields.get_u32(mep_status::VERSION_UNEXP_SEEN)?,
            rx_level_low_seen: fields.get_u32(mep_status::RX_LEVEL_LOW_SEEN)?,
        });
    }

    Ok(records)
}

/// Group peer-MEP records by consecutive instance number.
///
/// A new group opens only when the instance differs from the previous
/// record; kernel-side emission order is relied upon, records are not
/// sorted.
pub fn group_peer_meps(records: &[(u32, u32)]) -> Vec<PeerMepGroup> {
    let mut groups: Vec<PeerMepGroup> = Vec::new();
    for &(instance, mepid) in records {
        match groups.last_mut() {
            Some(group) if group.instance == instance => group.mepids.push(mepid),
            _ => groups.push(PeerMepGroup {
                instance,
                mepids: vec![mepid],
            }),
        }
    }
    groups
}

// ============================================================================
// Connection methods
// ============================================================================

impl Connection {
    /// Create a MEP instance on a bridge.
    pub async fn cfm_mep_create(&self, bridge_ifindex: u32, cfg: &MepCreate) -> Result<()> {
        self.request_ack(build_mep_create(bridge_ifindex, cfg)).await
    }

    /// Delete a MEP instance.
    pub async fn cfm_mep_delete(&self, bridge_ifindex: u32, instance: u32) -> Result<()> {
        self.request_ack(build_mep_delete(bridge_ifindex, instance))
            .await
    }

    /// Configure a MEP instance (unicast MAC, MD level, MEP ID, VID).
    pub async fn cfm_mep_config(&self, bridge_ifindex: u32, cfg: &MepConfig) -> Result<()> {
        self.request_ack(build_mep_config(bridge_ifindex, cfg)).await
    }

    /// Configure continuity checking on a MEP instance.
    pub async fn cfm_cc_config(&self, bridge_ifindex: u32, cfg: &CcConfig) -> Result<()> {
        self.request_ack(build_cc_config(bridge_ifindex, cfg)).await
    }

    /// Add a peer MEP ID to monitor.
    pub async fn cfm_cc_peer_add(
        &self,
        bridge_ifindex: u32,
        instance: u32,
        mepid: u32,
    ) -> Result<()> {
        self.request_ack(build_cc_peer(
            bridge_ifindex,
            cfm_attr::CC_PEER_MEP_ADD,
            instance,
            mepid,
        ))
        .await
    }

    /// Remove a monitored peer MEP ID.
    pub async fn cfm_cc_peer_remove(
        &self,
        bridge_ifindex: u32,
        instance: u32,
        mepid: u32,
    ) -> Result<()> {
        self.request_ack(build_cc_peer(
            bridge_ifindex,
            cfm_attr::CC_PEER_MEP_REMOVE,
            instance,
            mepid,
        ))
        .await
    }

    /// Set or clear the RDI flag in transmitted CCM frames.
    pub async fn cfm_cc_rdi(&self, bridge_ifindex: u32, instance: u32, rdi: bool) -> Result<()> {
        self.request_ack(build_cc_rdi(bridge_ifindex, instance, rdi))
            .await
    }

    /// Configure CCM frame transmission.
    pub async fn cfm_cc_ccm_tx(&self, bridge_ifindex: u32, cfg: &CcCcmTx) -> Result<()> {
        self.request_ack(build_cc_ccm_tx(bridge_ifindex, cfg)).await
    }

    /// Clear the MEP status counters of an instance.
    pub async fn cfm_mep_cnt_clear(&self, bridge_ifindex: u32, instance: u32) -> Result<()> {
        self.request_ack(build_cnt_clear(
            bridge_ifindex,
            cfm_attr::MEP_CNT_CLEAR,
            instance,
        ))
        .await
    }

    /// Clear the continuity-check counters of an instance.
    pub async fn cfm_cc_cnt_clear(&self, bridge_ifindex: u32, instance: u32) -> Result<()> {
        self.request_ack(build_cnt_clear(
            bridge_ifindex,
            cfm_attr::CC_CNT_CLEAR,
            instance,
        ))
        .await
    }

    /// Dump the CFM configuration of every bridge.
    pub async fn cfm_mep_config_show(&self) -> Result<CfmConfigReport> {
        let responses = self
            .dump(bridge_linkdump_request(rtext_filter::CFM_CONFIG))
            .await?;

        let mut report = CfmConfigReport::default();
        for response in responses {
            report.merge(parse_config_report(&response)?);
        }
        Ok(report)
    }

    /// Dump the MEP status counters of every bridge.
    pub async fn cfm_mep_status_show(&self) -> Result<Vec<MepStatus>> {
        let responses = self
            .dump(bridge_linkdump_request(rtext_filter::CFM_STATUS))
            .await?;

        let mut records = Vec::new();
        for response in responses {
            records.extend(parse_status_records(&response)?);
        }
        Ok(records)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{AttrIter, NLA_HDRLEN, NlAttr, nla_align};
    use crate::netlink::message::{NLM_F_ACK, NLM_F_REQUEST};

    fn mac(s: &str) -> MacAddr {
        s.parse().unwrap()
    }

    /// Sum of the aligned lengths of the attributes in `data`.
    fn children_sum(data: &[u8]) -> usize {
        let mut sum = 0;
        while sum + NLA_HDRLEN <= data.len() {
            let child = NlAttr::from_bytes(&data[sum..]).unwrap();
            sum += nla_align(child.nla_len as usize);
        }
        sum
    }

    /// Recursively verify that each nested record's declared length equals
    /// 4 plus the sum of its direct children's aligned lengths.
    fn check_nest_lengths(data: &[u8]) {
        let mut offset = 0;
        while offset + NLA_HDRLEN <= data.len() {
            let attr = NlAttr::from_bytes(&data[offset..]).unwrap();
            let len = attr.nla_len as usize;
            assert!(len >= NLA_HDRLEN && offset + len <= data.len());

            if attr.is_nested() {
                let payload = &data[offset + NLA_HDRLEN..offset + len];
                assert_eq!(len, NLA_HDRLEN + children_sum(payload));
                check_nest_lengths(payload);
            }
            offset += nla_align(len);
        }
    }

    /// Verify the whole request tree: AF_SPEC spans the attribute region
    /// exactly and every nested block below it satisfies the length
    /// invariant.
    fn check_request_tree(msg: &[u8]) {
        let payload = &msg[NLMSG_HDRLEN + IfInfoMsg::SIZE..];
        let af_spec = NlAttr::from_bytes(payload).unwrap();
        assert_eq!(nla_align(af_spec.nla_len as usize), payload.len());

        let children = &payload[NLA_HDRLEN..af_spec.nla_len as usize];
        assert_eq!(af_spec.nla_len as usize, NLA_HDRLEN + children_sum(children));
        check_nest_lengths(children);
    }

    fn request_attrs(msg: &[u8]) -> Vec<(u16, Vec<u8>)> {
        let payload = &msg[NLMSG_HDRLEN + IfInfoMsg::SIZE..];
        check_request_tree(msg);

        // AF_SPEC -> skip FLAGS -> domain block -> op block
        let (kind, af_spec) = AttrIter::new(payload).next().unwrap();
        assert_eq!(kind, IflaAttr::AfSpec as u16);

        let mut af_iter = AttrIter::new(af_spec);
        let (flags_kind, flags_payload) = af_iter.next().unwrap();
        assert_eq!(flags_kind, bridge_af::IFLA_BRIDGE_FLAGS);
        assert_eq!(
            u16::from_ne_bytes([flags_payload[0], flags_payload[1]]),
            bridge_flags::SELF
        );

        let (_domain_kind, domain_payload) = af_iter.next().unwrap();
        let (_op_kind, op_payload) = AttrIter::new(domain_payload).next().unwrap();

        AttrIter::new(op_payload)
            .map(|(k, p)| (k, p.to_vec()))
            .collect()
    }

    #[test]
    fn test_mep_create_request() {
        let cfg = MepCreate {
            instance: 1,
            domain: Domain::Vlan,
            direction: Direction::Down,
            vid: 10,
            ifindex: 7,
        };
        let msg = build_mep_create(4, &cfg).finish();

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_type, NlMsgType::RTM_SETLINK);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST | NLM_F_ACK);
        assert_eq!(header.nlmsg_len as usize, msg.len());

        let ifinfo = IfInfoMsg::from_bytes(&msg[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(ifinfo.ifi_family, libc::AF_BRIDGE as u8);
        assert_eq!(ifinfo.ifi_index, 4);

        let attrs = request_attrs(&msg);
        assert_eq!(attrs.len(), 5);
        assert_eq!(attrs[0].0, mep_create::INSTANCE);
        assert_eq!(attrs[1].0, mep_create::DOMAIN);
        assert_eq!(u32::from_ne_bytes(attrs[1].1[..4].try_into().unwrap()), 1);
        assert_eq!(attrs[2].0, mep_create::DIRECTION);
        assert_eq!(u32::from_ne_bytes(attrs[2].1[..4].try_into().unwrap()), 0);
        assert_eq!(attrs[3].0, mep_create::VID);
        assert_eq!(u16::from_ne_bytes(attrs[3].1[..2].try_into().unwrap()), 10);
        assert_eq!(attrs[4].0, mep_create::IFINDEX);
    }

    #[test]
    fn test_domain_and_op_blocks_are_flagged_nested() {
        let msg = build_mep_delete(4, 1).finish();
        let payload = &msg[NLMSG_HDRLEN + IfInfoMsg::SIZE..];

        let af_spec = NlAttr::from_bytes(payload).unwrap();
        assert!(!af_spec.is_nested());

        // AF_SPEC payload: FLAGS attr then the CFM block
        let af_payload = &payload[NLA_HDRLEN..af_spec.nla_len as usize];
        let flags = NlAttr::from_bytes(af_payload).unwrap();
        let cfm = NlAttr::from_bytes(&af_payload[nla_align(flags.nla_len as usize)..]).unwrap();
        assert!(cfm.is_nested());
        assert_eq!(cfm.kind(), bridge_af::IFLA_BRIDGE_CFM);

        let op = NlAttr::from_bytes(&af_payload[nla_align(flags.nla_len as usize) + NLA_HDRLEN..])
            .unwrap();
        assert!(op.is_nested());
        assert_eq!(op.kind(), cfm_attr::MEP_DELETE);
    }

    #[test]
    fn test_every_operation_kind_holds_nesting_invariant() {
        let cc = CcConfig {
            instance: 2,
            enable: true,
            interval: CcmInterval::Sec1,
            priority: 3,
            maid: Maid::new("dom1").unwrap(),
        };
        let tx = CcCcmTx {
            instance: 2,
            dmac: mac("01-80-C2-00-00-30"),
            seq_no_update: true,
            period: 10,
            if_tlv: true,
            if_tlv_value: 1,
            port_tlv: false,
            port_tlv_value: 0,
        };
        let mep = MepConfig {
            instance: 2,
            unicast_mac: mac("00-00-00-00-00-01"),
            mdlevel: 5,
            mepid: 11,
            vid: 20,
        };
        let create = MepCreate {
            instance: 0,
            domain: Domain::Port,
            direction: Direction::Up,
            vid: 0,
            ifindex: 3,
        };

        let msgs = [
            build_mep_create(4, &create).finish(),
            build_mep_delete(4, 2).finish(),
            build_mep_config(4, &mep).finish(),
            build_cc_config(4, &cc).finish(),
            build_cc_peer(4, cfm_attr::CC_PEER_MEP_ADD, 2, 3).finish(),
            build_cc_peer(4, cfm_attr::CC_PEER_MEP_REMOVE, 2, 3).finish(),
            build_cc_rdi(4, 2, true).finish(),
            build_cc_ccm_tx(4, &tx).finish(),
            build_cnt_clear(4, cfm_attr::MEP_CNT_CLEAR, 2).finish(),
            build_cnt_clear(4, cfm_attr::CC_CNT_CLEAR, 2).finish(),
        ];

        for msg in &msgs {
            let header = NlMsgHdr::from_bytes(msg).unwrap();
            assert_eq!(header.nlmsg_len as usize, msg.len());
            check_request_tree(msg);
        }
    }

    #[test]
    fn test_cc_config_carries_maid_blob() {
        let cfg = CcConfig {
            instance: 1,
            enable: true,
            interval: CcmInterval::Ms100,
            priority: 0,
            maid: Maid::new("dom1").unwrap(),
        };
        let msg = build_cc_config(4, &cfg).finish();
        let attrs = request_attrs(&msg);

        let maid_attr = attrs
            .iter()
            .find(|(k, _)| *k == cc_config::EXP_MAID)
            .unwrap();
        assert_eq!(maid_attr.1.len(), 48);
        assert_eq!(&maid_attr.1[..7], &[1, 2, 4, b'd', b'o', b'm', b'1']);
    }

    // ------------------------------------------------------------------
    // Decode path
    // ------------------------------------------------------------------

    /// Build a synthetic dump reply carrying the given CFM info records.
    fn reply_message(records: &[(u16, Vec<(u16, Vec<u8>)>)]) -> Vec<u8> {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, 0);
        let ifinfo = IfInfoMsg::new().with_family(libc::AF_BRIDGE as u8);
        builder.append(&ifinfo);

        let af_spec = builder.nest_start_plain(IflaAttr::AfSpec as u16);
        let cfm = builder.nest_start(bridge_af::IFLA_BRIDGE_CFM);
        for (record_tag, fields) in records {
            let rec = builder.nest_start(*record_tag);
            for (tag, payload) in fields {
                builder.append_attr(*tag, payload);
            }
            builder.nest_end(rec);
        }
        builder.nest_end(cfm);
        builder.nest_end(af_spec);
        builder.finish()
    }

    fn u32f(tag: u16, v: u32) -> (u16, Vec<u8>) {
        (tag, v.to_ne_bytes().to_vec())
    }

    fn u16f(tag: u16, v: u16) -> (u16, Vec<u8>) {
        (tag, v.to_ne_bytes().to_vec())
    }

    #[test]
    fn test_decode_create_and_config_records() {
        let msg = reply_message(&[
            (
                cfm_attr::MEP_CREATE_INFO,
                vec![
                    u32f(mep_create::INSTANCE, 1),
                    u32f(mep_create::DOMAIN, Domain::Vlan as u32),
                    u32f(mep_create::DIRECTION, Direction::Down as u32),
                    u16f(mep_create::VID, 10),
                    u32f(mep_create::IFINDEX, 7),
                ],
            ),
            (
                cfm_attr::MEP_CONFIG_INFO,
                vec![
                    u32f(mep_config::INSTANCE, 1),
                    (mep_config::UNICAST_MAC, vec![0, 1, 2, 3, 4, 5]),
                    u32f(mep_config::MDLEVEL, 5),
                    u32f(mep_config::MEPID, 11),
                    u16f(mep_config::VID, 10),
                ],
            ),
            (
                cfm_attr::CC_CONFIG_INFO,
                vec![
                    u32f(cc_config::INSTANCE, 1),
                    u32f(cc_config::ENABLE, 1),
                    u32f(cc_config::EXP_INTERVAL, CcmInterval::Sec1 as u32),
                    u32f(cc_config::PRIORITY, 3),
                    (
                        cc_config::EXP_MAID,
                        Maid::new("dom1").unwrap().as_bytes().to_vec(),
                    ),
                ],
            ),
        ]);

        let report = parse_config_report(&msg).unwrap();
        assert_eq!(report.creates.len(), 1);
        let create = &report.creates[0];
        assert_eq!(create.instance, 1);
        assert_eq!(create.domain(), Some(Domain::Vlan));
        assert_eq!(create.direction(), Some(Direction::Down));
        assert_eq!(create.vid, 10);
        assert_eq!(create.ifindex, 7);

        assert_eq!(report.configs.len(), 1);
        assert_eq!(report.configs[0].unicast_mac.octets(), [0, 1, 2, 3, 4, 5]);
        assert_eq!(report.configs[0].mepid, 11);

        assert_eq!(report.cc_configs.len(), 1);
        let cc = &report.cc_configs[0];
        assert!(cc.enable);
        assert_eq!(cc.interval(), Some(CcmInterval::Sec1));
        assert_eq!(cc.maid, "dom1");
    }

    #[test]
    fn test_decode_peer_grouping() {
        let records: Vec<_> = [1u32, 1, 2, 2, 2]
            .iter()
            .zip([10u32, 11, 20, 21, 22])
            .map(|(&inst, mepid)| {
                (
                    cfm_attr::CC_PEER_MEP_INFO,
                    vec![
                        u32f(cc_peer_mep::INSTANCE, inst),
                        u32f(cc_peer_mep::MEPID, mepid),
                    ],
                )
            })
            .collect();
        let msg = reply_message(&records);

        let report = parse_config_report(&msg).unwrap();
        assert_eq!(report.peer_groups.len(), 2);
        assert_eq!(report.peer_groups[0].instance, 1);
        assert_eq!(report.peer_groups[0].mepids, vec![10, 11]);
        assert_eq!(report.peer_groups[1].instance, 2);
        assert_eq!(report.peer_groups[1].mepids, vec![20, 21, 22]);
    }

    #[test]
    fn test_group_peer_meps_preserves_arrival_order() {
        // Non-adjacent repeats open a new group; records are not sorted.
        let groups = group_peer_meps(&[(1, 10), (2, 20), (1, 11)]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].instance, 1);
        assert_eq!(groups[1].instance, 2);
        assert_eq!(groups[2].instance, 1);
    }

    #[test]
    fn test_decode_status_records() {
        let msg = reply_message(&[(
            cfm_attr::MEP_STATUS_INFO,
            vec![
                u32f(mep_status::INSTANCE, 3),
                u32f(mep_status::OPCODE_UNEXP_SEEN, 1),
                u32f(mep_status::DMAC_UNEXP_SEEN, 0),
                u32f(mep_status::TX_LEVEL_LOW_SEEN, 1),
                u32f(mep_status::VERSION_UNEXP_SEEN, 0),
                u32f(mep_status::RX_LEVEL_LOW_SEEN, 1),
            ],
        )]);

        let records = parse_status_records(&msg).unwrap();
        assert_eq!(records.len(), 1);
        let status = &records[0];
        assert_eq!(status.instance, 3);
        assert_eq!(status.opcode_unexp_seen, 1);
        assert_eq!(status.dmac_unexp_seen, 0);
        assert_eq!(status.tx_level_low_seen, 1);
        assert_eq!(status.version_unexp_seen, 0);
        assert_eq!(status.rx_level_low_seen, 1);
    }

    #[test]
    fn test_decode_skips_unknown_tags() {
        let msg = reply_message(&[
            (999, vec![u32f(1, 42)]),
            (
                cfm_attr::MEP_CREATE_INFO,
                vec![
                    u32f(mep_create::INSTANCE, 1),
                    u32f(mep_create::DOMAIN, 0),
                    u32f(mep_create::DIRECTION, 0),
                    u16f(mep_create::VID, 0),
                    u32f(mep_create::IFINDEX, 2),
                ],
            ),
        ]);

        let report = parse_config_report(&msg).unwrap();
        assert_eq!(report.creates.len(), 1);
    }

    #[test]
    fn test_decode_non_bridge_family_is_empty() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, 0);
        builder.append(&IfInfoMsg::new()); // AF_UNSPEC
        let msg = builder.finish();

        assert!(parse_config_report(&msg).unwrap().is_empty());
        assert!(parse_status_records(&msg).unwrap().is_empty());
    }

    #[test]
    fn test_decode_without_af_spec_is_empty() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, 0);
        builder.append(&IfInfoMsg::new().with_family(libc::AF_BRIDGE as u8));
        let msg = builder.finish();

        assert!(parse_config_report(&msg).unwrap().is_empty());
    }

    #[test]
    fn test_decode_truncated_message_fails_cleanly() {
        let msg = reply_message(&[]);
        assert!(parse_config_report(&msg[..12]).is_err());
    }

    #[test]
    fn test_decode_record_missing_instance_stops_iteration() {
        let msg = reply_message(&[
            (
                cfm_attr::MEP_CREATE_INFO,
                vec![u32f(mep_create::DOMAIN, 0)], // no INSTANCE
            ),
            (
                cfm_attr::MEP_CREATE_INFO,
                vec![
                    u32f(mep_create::INSTANCE, 1),
                    u32f(mep_create::DOMAIN, 0),
                    u32f(mep_create::DIRECTION, 0),
                    u16f(mep_create::VID, 0),
                    u32f(mep_create::IFINDEX, 2),
                ],
            ),
        ]);

        let report = parse_config_report(&msg).unwrap();
        assert!(report.creates.is_empty());
    }
}
