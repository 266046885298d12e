//! Continuity-check commands.

use clap::Args;
use cfmlink::netlink::cfm::{CcCcmTx, CcConfig};
use cfmlink::netlink::types::cfm::{CcmInterval, Maid};
use cfmlink::netlink::{Connection, Result};
use cfmlink::util::{MacAddr, get_ifindex};

#[derive(Args)]
pub struct CcConfigArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// MEP instance number
    #[arg(long)]
    instance: u32,

    /// Enable (1) or disable (0) CCM reception checking
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    enable: u8,

    /// Expected CCM interval (3ms3|10ms|100ms|1s|10s|1m|10m)
    #[arg(long)]
    interval: CcmInterval,

    /// Expected CCM priority
    #[arg(long, default_value_t = 0)]
    priority: u32,

    /// Expected MAID name (up to 45 characters)
    #[arg(long)]
    maid: String,
}

impl CcConfigArgs {
    pub async fn run(self, conn: &Connection) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;
        let maid = Maid::new(&self.maid)?;

        conn.cfm_cc_config(
            bridge,
            &CcConfig {
                instance: self.instance,
                enable: self.enable != 0,
                interval: self.interval,
                priority: self.priority,
                maid,
            },
        )
        .await
    }
}

#[derive(Args)]
pub struct CcPeerArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// MEP instance number
    #[arg(long)]
    instance: u32,

    /// Peer MEP ID
    #[arg(long)]
    mepid: u32,

    /// Remove the peer instead of adding it
    #[arg(long)]
    remove: bool,
}

impl CcPeerArgs {
    pub async fn run(self, conn: &Connection) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;
        if self.remove {
            conn.cfm_cc_peer_remove(bridge, self.instance, self.mepid)
                .await
        } else {
            conn.cfm_cc_peer_add(bridge, self.instance, self.mepid).await
        }
    }
}

#[derive(Args)]
pub struct CcRdiArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// MEP instance number
    #[arg(long)]
    instance: u32,

    /// Set (1) or clear (0) the RDI flag
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    rdi: u8,
}

impl CcRdiArgs {
    pub async fn run(self, conn: &Connection) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;
        conn.cfm_cc_rdi(bridge, self.instance, self.rdi != 0).await
    }
}

#[derive(Args)]
pub struct CcCcmTxArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// MEP instance number
    #[arg(long)]
    instance: u32,

    /// Destination MAC of transmitted CCMs (XX-XX-XX-XX-XX-XX)
    #[arg(long)]
    dmac: MacAddr,

    /// Update the sequence number on each frame (1) or not (0)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    sequence: u8,

    /// Transmission period in seconds; 0 stops transmission
    #[arg(long)]
    period: u32,

    /// Include an interface status TLV (1) or not (0)
    #[arg(long = "if-tlv", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    if_tlv: u8,

    /// Interface status TLV value
    #[arg(long = "if-tlv-value", default_value_t = 0)]
    if_tlv_value: u8,

    /// Include a port status TLV (1) or not (0)
    #[arg(long = "port-tlv", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    port_tlv: u8,

    /// Port status TLV value
    #[arg(long = "port-tlv-value", default_value_t = 0)]
    port_tlv_value: u8,
}

impl CcCcmTxArgs {
    pub async fn run(self, conn: &Connection) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;

        conn.cfm_cc_ccm_tx(
            bridge,
            &CcCcmTx {
                instance: self.instance,
                dmac: self.dmac,
                seq_no_update: self.sequence != 0,
                period: self.period,
                if_tlv: self.if_tlv != 0,
                if_tlv_value: self.if_tlv_value,
                port_tlv: self.port_tlv != 0,
                port_tlv_value: self.port_tlv_value,
            },
        )
        .await
    }
}

#[derive(Args)]
pub struct CcCntClearArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// MEP instance number
    #[arg(long)]
    instance: u32,
}

impl CcCntClearArgs {
    pub async fn run(self, conn: &Connection) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;
        conn.cfm_cc_cnt_clear(bridge, self.instance).await
    }
}
