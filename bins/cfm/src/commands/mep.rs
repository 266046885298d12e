//! MEP lifecycle and show commands.

use clap::Args;
use cfmlink::netlink::cfm::{CfmConfigReport, MepConfig, MepCreate, MepStatus};
use cfmlink::netlink::types::cfm::{Direction, Domain};
use cfmlink::netlink::{Connection, Result};
use cfmlink::util::{MacAddr, get_ifindex, get_ifname_or_index};

use crate::OutputOptions;

#[derive(Args)]
pub struct MepCreateArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// MEP instance number
    #[arg(long)]
    instance: u32,

    /// MEP domain (port|vlan)
    #[arg(long)]
    domain: Domain,

    /// MEP direction (up|down)
    #[arg(long)]
    direction: Direction,

    /// VLAN ID (for vlan-domain MEPs)
    #[arg(long, default_value_t = 0)]
    vid: u16,

    /// Residence port device
    #[arg(long)]
    port: String,
}

impl MepCreateArgs {
    pub async fn run(self, conn: &Connection) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;
        let port = get_ifindex(&self.port)?;

        conn.cfm_mep_create(
            bridge,
            &MepCreate {
                instance: self.instance,
                domain: self.domain,
                direction: self.direction,
                vid: self.vid,
                ifindex: port,
            },
        )
        .await
    }
}

#[derive(Args)]
pub struct MepDeleteArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// MEP instance number
    #[arg(long)]
    instance: u32,
}

impl MepDeleteArgs {
    pub async fn run(self, conn: &Connection) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;
        conn.cfm_mep_delete(bridge, self.instance).await
    }
}

#[derive(Args)]
pub struct MepConfigArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// MEP instance number
    #[arg(long)]
    instance: u32,

    /// Unicast MAC address (XX-XX-XX-XX-XX-XX)
    #[arg(long)]
    mac: MacAddr,

    /// Maintenance domain level (0-7)
    #[arg(long)]
    level: u32,

    /// This MEP's own MEP ID
    #[arg(long)]
    mepid: u32,

    /// VLAN ID
    #[arg(long, default_value_t = 0)]
    vid: u16,
}

impl MepConfigArgs {
    pub async fn run(self, conn: &Connection) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;

        conn.cfm_mep_config(
            bridge,
            &MepConfig {
                instance: self.instance,
                unicast_mac: self.mac,
                mdlevel: self.level,
                mepid: self.mepid,
                vid: self.vid,
            },
        )
        .await
    }
}

#[derive(Args)]
pub struct MepCntClearArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// MEP instance number
    #[arg(long)]
    instance: u32,
}

impl MepCntClearArgs {
    pub async fn run(self, conn: &Connection) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;
        conn.cfm_mep_cnt_clear(bridge, self.instance).await
    }
}

#[derive(Args)]
pub struct MepConfigShowArgs {}

impl MepConfigShowArgs {
    pub async fn run(self, conn: &Connection, opts: OutputOptions) -> Result<()> {
        let report = conn.cfm_mep_config_show().await?;

        if opts.json {
            print_json(&report, opts)?;
        } else {
            print_config_text(&report);
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct MepStatusShowArgs {}

impl MepStatusShowArgs {
    pub async fn run(self, conn: &Connection, opts: OutputOptions) -> Result<()> {
        let records = conn.cfm_mep_status_show().await?;

        if opts.json {
            print_json(&records, opts)?;
        } else {
            print_status_text(&records);
        }
        Ok(())
    }
}

fn print_json<T: serde::Serialize>(value: &T, opts: OutputOptions) -> Result<()> {
    let output = if opts.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

/// Render a domain/direction/interval code, falling back to the raw
/// number for codes this build does not know.
fn enum_or_raw<T: std::fmt::Display>(typed: Option<T>, raw: u32) -> String {
    match typed {
        Some(t) => t.to_string(),
        None => raw.to_string(),
    }
}

fn print_config_text(report: &CfmConfigReport) {
    println!("CFM MEP create:");
    for rec in &report.creates {
        println!("Instance {}", rec.instance);
        println!("Domain {}", enum_or_raw(rec.domain(), rec.domain));
        println!("Direction {}", enum_or_raw(rec.direction(), rec.direction));
        println!("Vid {}", rec.vid);
        println!("Ifindex {}", get_ifname_or_index(rec.ifindex));
        println!();
    }

    println!("CFM MEP config:");
    for rec in &report.configs {
        println!("Instance {}", rec.instance);
        println!("Unicast_mac {}", rec.unicast_mac);
        println!("Mdlevel {}", rec.mdlevel);
        println!("Mepid {}", rec.mepid);
        println!("Vid {}", rec.vid);
        println!();
    }

    println!("CFM CC config:");
    for rec in &report.cc_configs {
        println!("Instance {}", rec.instance);
        println!("Enable {}", rec.enable as u32);
        println!("Interval {}", enum_or_raw(rec.interval(), rec.interval));
        println!("Priority {}", rec.priority);
        println!("Maid {}", rec.maid);
        println!();
    }

    println!("CFM CC peer-meps:");
    for group in &report.peer_groups {
        println!("Instance {}", group.instance);
        for mepid in &group.mepids {
            println!("    Peer-mep {}", mepid);
        }
        println!();
    }
}

fn print_status_text(records: &[MepStatus]) {
    println!("CFM MEP status:");
    for rec in records {
        println!("Instance {}", rec.instance);
        println!("Opcode unexp seen {}", rec.opcode_unexp_seen);
        println!("Dmac unexp seen {}", rec.dmac_unexp_seen);
        println!("Tx level low seen {}", rec.tx_level_low_seen);
        println!("Version unexp seen {}", rec.version_unexp_seen);
        println!("Rx level low seen {}", rec.rx_level_low_seen);
        println!();
    }
}
