//! MRP ring instance commands.

use clap::Args;
use cfmlink::netlink::mrp::MrpInstance;
use cfmlink::netlink::{Connection, Result};
use cfmlink::util::get_ifindex;

#[derive(Args)]
pub struct MrpInstanceArgs {
    /// Bridge device
    #[arg(long)]
    bridge: String,

    /// Ring identifier
    #[arg(long = "ring-id")]
    ring_id: u32,

    /// Primary ring port device
    #[arg(long = "p-port")]
    p_port: String,

    /// Secondary ring port device
    #[arg(long = "s-port")]
    s_port: String,

    /// Ring manager priority
    #[arg(long, default_value_t = 0x8000)]
    prio: u16,
}

impl MrpInstanceArgs {
    pub async fn run(self, conn: &Connection, delete: bool) -> Result<()> {
        let bridge = get_ifindex(&self.bridge)?;
        let instance = MrpInstance {
            ring_id: self.ring_id,
            p_ifindex: get_ifindex(&self.p_port)?,
            s_ifindex: get_ifindex(&self.s_port)?,
            prio: self.prio,
        };

        if delete {
            conn.mrp_instance_del(bridge, &instance).await
        } else {
            conn.mrp_instance_add(bridge, &instance).await
        }
    }
}
