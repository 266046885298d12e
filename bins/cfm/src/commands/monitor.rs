//! `cfm monitor` - watch for CFM events.

use clap::Args;
use cfmlink::netlink::Result;
use cfmlink::netlink::events::{CfmEvent, CfmEventStream};
use tokio::signal::unix::{SignalKind, signal};
use tokio_stream::StreamExt;
use tracing::info;

use crate::OutputOptions;

#[derive(Args)]
pub struct MonitorArgs {}

impl MonitorArgs {
    pub async fn run(self, opts: OutputOptions) -> Result<()> {
        let mut stream = CfmEventStream::new()?;
        let mut sigterm = signal(SignalKind::terminate())?;

        if !opts.json {
            eprintln!("Monitoring CFM events (Ctrl+C to stop)...");
        }

        // Tracks the last instance printed per event family so an
        // "Instance N" header appears only when the instance changes
        // between adjacent events.
        let mut printer = EventPrinter::new(opts);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = sigterm.recv() => break,
                event = stream.next() => match event {
                    Some(Ok(event)) => printer.print(&event)?,
                    Some(Err(e)) => return Err(e),
                    None => break,
                },
            }
        }

        // Shutdown: the in-flight decode above has completed, so just
        // stop reading and let the socket close with the stream.
        info!("monitor stopping");
        Ok(())
    }
}

struct EventPrinter {
    opts: OutputOptions,
    last_peer_instance: Option<u32>,
    last_mip_instance: Option<u32>,
}

impl EventPrinter {
    fn new(opts: OutputOptions) -> Self {
        Self {
            opts,
            last_peer_instance: None,
            last_mip_instance: None,
        }
    }

    fn print(&mut self, event: &CfmEvent) -> Result<()> {
        if self.opts.json {
            let output = if self.opts.pretty {
                serde_json::to_string_pretty(event)?
            } else {
                serde_json::to_string(event)?
            };
            println!("{}", output);
            return Ok(());
        }

        match event {
            CfmEvent::PeerDefect(ev) => {
                if self.last_peer_instance != Some(ev.instance) {
                    self.last_peer_instance = Some(ev.instance);
                    println!("EVENT CFM CC peer status:");
                    println!("Instance {}", ev.instance);
                }
                println!("    Peer-mep {}", ev.peer_mepid);
                println!("        CCM defect {}", ev.ccm_defect);
                println!();
            }
            CfmEvent::MipRaps(ev) => {
                if self.last_mip_instance != Some(ev.instance) {
                    self.last_mip_instance = Some(ev.instance);
                    println!("EVENT CFM MIP RAPS info:");
                    println!("Instance {}", ev.instance);
                }
                println!("    request {}", ev.request());
                println!("    sub_code {}", ev.sub_code());
                println!("    status {}", ev.status);
                println!("    Node-id {}", ev.node_id);
                println!();
            }
        }
        Ok(())
    }
}
