//! cfm - Bridge CFM/MRP offload configuration tool.
//!
//! Configures 802.1ag/Y.1731 Maintenance End Points and MRP ring
//! instances in the Linux bridge driver over rtnetlink, and monitors the
//! driver's CFM event notifications.

mod commands;

use clap::{Parser, Subcommand};
use cfmlink::netlink::{Connection, Result};
use tracing_subscriber::EnvFilter;

use commands::cc::{CcCcmTxArgs, CcCntClearArgs, CcConfigArgs, CcPeerArgs, CcRdiArgs};
use commands::mep::{
    MepConfigArgs, MepConfigShowArgs, MepCntClearArgs, MepCreateArgs, MepDeleteArgs,
    MepStatusShowArgs,
};
use commands::monitor::MonitorArgs;
use commands::mrp::MrpInstanceArgs;

#[derive(Parser)]
#[command(name = "cfm")]
#[command(about = "Bridge CFM/MRP offload configuration tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Output JSON
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Pretty print JSON
    #[arg(short = 'p', long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a MEP instance
    MepCreate(MepCreateArgs),
    /// Delete a MEP instance
    MepDelete(MepDeleteArgs),
    /// Configure a MEP instance
    MepConfig(MepConfigArgs),
    /// Configure continuity checking
    CcConfig(CcConfigArgs),
    /// Add or remove a monitored peer MEP
    CcPeer(CcPeerArgs),
    /// Set or clear the RDI flag in transmitted CCMs
    CcRdi(CcRdiArgs),
    /// Configure CCM frame transmission
    CcCcmTx(CcCcmTxArgs),
    /// Clear MEP status counters
    MepCntClear(MepCntClearArgs),
    /// Clear continuity-check counters
    CcCntClear(CcCntClearArgs),
    /// Show MEP status counters
    MepStatusShow(MepStatusShowArgs),
    /// Show MEP configuration
    MepConfigShow(MepConfigShowArgs),
    /// Add an MRP ring instance
    MrpInstanceAdd(MrpInstanceArgs),
    /// Delete an MRP ring instance
    MrpInstanceDel(MrpInstanceArgs),
    /// Monitor CFM events
    Monitor(MonitorArgs),
}

/// JSON rendering options shared by the show/monitor commands.
#[derive(Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub pretty: bool,
}

async fn run(cli: Cli) -> Result<()> {
    let opts = OutputOptions {
        json: cli.json,
        pretty: cli.pretty,
    };

    // The monitor holds its own subscribed socket; every other command
    // performs exactly one request/reply exchange on a fresh connection.
    match cli.command {
        Command::Monitor(args) => args.run(opts).await,
        command => {
            let conn = Connection::new()?;
            match command {
                Command::MepCreate(args) => args.run(&conn).await,
                Command::MepDelete(args) => args.run(&conn).await,
                Command::MepConfig(args) => args.run(&conn).await,
                Command::CcConfig(args) => args.run(&conn).await,
                Command::CcPeer(args) => args.run(&conn).await,
                Command::CcRdi(args) => args.run(&conn).await,
                Command::CcCcmTx(args) => args.run(&conn).await,
                Command::MepCntClear(args) => args.run(&conn).await,
                Command::CcCntClear(args) => args.run(&conn).await,
                Command::MepStatusShow(args) => args.run(&conn, opts).await,
                Command::MepConfigShow(args) => args.run(&conn, opts).await,
                Command::MrpInstanceAdd(args) => args.run(&conn, false).await,
                Command::MrpInstanceDel(args) => args.run(&conn, true).await,
                Command::Monitor(_) => unreachable!(),
            }
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("cfm: {}", e);
            if e.is_permission_denied() {
                eprintln!("cfm: configuring bridge offload requires CAP_NET_ADMIN");
            }
            std::process::ExitCode::FAILURE
        }
    }
}
