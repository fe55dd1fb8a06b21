//! Keeper binary.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use escrow_keeper::{KeeperConfig, KeeperService};

#[derive(Parser)]
#[command(name = "escrow-keeper")]
#[command(about = "Settles expired escrow queries")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    /// Account that sends finalize calls
    #[arg(long, default_value = "keeper.near")]
    account: String,

    /// Polling interval in seconds
    #[arg(long, default_value = "10")]
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("escrow_keeper=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let service = KeeperService::new(KeeperConfig {
        rpc_endpoint: cli.rpc,
        account: cli.account.into(),
        poll_interval_secs: cli.interval,
    })?;

    tokio::select! {
        result = service.start() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
    }

    Ok(())
}
