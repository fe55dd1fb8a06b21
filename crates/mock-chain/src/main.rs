//! Mock chain server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use escrow_mock_chain::{start_server, MockChainServer};
use escrow_module::EscrowGenesisConfig;

#[derive(Parser)]
#[command(name = "escrow-mock-chain")]
#[command(about = "Mock chain hosting the query escrow module")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Genesis config (JSON); defaults apply when omitted
    #[arg(long)]
    genesis: Option<PathBuf>,
}

fn load_genesis(path: Option<&PathBuf>) -> Result<EscrowGenesisConfig> {
    let Some(path) = path else {
        return Ok(EscrowGenesisConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read genesis file {}", path.display()))?;
    let config: EscrowGenesisConfig =
        serde_json::from_str(&raw).context("Failed to parse genesis config")?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("escrow_mock_chain=info".parse()?)
                .add_directive("escrow_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_genesis(cli.genesis.as_ref())?;
    info!(
        "Genesis: owner {}, min stake {}, settle window {} blocks, slash {:?}",
        config.owner, config.min_stake, config.settle_window, config.minority_slash
    );

    let (_, handle) = start_server(cli.listen, MockChainServer::new(config)?).await?;

    info!("Mock chain server running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
