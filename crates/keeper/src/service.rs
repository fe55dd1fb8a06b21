//! Keeper service implementation.

use std::time::Duration;

use anyhow::Result;
use escrow_client::EscrowClient;
use escrow_mock_chain::types::FinalizedQueryRpc;
use escrow_types::AccountId;
use tracing::{debug, info, warn};

/// Configuration for the keeper service.
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    /// RPC endpoint of the chain
    pub rpc_endpoint: String,
    /// Account that sends finalize calls
    pub account: AccountId,
    /// Polling interval in seconds
    pub poll_interval_secs: u64,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "http://127.0.0.1:9944".to_string(),
            account: AccountId::from("keeper.near"),
            poll_interval_secs: 10,
        }
    }
}

/// The keeper service.
pub struct KeeperService {
    config: KeeperConfig,
    client: EscrowClient,
}

impl KeeperService {
    /// Create a new keeper service.
    pub fn new(config: KeeperConfig) -> Result<Self> {
        let client = EscrowClient::new(&config.rpc_endpoint)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    /// Poll until the process stops. Failed rounds are logged and retried
    /// on the next tick.
    pub async fn start(&self) -> Result<()> {
        let period = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            "Keeper {} polling {} every {:?}",
            self.config.account, self.config.rpc_endpoint, period
        );

        loop {
            interval.tick().await;
            if let Err(e) = self.run_once().await {
                warn!("Settlement round failed: {}", e);
            }
        }
    }

    /// Settle everything that has expired. Returns the settled queries.
    pub async fn run_once(&self) -> Result<Vec<FinalizedQueryRpc>> {
        let expired = self.client.expired_queries().await?;
        if expired.is_empty() {
            debug!("No expired queries");
            return Ok(Vec::new());
        }

        debug!("{} expired queries", expired.len());
        let settled = self.client.finalize(&self.config.account).await?;
        for f in &settled {
            info!(
                "Settled {}/{}: {} (fee {}, royalty {}, forfeited {})",
                f.db, f.qid, f.outcome, f.fee, f.royalty, f.forfeited
            );
        }
        Ok(settled)
    }
}
