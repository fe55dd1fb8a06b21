//! RPC server hosting one escrow module instance.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use jsonrpsee::core::async_trait;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::error::{INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE};
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use tracing::{error, info};

use escrow_module::{
    handlers, queries, CallContext, CallOutput, EscrowCall, EscrowError, EscrowGenesisConfig,
    EscrowState, PaymentLog,
};
use escrow_types::{AccountId, DbId, Height, Manifest, Money, QueryKey, Vote};

use crate::api::EscrowApiServer;
use crate::types::*;

/// Error code for rejected calls.
pub const PRECONDITION_FAILED_CODE: i32 = -32000;

/// Shared chain state.
pub struct ChainState {
    /// Module state
    pub module: EscrowState,
    /// Current block height (simulated)
    pub block_height: Height,
    /// Every transfer the module scheduled
    pub transfers: PaymentLog,
}

impl ChainState {
    pub fn new(config: EscrowGenesisConfig) -> Result<Self> {
        Ok(Self {
            module: EscrowState::from_genesis(config)?,
            block_height: 0,
            transfers: PaymentLog::new(),
        })
    }

    pub fn advance_blocks(&mut self, blocks: u64) {
        self.block_height = self.block_height.saturating_add(blocks);
    }

    /// Execute one call at the current height.
    pub fn apply(
        &mut self,
        sender: AccountId,
        value: Money,
        call: EscrowCall,
    ) -> Result<CallOutput, EscrowError> {
        let ctx = CallContext {
            sender,
            block_height: self.block_height,
            value,
        };
        handlers::execute(&mut self.module, &ctx, call, &mut self.transfers)
    }
}

/// Implementation of the mock chain RPC server.
#[derive(Clone)]
pub struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    pub fn new(config: EscrowGenesisConfig) -> Result<Self> {
        Ok(Self {
            state: Arc::new(RwLock::new(ChainState::new(config)?)),
        })
    }

    /// Shared handle to the chain state.
    pub fn state(&self) -> Arc<RwLock<ChainState>> {
        self.state.clone()
    }

    fn call(&self, sender: String, value: Money, call: EscrowCall) -> Result<CallOutput, ErrorObjectOwned> {
        let sender = parse_account(sender)?;
        self.state
            .write()
            .apply(sender, value, call)
            .map_err(rpc_error)
    }
}

/// Start serving `server` on `addr`.
pub async fn start_server(addr: SocketAddr, server: MockChainServer) -> Result<(SocketAddr, ServerHandle)> {
    let rpc = Server::builder().build(addr).await?;
    let local_addr = rpc.local_addr()?;
    let handle = rpc.start(server.into_rpc());
    info!("Mock chain listening on {}", local_addr);
    Ok((local_addr, handle))
}

/// Map a module error to a JSON-RPC error.
pub fn rpc_error(e: EscrowError) -> ErrorObjectOwned {
    if e.is_fatal() {
        error!("Invariant violation: {}", e);
        ErrorObjectOwned::owned(INTERNAL_ERROR_CODE, e.to_string(), None::<()>)
    } else {
        ErrorObjectOwned::owned(PRECONDITION_FAILED_CODE, e.to_string(), None::<()>)
    }
}

fn invalid_params(msg: &str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(INVALID_PARAMS_CODE, msg.to_string(), None::<()>)
}

fn parse_account(s: String) -> Result<AccountId, ErrorObjectOwned> {
    let s = s.trim();
    if s.is_empty() {
        return Err(invalid_params("Account id must not be empty"));
    }
    Ok(AccountId::from(s))
}

fn unexpected(output: CallOutput) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        INTERNAL_ERROR_CODE,
        format!("Unexpected call output: {:?}", output),
        None::<()>,
    )
}

#[async_trait]
impl EscrowApiServer for MockChainServer {
    async fn admin_advance_blocks(&self, blocks: u64) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.advance_blocks(blocks);
        Ok(BlockInfo {
            height: state.block_height,
        })
    }

    async fn escrow_deploy(
        &self,
        sender: String,
        storage_fee: Amount,
        manifest: Manifest,
    ) -> Result<DbId, ErrorObjectOwned> {
        match self.call(sender, storage_fee.0, EscrowCall::Deploy { manifest })? {
            CallOutput::Deployed(db) => Ok(db),
            other => Err(unexpected(other)),
        }
    }

    async fn escrow_register_api(
        &self,
        sender: String,
        db: DbId,
        uri: String,
    ) -> Result<bool, ErrorObjectOwned> {
        self.call(sender, 0, EscrowCall::RegisterApi { db, uri })?;
        Ok(true)
    }

    async fn escrow_stake(
        &self,
        sender: String,
        db: DbId,
        amount: Amount,
    ) -> Result<Amount, ErrorObjectOwned> {
        match self.call(sender, amount.0, EscrowCall::Stake { db })? {
            CallOutput::Staked { balance } => Ok(balance.into()),
            other => Err(unexpected(other)),
        }
    }

    async fn escrow_withdraw_stake(
        &self,
        sender: String,
        db: DbId,
    ) -> Result<Amount, ErrorObjectOwned> {
        match self.call(sender, 0, EscrowCall::WithdrawStake { db })? {
            CallOutput::Withdrawn { amount } => Ok(amount.into()),
            other => Err(unexpected(other)),
        }
    }

    async fn escrow_escrow_fee(
        &self,
        sender: String,
        db: DbId,
        qid: String,
        amount: Amount,
        deadline: u64,
    ) -> Result<Amount, ErrorObjectOwned> {
        let call = EscrowCall::EscrowFee {
            db,
            qid: qid.into(),
            deadline,
        };
        match self.call(sender, amount.0, call)? {
            CallOutput::FeeEscrowed { total } => Ok(total.into()),
            other => Err(unexpected(other)),
        }
    }

    async fn escrow_submit_result(
        &self,
        sender: String,
        db: DbId,
        qid: String,
        result: String,
    ) -> Result<u64, ErrorObjectOwned> {
        let call = EscrowCall::SubmitResult {
            db,
            qid: qid.into(),
            result: result.into(),
        };
        match self.call(sender, 0, call)? {
            CallOutput::ResultSubmitted { deadline } => Ok(deadline),
            other => Err(unexpected(other)),
        }
    }

    async fn escrow_claim(&self, sender: String) -> Result<ClaimRpc, ErrorObjectOwned> {
        match self.call(sender, 0, EscrowCall::Claim)? {
            CallOutput::Claimed { amount, settled } => Ok(ClaimRpc {
                amount: amount.into(),
                settled: settled.iter().map(FinalizedQueryRpc::from).collect(),
            }),
            other => Err(unexpected(other)),
        }
    }

    async fn escrow_finalize(
        &self,
        sender: String,
    ) -> Result<Vec<FinalizedQueryRpc>, ErrorObjectOwned> {
        match self.call(sender, 0, EscrowCall::Finalize)? {
            CallOutput::Finalized(settled) => {
                if !settled.is_empty() {
                    info!("Finalized {} queries", settled.len());
                }
                Ok(settled.iter().map(FinalizedQueryRpc::from).collect())
            }
            other => Err(unexpected(other)),
        }
    }

    async fn escrow_recover(
        &self,
        sender: String,
        amount: Amount,
        target: String,
    ) -> Result<Amount, ErrorObjectOwned> {
        let call = EscrowCall::Recover {
            amount: amount.0,
            target: parse_account(target)?,
        };
        match self.call(sender, 0, call)? {
            CallOutput::Recovered { amount } => Ok(amount.into()),
            other => Err(unexpected(other)),
        }
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(BlockInfo {
            height: state.block_height,
        })
    }

    async fn query_get_database(&self, db: DbId) -> Result<Option<DatabaseRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.module.registry.get(db).map(DatabaseRpc::from))
    }

    async fn query_list_databases(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<DatabaseRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .module
            .registry
            .databases()
            .skip(offset as usize)
            .take(limit as usize)
            .map(DatabaseRpc::from)
            .collect())
    }

    async fn query_discover(&self, db: DbId) -> Result<Vec<String>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.module.registry.discover(db))
    }

    async fn query_get_deposit(&self, db: DbId, account: String) -> Result<Amount, ErrorObjectOwned> {
        let account = parse_account(account)?;
        let state = self.state.read();
        Ok(state.module.deposit_of(db, &account).into())
    }

    async fn query_get_pending_fee(&self, db: DbId, qid: String) -> Result<Amount, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.module.pending_fee(&QueryKey::new(db, qid)).into())
    }

    async fn query_get_pending_query(
        &self,
        db: DbId,
        qid: String,
    ) -> Result<Option<PendingQueryRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .module
            .pending_query(&QueryKey::new(db, qid))
            .map(PendingQueryRpc::from))
    }

    async fn query_get_votes(&self, db: DbId, qid: String) -> Result<Vec<Vote>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.module.votes_for(&QueryKey::new(db, qid)))
    }

    async fn query_get_settled_balance(
        &self,
        account: String,
    ) -> Result<SettledBalanceRpc, ErrorObjectOwned> {
        let account = parse_account(account)?;
        let state = self.state.read();
        Ok(state.module.settled_balance(&account).into())
    }

    async fn query_get_slashed_pool(&self) -> Result<Amount, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.module.slashed_pool.into())
    }

    async fn query_get_expired_queries(&self) -> Result<Vec<QueryKey>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_pending_settlement(&state.module, state.block_height))
    }

    async fn query_get_transfers(
        &self,
        account: Option<String>,
    ) -> Result<Vec<PaymentRpc>, ErrorObjectOwned> {
        let account = account.map(parse_account).transpose()?;
        let state = self.state.read();
        Ok(state
            .transfers
            .payments
            .iter()
            .filter(|p| account.as_ref().map_or(true, |a| &p.to == a))
            .map(PaymentRpc::from)
            .collect())
    }
}
