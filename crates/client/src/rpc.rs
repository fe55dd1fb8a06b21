//! Typed client for the mock chain RPC.

use escrow_mock_chain::types::{
    Amount, BlockInfo, ClaimRpc, DatabaseRpc, FinalizedQueryRpc, PaymentRpc, PendingQueryRpc,
};
use escrow_mock_chain::{EscrowApiClient, PRECONDITION_FAILED_CODE};
use escrow_types::{
    query_id_for, AccountId, DbId, Height, Manifest, Money, QueryId, QueryKey, ResultId,
    SettledBalance, Vote,
};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use thiserror::Error;

/// Errors returned by [`EscrowClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The module rejected the call; nothing changed on chain.
    #[error("Call rejected: {0}")]
    Rejected(String),

    #[error("Chain error {code}: {message}")]
    Chain { code: i32, message: String },

    #[error(transparent)]
    Transport(jsonrpsee::core::ClientError),
}

impl From<jsonrpsee::core::ClientError> for ClientError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        match e {
            jsonrpsee::core::ClientError::Call(obj) if obj.code() == PRECONDITION_FAILED_CODE => {
                ClientError::Rejected(obj.message().to_string())
            }
            jsonrpsee::core::ClientError::Call(obj) => ClientError::Chain {
                code: obj.code(),
                message: obj.message().to_string(),
            },
            other => ClientError::Transport(other),
        }
    }
}

impl ClientError {
    /// True when the call failed a precondition and may succeed later.
    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientError::Rejected(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Client for the escrow module behind a mock chain endpoint.
#[derive(Clone, Debug)]
pub struct EscrowClient {
    inner: HttpClient,
}

impl EscrowClient {
    /// Connect to an RPC endpoint such as `http://127.0.0.1:9944`.
    pub fn new(endpoint: &str) -> Result<Self> {
        let inner = HttpClientBuilder::default().build(endpoint)?;
        Ok(Self { inner })
    }

    /// The underlying JSON-RPC client.
    pub fn rpc(&self) -> &HttpClient {
        &self.inner
    }

    pub async fn block_info(&self) -> Result<BlockInfo> {
        Ok(self.inner.chain_get_block_info().await?)
    }

    pub async fn advance_blocks(&self, blocks: u64) -> Result<BlockInfo> {
        Ok(self.inner.admin_advance_blocks(blocks).await?)
    }

    pub async fn deploy(&self, sender: &AccountId, storage_fee: Money, manifest: Manifest) -> Result<DbId> {
        Ok(self
            .inner
            .escrow_deploy(sender.to_string(), Amount(storage_fee), manifest)
            .await?)
    }

    pub async fn register_api(&self, sender: &AccountId, db: DbId, uri: &str) -> Result<()> {
        self.inner
            .escrow_register_api(sender.to_string(), db, uri.to_string())
            .await?;
        Ok(())
    }

    /// Add to the sender's deposit and return the new deposit.
    pub async fn stake(&self, sender: &AccountId, db: DbId, amount: Money) -> Result<Money> {
        let balance = self
            .inner
            .escrow_stake(sender.to_string(), db, Amount(amount))
            .await?;
        Ok(balance.0)
    }

    /// Withdraw the sender's whole deposit and return the amount.
    pub async fn withdraw_stake(&self, sender: &AccountId, db: DbId) -> Result<Money> {
        let amount = self.inner.escrow_withdraw_stake(sender.to_string(), db).await?;
        Ok(amount.0)
    }

    /// Escrow a fee and return the query's accumulated fee.
    pub async fn escrow_fee(
        &self,
        sender: &AccountId,
        db: DbId,
        qid: &QueryId,
        amount: Money,
        deadline: Height,
    ) -> Result<Money> {
        let total = self
            .inner
            .escrow_escrow_fee(sender.to_string(), db, qid.to_string(), Amount(amount), deadline)
            .await?;
        Ok(total.0)
    }

    /// Escrow a fee for a query given by its text; returns the derived query id.
    pub async fn escrow_fee_for_query(
        &self,
        sender: &AccountId,
        db: DbId,
        query: &str,
        amount: Money,
        deadline: Height,
    ) -> Result<(QueryId, Money)> {
        let qid = query_id_for(query);
        let total = self.escrow_fee(sender, db, &qid, amount, deadline).await?;
        Ok((qid, total))
    }

    /// Vote for a result and return the query deadline.
    pub async fn submit_result(
        &self,
        sender: &AccountId,
        db: DbId,
        qid: &QueryId,
        result: &ResultId,
    ) -> Result<Height> {
        Ok(self
            .inner
            .escrow_submit_result(sender.to_string(), db, qid.to_string(), result.to_string())
            .await?)
    }

    pub async fn claim(&self, sender: &AccountId) -> Result<ClaimRpc> {
        Ok(self.inner.escrow_claim(sender.to_string()).await?)
    }

    pub async fn finalize(&self, sender: &AccountId) -> Result<Vec<FinalizedQueryRpc>> {
        Ok(self.inner.escrow_finalize(sender.to_string()).await?)
    }

    pub async fn recover(&self, sender: &AccountId, amount: Money, target: &AccountId) -> Result<Money> {
        let amount = self
            .inner
            .escrow_recover(sender.to_string(), Amount(amount), target.to_string())
            .await?;
        Ok(amount.0)
    }

    pub async fn database(&self, db: DbId) -> Result<Option<DatabaseRpc>> {
        Ok(self.inner.query_get_database(db).await?)
    }

    pub async fn databases(&self, offset: u64, limit: u64) -> Result<Vec<DatabaseRpc>> {
        Ok(self.inner.query_list_databases(offset, limit).await?)
    }

    pub async fn discover(&self, db: DbId) -> Result<Vec<String>> {
        Ok(self.inner.query_discover(db).await?)
    }

    pub async fn deposit_of(&self, db: DbId, account: &AccountId) -> Result<Money> {
        Ok(self.inner.query_get_deposit(db, account.to_string()).await?.0)
    }

    pub async fn pending_fee(&self, db: DbId, qid: &QueryId) -> Result<Money> {
        Ok(self.inner.query_get_pending_fee(db, qid.to_string()).await?.0)
    }

    pub async fn pending_query(&self, db: DbId, qid: &QueryId) -> Result<Option<PendingQueryRpc>> {
        Ok(self.inner.query_get_pending_query(db, qid.to_string()).await?)
    }

    pub async fn votes_for(&self, db: DbId, qid: &QueryId) -> Result<Vec<Vote>> {
        Ok(self.inner.query_get_votes(db, qid.to_string()).await?)
    }

    pub async fn settled_balance(&self, account: &AccountId) -> Result<SettledBalance> {
        let balance = self.inner.query_get_settled_balance(account.to_string()).await?;
        Ok(SettledBalance {
            fees: balance.fees.0,
            royalties: balance.royalties.0,
        })
    }

    pub async fn slashed_pool(&self) -> Result<Money> {
        Ok(self.inner.query_get_slashed_pool().await?.0)
    }

    pub async fn expired_queries(&self) -> Result<Vec<QueryKey>> {
        Ok(self.inner.query_get_expired_queries().await?)
    }

    pub async fn transfers(&self, account: Option<&AccountId>) -> Result<Vec<PaymentRpc>> {
        Ok(self
            .inner
            .query_get_transfers(account.map(|a| a.to_string()))
            .await?)
    }
}
