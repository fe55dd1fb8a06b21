//! JSON-RPC API of the mock chain.
//!
//! The macro generates both `EscrowApiServer`, implemented by the mock
//! chain, and `EscrowApiClient`, used by the CLI and the keeper.

use escrow_types::{DbId, Manifest, QueryKey, Vote};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;

use crate::types::*;

/// RPC API definition for the mock chain.
///
/// Calls name their sender explicitly; there are no signatures.
#[rpc(server, client)]
pub trait EscrowApi {
    // ============ Admin Methods ============

    /// Advance the chain by `blocks` blocks.
    #[method(name = "admin_advanceBlocks")]
    async fn admin_advance_blocks(&self, blocks: u64) -> Result<BlockInfo, ErrorObjectOwned>;

    // ============ Escrow Methods ============

    /// Register a database, paying `storage_fee`.
    #[method(name = "escrow_deploy")]
    async fn escrow_deploy(
        &self,
        sender: String,
        storage_fee: Amount,
        manifest: Manifest,
    ) -> Result<DbId, ErrorObjectOwned>;

    /// Advertise an API endpoint (an empty uri removes it).
    #[method(name = "escrow_registerApi")]
    async fn escrow_register_api(
        &self,
        sender: String,
        db: DbId,
        uri: String,
    ) -> Result<bool, ErrorObjectOwned>;

    /// Add to the sender's deposit; returns the new deposit.
    #[method(name = "escrow_stake")]
    async fn escrow_stake(
        &self,
        sender: String,
        db: DbId,
        amount: Amount,
    ) -> Result<Amount, ErrorObjectOwned>;

    /// Withdraw the sender's whole deposit; returns the amount.
    #[method(name = "escrow_withdrawStake")]
    async fn escrow_withdraw_stake(
        &self,
        sender: String,
        db: DbId,
    ) -> Result<Amount, ErrorObjectOwned>;

    /// Escrow a fee for a query; returns the accumulated fee.
    #[method(name = "escrow_escrowFee")]
    async fn escrow_escrow_fee(
        &self,
        sender: String,
        db: DbId,
        qid: String,
        amount: Amount,
        deadline: u64,
    ) -> Result<Amount, ErrorObjectOwned>;

    /// Vote for a query result; returns the query deadline.
    #[method(name = "escrow_submitResult")]
    async fn escrow_submit_result(
        &self,
        sender: String,
        db: DbId,
        qid: String,
        result: String,
    ) -> Result<u64, ErrorObjectOwned>;

    /// Settle expired queries, then pay out the sender's earnings.
    #[method(name = "escrow_claim")]
    async fn escrow_claim(&self, sender: String) -> Result<ClaimRpc, ErrorObjectOwned>;

    /// Settle expired queries.
    #[method(name = "escrow_finalize")]
    async fn escrow_finalize(
        &self,
        sender: String,
    ) -> Result<Vec<FinalizedQueryRpc>, ErrorObjectOwned>;

    /// Move slashed funds to `target` (owner only).
    #[method(name = "escrow_recover")]
    async fn escrow_recover(
        &self,
        sender: String,
        amount: Amount,
        target: String,
    ) -> Result<Amount, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get database by ID.
    #[method(name = "query_getDatabase")]
    async fn query_get_database(&self, db: DbId) -> Result<Option<DatabaseRpc>, ErrorObjectOwned>;

    /// List databases.
    #[method(name = "query_listDatabases")]
    async fn query_list_databases(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<DatabaseRpc>, ErrorObjectOwned>;

    /// List API endpoints of a database.
    #[method(name = "query_discover")]
    async fn query_discover(&self, db: DbId) -> Result<Vec<String>, ErrorObjectOwned>;

    #[method(name = "query_getDeposit")]
    async fn query_get_deposit(&self, db: DbId, account: String) -> Result<Amount, ErrorObjectOwned>;

    #[method(name = "query_getPendingFee")]
    async fn query_get_pending_fee(&self, db: DbId, qid: String) -> Result<Amount, ErrorObjectOwned>;

    #[method(name = "query_getPendingQuery")]
    async fn query_get_pending_query(
        &self,
        db: DbId,
        qid: String,
    ) -> Result<Option<PendingQueryRpc>, ErrorObjectOwned>;

    #[method(name = "query_getVotes")]
    async fn query_get_votes(&self, db: DbId, qid: String) -> Result<Vec<Vote>, ErrorObjectOwned>;

    #[method(name = "query_getSettledBalance")]
    async fn query_get_settled_balance(
        &self,
        account: String,
    ) -> Result<SettledBalanceRpc, ErrorObjectOwned>;

    #[method(name = "query_getSlashedPool")]
    async fn query_get_slashed_pool(&self) -> Result<Amount, ErrorObjectOwned>;

    /// Get queries the next finalize would settle.
    #[method(name = "query_getExpiredQueries")]
    async fn query_get_expired_queries(&self) -> Result<Vec<QueryKey>, ErrorObjectOwned>;

    /// Get transfers scheduled so far, optionally only those to `account`.
    #[method(name = "query_getTransfers")]
    async fn query_get_transfers(
        &self,
        account: Option<String>,
    ) -> Result<Vec<PaymentRpc>, ErrorObjectOwned>;
}
