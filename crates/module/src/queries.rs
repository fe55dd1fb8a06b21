//! Query handlers for the escrow module.
//!
//! These functions provide read-only access to escrow state.

use escrow_types::{
    AccountId, DatabaseRecord, DbId, Height, Money, PendingQuery, QueryId, QueryKey,
    SettledBalance, Vote,
};
use serde::{Deserialize, Serialize};

use crate::genesis::EscrowGenesisConfig;
use crate::state::EscrowState;

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EscrowQuery {
    /// Get a database record by id.
    GetDatabase { db: DbId },

    /// List registered databases (paginated).
    ListDatabases { offset: u64, limit: u64 },

    /// List API endpoints advertised for a database.
    Discover { db: DbId },

    /// Get an account's deposit on a database.
    GetDeposit { db: DbId, account: AccountId },

    /// Get the accumulated fee of a pending query.
    GetPendingFee { db: DbId, qid: QueryId },

    /// Get fee and deadline of a pending query.
    GetPendingQuery { db: DbId, qid: QueryId },

    /// Get the votes cast for a pending query.
    GetVotes { db: DbId, qid: QueryId },

    /// Get an account's unclaimed earnings.
    GetSettledBalance { account: AccountId },

    /// Get the slashed pool total.
    GetSlashedPool,

    /// List queries whose deadline has passed at `height`.
    GetExpiredQueries { height: Height },

    /// Get the genesis configuration.
    GetConfig,
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EscrowQueryResponse {
    Database(Option<DatabaseRecord>),
    DatabaseList(Vec<DatabaseRecord>),
    Endpoints(Vec<String>),
    Deposit(Money),
    PendingFee(Money),
    PendingQuery(Option<PendingQuery>),
    Votes(Vec<Vote>),
    SettledBalance(SettledBalance),
    SlashedPool(Money),
    ExpiredQueries(Vec<QueryKey>),
    Config(EscrowGenesisConfig),
}

/// Handle a query.
pub fn handle_query(state: &EscrowState, query: EscrowQuery) -> EscrowQueryResponse {
    match query {
        EscrowQuery::GetDatabase { db } => {
            EscrowQueryResponse::Database(state.registry.get(db).cloned())
        }

        EscrowQuery::ListDatabases { offset, limit } => {
            let databases = state
                .registry
                .databases()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect();
            EscrowQueryResponse::DatabaseList(databases)
        }

        EscrowQuery::Discover { db } => EscrowQueryResponse::Endpoints(state.registry.discover(db)),

        EscrowQuery::GetDeposit { db, account } => {
            EscrowQueryResponse::Deposit(state.deposit_of(db, &account))
        }

        EscrowQuery::GetPendingFee { db, qid } => {
            EscrowQueryResponse::PendingFee(state.pending_fee(&QueryKey { db, qid }))
        }

        EscrowQuery::GetPendingQuery { db, qid } => {
            EscrowQueryResponse::PendingQuery(state.pending_query(&QueryKey { db, qid }).cloned())
        }

        EscrowQuery::GetVotes { db, qid } => {
            EscrowQueryResponse::Votes(state.votes_for(&QueryKey { db, qid }))
        }

        EscrowQuery::GetSettledBalance { account } => {
            EscrowQueryResponse::SettledBalance(state.settled_balance(&account))
        }

        EscrowQuery::GetSlashedPool => EscrowQueryResponse::SlashedPool(state.slashed_pool),

        EscrowQuery::GetExpiredQueries { height } => {
            EscrowQueryResponse::ExpiredQueries(state.expired_queries(height))
        }

        EscrowQuery::GetConfig => EscrowQueryResponse::Config(state.config.clone()),
    }
}

/// Summary of a pending query for listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySummary {
    pub key: QueryKey,
    pub fee: Money,
    pub deadline: Height,
    pub num_votes: usize,
    pub expired: bool,
}

/// Get all pending queries of a database with their vote counts.
pub fn get_open_queries(state: &EscrowState, db: DbId, current_height: Height) -> Vec<QuerySummary> {
    state
        .queries
        .iter()
        .filter(|(key, _)| key.db == db)
        .map(|(key, query)| QuerySummary {
            key: key.clone(),
            fee: query.fee,
            deadline: query.deadline,
            num_votes: state.votes.get(key).map(|v| v.len()).unwrap_or(0),
            expired: query.is_expired(current_height),
        })
        .collect()
}

/// Get queries that the next finalize call would settle.
pub fn get_pending_settlement(state: &EscrowState, current_height: Height) -> Vec<QueryKey> {
    state.expired_queries(current_height)
}
