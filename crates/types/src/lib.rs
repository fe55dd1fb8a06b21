//! Core type definitions for the query escrow engine.
//!
//! This crate provides the shared data structures used across the escrow
//! system: account and query identifiers, database manifests, votes, pending
//! query records and scheduled payments.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

// =========================
// SCALARS
// =========================

/// Database identifier, assigned sequentially by the registry.
pub type DbId = u64;

/// Logical clock value (block height).
pub type Height = u64;

/// Monetary amount in the smallest indivisible unit.
pub type Money = u128;

/// Basis points (1/100th of a percent).
pub type Bips = u16;

/// Denominator for basis-point arithmetic.
pub const BIPS_DENOMINATOR: Money = 10_000;

/// Largest valid basis-point rate (100%).
pub const MAX_BIPS: Bips = 10_000;

/// One whole token expressed in base units (24 decimals).
pub const ONE_TOKEN: Money = 1_000_000_000_000_000_000_000_000;

// =========================
// IDENTIFIERS
// =========================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Debug,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            BorshSerialize,
            BorshDeserialize,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Account name of a user, host, database owner or the privileged operator.
    AccountId
);

string_id!(
    /// Content identifier of a query.
    QueryId
);

string_id!(
    /// Content identifier of a query result claimed by a host.
    ResultId
);

/// Composite key of a query within a database.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct QueryKey {
    pub db: DbId,
    pub qid: QueryId,
}

impl QueryKey {
    pub fn new(db: DbId, qid: impl Into<QueryId>) -> Self {
        Self {
            db,
            qid: qid.into(),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.db, self.qid)
    }
}

// =========================
// DATABASE REGISTRY
// =========================

/// Database manifest as published by its developer.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Manifest {
    /// Author account; defaults to the deployer when empty
    pub author: AccountId,
    pub name: String,
    pub license: String,
    /// Content identifier of the database code
    pub code_cid: String,
    /// Royalty paid to the owner on every settled fee
    pub royalty_bips: Bips,
}

/// A registered database.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct DatabaseRecord {
    pub id: DbId,
    /// Receives royalties
    pub owner: AccountId,
    pub manifest: Manifest,
    /// Storage fee attached at deployment
    pub storage_deposit: Money,
}

// =========================
// SETTLEMENT RECORDS
// =========================

/// A host's claim that a query produced a given result.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Vote {
    pub account: AccountId,
    pub result: ResultId,
}

impl Vote {
    pub fn new(account: impl Into<AccountId>, result: impl Into<ResultId>) -> Self {
        Self {
            account: account.into(),
            result: result.into(),
        }
    }
}

/// Escrowed fee and expiry of a query awaiting settlement.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct PendingQuery {
    /// Sum of all fee payments received for the query
    pub fee: Money,
    /// Height at which the query stops accepting results
    pub deadline: Height,
}

impl PendingQuery {
    /// True when the deadline has been reached.
    pub fn is_expired(&self, now: Height) -> bool {
        now >= self.deadline
    }
}

/// Earnings waiting to be claimed by an account.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SettledBalance {
    pub fees: Money,
    pub royalties: Money,
}

impl SettledBalance {
    /// Sum of fees and royalties, `None` on overflow.
    pub fn total(&self) -> Option<Money> {
        self.fees.checked_add(self.royalties)
    }

    pub fn is_zero(&self) -> bool {
        self.fees == 0 && self.royalties == 0
    }
}

/// Why a payment was scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum PaymentReason {
    /// Security deposit returned on withdrawal
    StakeWithdrawal,
    /// Settled fees and royalties claimed
    Claim,
    /// Slashed funds recovered by the operator
    Recovery,
}

/// A fire-and-forget value transfer decided by the engine.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Payment {
    pub to: AccountId,
    pub amount: Money,
    pub reason: PaymentReason,
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Derive the content identifier of a query text (hex SHA-256).
pub fn query_id_for(query: &str) -> QueryId {
    QueryId(hex::encode(sha256(query.as_bytes())))
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).into()
}
