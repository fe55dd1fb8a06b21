//! Call message types for the escrow module.

use escrow_types::{AccountId, DbId, Height, Manifest, Money, QueryId, ResultId};
use borsh::{BorshDeserialize, BorshSerialize};

/// Call messages for the escrow module.
///
/// Value attached to the transaction (deposit, fee, storage) travels in the
/// call context, not in the message.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum EscrowCall {
    // === Registry ===
    /// Register a new database; attached value pays for storage.
    Deploy { manifest: Manifest },

    /// Advertise (or with an empty uri, remove) the caller's API endpoint.
    RegisterApi { db: DbId, uri: String },

    // === Deposits ===
    /// Lock or top up the caller's security deposit with the attached value.
    Stake { db: DbId },

    /// Return the caller's whole deposit and drop its listing.
    WithdrawStake { db: DbId },

    // === Queries ===
    /// Escrow the attached value as fee for a query.
    EscrowFee {
        db: DbId,
        qid: QueryId,
        deadline: Height,
    },

    /// Claim that a query produced `result`.
    SubmitResult {
        db: DbId,
        qid: QueryId,
        result: ResultId,
    },

    // === Settlement ===
    /// Settle expired queries, then pay out the caller's earnings.
    Claim,

    /// Settle expired queries.
    Finalize,

    /// Move slashed funds to `target` (owner only).
    Recover { amount: Money, target: AccountId },
}
