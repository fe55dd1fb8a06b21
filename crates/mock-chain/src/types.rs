//! RPC-compatible types for the mock chain.
//!
//! These are JSON versions of the escrow records. Every amount crosses the
//! wire as an [`Amount`], a decimal string, because 128-bit integers do not
//! survive JSON number parsing in most clients.

use std::fmt;
use std::str::FromStr;

use escrow_module::{FinalizedQuery, SettlementOutcome};
use escrow_types::{
    AccountId, DatabaseRecord, DbId, Height, Manifest, Money, Payment, PaymentReason,
    PendingQuery, QueryId, ResultId, SettledBalance,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Token amount encoded as a decimal string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub Money);

impl From<Money> for Amount {
    fn from(value: Money) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Money {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Amount)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Block info response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: Height,
}

/// Registered database for RPC responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRpc {
    pub id: DbId,
    pub owner: AccountId,
    pub manifest: Manifest,
    pub storage_deposit: Amount,
}

impl From<&DatabaseRecord> for DatabaseRpc {
    fn from(r: &DatabaseRecord) -> Self {
        Self {
            id: r.id,
            owner: r.owner.clone(),
            manifest: r.manifest.clone(),
            storage_deposit: r.storage_deposit.into(),
        }
    }
}

/// Pending query for RPC responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQueryRpc {
    pub fee: Amount,
    pub deadline: Height,
}

impl From<&PendingQuery> for PendingQueryRpc {
    fn from(q: &PendingQuery) -> Self {
        Self {
            fee: q.fee.into(),
            deadline: q.deadline,
        }
    }
}

/// Unclaimed earnings for RPC responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledBalanceRpc {
    pub fees: Amount,
    pub royalties: Amount,
}

impl From<SettledBalance> for SettledBalanceRpc {
    fn from(b: SettledBalance) -> Self {
        Self {
            fees: b.fees.into(),
            royalties: b.royalties.into(),
        }
    }
}

/// Scheduled transfer for RPC responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRpc {
    pub to: AccountId,
    pub amount: Amount,
    pub reason: PaymentReason,
}

impl From<&Payment> for PaymentRpc {
    fn from(p: &Payment) -> Self {
        Self {
            to: p.to.clone(),
            amount: p.amount.into(),
            reason: p.reason,
        }
    }
}

/// Settlement report for RPC responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedQueryRpc {
    pub db: DbId,
    pub qid: QueryId,
    pub fee: Amount,
    pub royalty: Amount,
    pub royalty_to: AccountId,
    /// "unfunded", "agreed" or "no_quorum"
    pub outcome: String,
    pub result: Option<ResultId>,
    pub payouts: Vec<(AccountId, Amount)>,
    pub slashed: Vec<(AccountId, Amount)>,
    pub dust: Amount,
    pub forfeited: Amount,
}

impl From<&FinalizedQuery> for FinalizedQueryRpc {
    fn from(f: &FinalizedQuery) -> Self {
        let (outcome, result) = match &f.outcome {
            SettlementOutcome::Unfunded => ("unfunded", None),
            SettlementOutcome::Agreed { result } => ("agreed", Some(result.clone())),
            SettlementOutcome::NoQuorum => ("no_quorum", None),
        };
        let amounts = |entries: &[(AccountId, Money)]| {
            entries
                .iter()
                .map(|(account, amount)| (account.clone(), Amount(*amount)))
                .collect()
        };
        Self {
            db: f.key.db,
            qid: f.key.qid.clone(),
            fee: f.fee.into(),
            royalty: f.royalty.into(),
            royalty_to: f.royalty_to.clone(),
            outcome: outcome.to_string(),
            result,
            payouts: amounts(&f.payouts),
            slashed: amounts(&f.slashed),
            dust: f.dust.into(),
            forfeited: f.forfeited.into(),
        }
    }
}

/// Result of a claim call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRpc {
    pub amount: Amount,
    pub settled: Vec<FinalizedQueryRpc>,
}
