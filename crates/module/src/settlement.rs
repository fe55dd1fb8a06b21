//! Settlement of expired queries.
//!
//! For every query whose deadline has been reached:
//!
//! 1. Pay the database owner `fee * royalty_bips / 10000`.
//! 2. Tally the votes. If a result holds a two-thirds supermajority, split
//!    the rest of the fee equally among its voters and slash everyone else.
//!    Each winner gets `fee * (10000 / winners) / 10000`; the rounding dust
//!    goes to the slashed pool.
//! 3. Without a supermajority (including no votes at all) the whole rest of
//!    the fee goes to the slashed pool and nobody is slashed.
//! 4. Delete the fee, the deadline and all votes of the query.
//!
//! A query with zero fee skips steps 1-3. The sweep runs against a staged
//! copy of the state: an invariant violation anywhere aborts the whole sweep
//! and leaves the state untouched. A purged query is gone from the expired
//! set, so running the sweep again settles nothing twice.

use escrow_types::{AccountId, Bips, Height, Money, QueryKey, ResultId, BIPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::collaborators::DatabaseRegistry;
use crate::election::Election;
use crate::error::{EscrowError, InvariantViolation};
use crate::state::{checked_add, checked_sub, EscrowState};

/// How a query's fee was resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    /// No fee was escrowed; state was only purged
    Unfunded,
    /// A supermajority agreed on a result
    Agreed { result: ResultId },
    /// No result reached two thirds; the fee was forfeited
    NoQuorum,
}

/// Accounting record of one settled query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedQuery {
    pub key: QueryKey,
    /// Fee escrowed for the query
    pub fee: Money,
    pub royalty: Money,
    pub royalty_to: AccountId,
    pub outcome: SettlementOutcome,
    /// Fee shares credited to supermajority voters
    pub payouts: Vec<(AccountId, Money)>,
    /// Deposit confiscated from minority voters
    pub slashed: Vec<(AccountId, Money)>,
    /// Rounding remainder of the equal split
    pub dust: Money,
    /// Fee sent to the slashed pool for lack of a supermajority
    pub forfeited: Money,
}

impl FinalizedQuery {
    fn new(key: QueryKey, fee: Money, royalty_to: AccountId) -> Self {
        Self {
            key,
            fee,
            royalty: 0,
            royalty_to,
            outcome: SettlementOutcome::Unfunded,
            payouts: Vec::new(),
            slashed: Vec::new(),
            dust: 0,
            forfeited: 0,
        }
    }

    /// Sum of every destination of the fee; equals `fee` for a sound settlement.
    pub fn distributed(&self) -> Option<Money> {
        self.payouts
            .iter()
            .try_fold(self.royalty, |acc, (_, share)| acc.checked_add(*share))?
            .checked_add(self.dust)?
            .checked_add(self.forfeited)
    }

    /// Total added to the slashed pool by this query.
    pub fn pooled(&self) -> Option<Money> {
        self.slashed
            .iter()
            .try_fold(self.dust, |acc, (_, amount)| acc.checked_add(*amount))?
            .checked_add(self.forfeited)
    }
}

/// Settle every query whose deadline is at or before `now`.
///
/// Either every expired query is settled or, on an invariant violation,
/// none is.
pub fn finalize_all(state: &mut EscrowState, now: Height) -> Result<Vec<FinalizedQuery>, EscrowError> {
    state.atomically(|staged| sweep(staged, now))
}

/// Settle expired queries in place. Callers must discard `state` on error.
pub(crate) fn sweep(state: &mut EscrowState, now: Height) -> Result<Vec<FinalizedQuery>, EscrowError> {
    let expired = state.expired_queries(now);
    if expired.is_empty() {
        return Ok(Vec::new());
    }

    debug!("Settling {} expired queries at height {}", expired.len(), now);

    let mut settled = Vec::with_capacity(expired.len());
    for key in expired {
        match finalize_query(state, &key) {
            Ok(record) => settled.push(record),
            Err(e) => {
                error!("Settlement of query {} aborted at height {}: {}", key, now, e);
                return Err(e.into());
            }
        }
    }
    Ok(settled)
}

fn finalize_query(
    state: &mut EscrowState,
    key: &QueryKey,
) -> Result<FinalizedQuery, InvariantViolation> {
    let owner = state
        .registry
        .owner_of(key.db)
        .cloned()
        .ok_or(InvariantViolation::UnknownDatabase(key.db))?;
    let royalty_bips = state
        .registry
        .royalty_bips_of(key.db)
        .ok_or(InvariantViolation::UnknownDatabase(key.db))?;

    let (query, votes) = state.purge_query(key)?;
    let mut record = FinalizedQuery::new(key.clone(), query.fee, owner.clone());

    if query.fee == 0 {
        debug!("Purged unfunded query {} with {} votes", key, votes.len());
        return Ok(record);
    }

    record.royalty = apply_bips(query.fee, royalty_bips, "royalty")?;
    if record.royalty > 0 {
        state.credit_royalties(&owner, record.royalty)?;
    }
    let mut remaining = checked_sub(query.fee, record.royalty, "fee after royalty")?;

    let election = Election::new(votes)?;
    match election.winning_result() {
        Some(result) => {
            record.outcome = SettlementOutcome::Agreed {
                result: result.clone(),
            };

            let winners = election.super_majority();
            let share = equal_share(remaining, winners.len())?;
            for vote in winners {
                state.credit_fees(&vote.account, share)?;
                remaining = checked_sub(remaining, share, "fee split")?;
                record.payouts.push((vote.account.clone(), share));
            }

            record.dust = remaining;
            state.add_to_pool(remaining)?;

            let rule = state.config.minority_slash;
            for vote in election.minority() {
                let amount = state.slash(key.db, &vote.account, rule)?;
                state.add_to_pool(amount)?;
                record.slashed.push((vote.account.clone(), amount));
            }
        }
        None => {
            if election.num_voters() > 0 {
                warn!(
                    "No supermajority among {} voters for query {}, forfeiting {}",
                    election.num_voters(),
                    key,
                    remaining
                );
            } else {
                warn!("No results for query {}, forfeiting {}", key, remaining);
            }
            record.outcome = SettlementOutcome::NoQuorum;
            record.forfeited = remaining;
            state.add_to_pool(remaining)?;
        }
    }

    let accounted = record
        .distributed()
        .ok_or(InvariantViolation::Overflow("settlement total"))?;
    if accounted != record.fee {
        return Err(if accounted > record.fee {
            InvariantViolation::Overflow("settlement total")
        } else {
            InvariantViolation::Underflow("settlement total")
        });
    }

    info!(
        "Settled query {}: fee={} royalty={} winners={} slashed={} dust={} forfeited={}",
        key,
        record.fee,
        record.royalty,
        record.payouts.len(),
        record.slashed.len(),
        record.dust,
        record.forfeited
    );
    Ok(record)
}

/// `amount * bips / 10000`.
fn apply_bips(amount: Money, bips: Bips, what: &'static str) -> Result<Money, InvariantViolation> {
    amount
        .checked_mul(Money::from(bips))
        .map(|scaled| scaled / BIPS_DENOMINATOR)
        .ok_or(InvariantViolation::Overflow(what))
}

/// Per-winner share `amount * floor(10000 / winners) / 10000`.
fn equal_share(amount: Money, winners: usize) -> Result<Money, InvariantViolation> {
    if winners == 0 {
        return Ok(0);
    }
    let share_bips = BIPS_DENOMINATOR / winners as Money;
    amount
        .checked_mul(share_bips)
        .map(|scaled| scaled / BIPS_DENOMINATOR)
        .ok_or(InvariantViolation::Overflow("fee share"))
}

/// Sum of all amounts in a settlement batch, used for reporting.
pub fn total_pooled(settled: &[FinalizedQuery]) -> Result<Money, InvariantViolation> {
    settled.iter().try_fold(0, |acc, record| {
        let pooled = record
            .pooled()
            .ok_or(InvariantViolation::Overflow("pooled total"))?;
        checked_add(acc, pooled, "pooled total")
    })
}
