//! On-chain state structures for the escrow module.

use std::collections::BTreeMap;

use escrow_types::{
    AccountId, DbId, Height, Money, PendingQuery, QueryKey, ResultId, SettledBalance, Vote,
};

use crate::collaborators::Registry;
use crate::error::{EscrowError, InvariantViolation};
use crate::genesis::{EscrowGenesisConfig, GenesisValidationError, SlashRule};

/// Escrow module state.
///
/// One owned store holding every table the engine reads and writes. Calls
/// receive it by reference; nothing lives in globals.
#[derive(Clone, Debug)]
pub struct EscrowState {
    /// Parameters fixed at genesis
    pub config: EscrowGenesisConfig,

    /// Databases and host endpoints
    pub registry: Registry,

    /// Security deposits: (database, host) -> balance
    pub deposits: BTreeMap<(DbId, AccountId), Money>,

    /// Escrowed fee and deadline per query
    pub queries: BTreeMap<QueryKey, PendingQuery>,

    /// Current result claim per host: query -> host -> result
    pub votes: BTreeMap<QueryKey, BTreeMap<AccountId, ResultId>>,

    /// Earnings awaiting withdrawal
    pub settled: BTreeMap<AccountId, SettledBalance>,

    /// Forfeited fees, rounding dust and confiscated deposits
    pub slashed_pool: Money,
}

impl Default for EscrowState {
    fn default() -> Self {
        Self::with_config(EscrowGenesisConfig::default())
    }
}

impl EscrowState {
    /// Create a new escrow state with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state from a validated genesis configuration.
    pub fn from_genesis(config: EscrowGenesisConfig) -> Result<Self, GenesisValidationError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: EscrowGenesisConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
            deposits: BTreeMap::new(),
            queries: BTreeMap::new(),
            votes: BTreeMap::new(),
            settled: BTreeMap::new(),
            slashed_pool: 0,
        }
    }

    /// Run `f` against a staged copy and keep its changes only on success.
    pub fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let mut staged = self.clone();
        let out = f(&mut staged)?;
        *self = staged;
        Ok(out)
    }

    // === Deposits ===

    /// Get a host's deposit for a database.
    pub fn deposit_of(&self, db: DbId, account: &AccountId) -> Money {
        self.deposits
            .get(&(db, account.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// True when the host's deposit meets the minimum stake.
    pub fn meets_min_stake(&self, db: DbId, account: &AccountId) -> bool {
        self.deposit_of(db, account) >= self.config.min_stake
    }

    /// Add to a host's deposit, returning the new balance.
    pub fn add_stake(
        &mut self,
        db: DbId,
        account: &AccountId,
        amount: Money,
    ) -> Result<Money, InvariantViolation> {
        let balance = self.deposits.entry((db, account.clone())).or_insert(0);
        *balance = checked_add(*balance, amount, "deposit")?;
        Ok(*balance)
    }

    /// Remove a host's whole deposit, returning it.
    pub fn take_deposit(&mut self, db: DbId, account: &AccountId) -> Money {
        self.deposits.remove(&(db, account.clone())).unwrap_or(0)
    }

    /// Confiscate part of a host's deposit according to `rule`.
    ///
    /// Returns the amount removed, which never exceeds the balance.
    pub fn slash(
        &mut self,
        db: DbId,
        account: &AccountId,
        rule: SlashRule,
    ) -> Result<Money, InvariantViolation> {
        let key = (db, account.clone());
        let balance = self.deposits.get(&key).copied().unwrap_or(0);
        let amount = rule
            .amount(balance)
            .ok_or(InvariantViolation::Overflow("slash amount"))?;
        let remaining = checked_sub(balance, amount, "deposit")?;
        if remaining == 0 {
            self.deposits.remove(&key);
        } else {
            self.deposits.insert(key, remaining);
        }
        Ok(amount)
    }

    // === Queries ===

    /// Get the pending record of a query.
    pub fn pending_query(&self, key: &QueryKey) -> Option<&PendingQuery> {
        self.queries.get(key)
    }

    /// Get the fee escrowed for a query.
    pub fn pending_fee(&self, key: &QueryKey) -> Money {
        self.queries.get(key).map(|q| q.fee).unwrap_or(0)
    }

    /// Add a fee payment and overwrite the deadline, returning the new total.
    pub fn escrow_fee(
        &mut self,
        key: &QueryKey,
        amount: Money,
        deadline: Height,
    ) -> Result<Money, InvariantViolation> {
        let query = self.queries.entry(key.clone()).or_default();
        query.fee = checked_add(query.fee, amount, "pending fee")?;
        query.deadline = deadline;
        Ok(query.fee)
    }

    /// Set `now + window` as deadline unless the query already has one.
    pub fn ensure_deadline(
        &mut self,
        key: &QueryKey,
        now: Height,
        window: Height,
    ) -> Result<Height, InvariantViolation> {
        if let Some(query) = self.queries.get(key) {
            return Ok(query.deadline);
        }
        let deadline = now
            .checked_add(window)
            .ok_or(InvariantViolation::Overflow("deadline"))?;
        self.queries.insert(
            key.clone(),
            PendingQuery {
                fee: 0,
                deadline,
            },
        );
        Ok(deadline)
    }

    /// True when the query has a deadline and it has been reached.
    pub fn is_expired(&self, key: &QueryKey, now: Height) -> bool {
        self.queries
            .get(key)
            .map(|q| q.is_expired(now))
            .unwrap_or(false)
    }

    /// All queries whose deadline has been reached, in key order.
    pub fn expired_queries(&self, now: Height) -> Vec<QueryKey> {
        self.queries
            .iter()
            .filter(|(_, q)| q.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Remove every trace of a query, returning its record and votes.
    pub fn purge_query(
        &mut self,
        key: &QueryKey,
    ) -> Result<(PendingQuery, Vec<Vote>), InvariantViolation> {
        let query = self
            .queries
            .remove(key)
            .ok_or_else(|| InvariantViolation::QueryAlreadyPurged(key.clone()))?;
        let votes = self
            .votes
            .remove(key)
            .map(into_votes)
            .unwrap_or_default();
        Ok((query, votes))
    }

    // === Votes ===

    /// Store a host's result claim, replacing any earlier one.
    pub fn record_vote(&mut self, key: &QueryKey, account: AccountId, result: ResultId) {
        self.votes
            .entry(key.clone())
            .or_default()
            .insert(account, result);
    }

    /// Snapshot of the current votes for a query.
    pub fn votes_for(&self, key: &QueryKey) -> Vec<Vote> {
        self.votes
            .get(key)
            .cloned()
            .map(into_votes)
            .unwrap_or_default()
    }

    // === Settled balances ===

    /// Get an account's claimable earnings.
    pub fn settled_balance(&self, account: &AccountId) -> SettledBalance {
        self.settled.get(account).cloned().unwrap_or_default()
    }

    pub fn credit_fees(&mut self, account: &AccountId, amount: Money) -> Result<(), InvariantViolation> {
        let balance = self.settled.entry(account.clone()).or_default();
        balance.fees = checked_add(balance.fees, amount, "settled fees")?;
        Ok(())
    }

    pub fn credit_royalties(
        &mut self,
        account: &AccountId,
        amount: Money,
    ) -> Result<(), InvariantViolation> {
        let balance = self.settled.entry(account.clone()).or_default();
        balance.royalties = checked_add(balance.royalties, amount, "settled royalties")?;
        Ok(())
    }

    /// Zero an account's earnings, returning their sum.
    pub fn take_settled(&mut self, account: &AccountId) -> Result<Money, InvariantViolation> {
        match self.settled.remove(account) {
            Some(balance) => balance
                .total()
                .ok_or(InvariantViolation::Overflow("claim total")),
            None => Ok(0),
        }
    }

    // === Slashed pool ===

    pub fn add_to_pool(&mut self, amount: Money) -> Result<(), InvariantViolation> {
        self.slashed_pool = checked_add(self.slashed_pool, amount, "slashed pool")?;
        Ok(())
    }

    /// Withdraw from the slashed pool.
    pub fn take_from_pool(&mut self, amount: Money) -> Result<(), EscrowError> {
        if amount > self.slashed_pool {
            return Err(EscrowError::InsufficientPool {
                requested: amount,
                available: self.slashed_pool,
            });
        }
        self.slashed_pool -= amount;
        Ok(())
    }
}

fn into_votes(votes: BTreeMap<AccountId, ResultId>) -> Vec<Vote> {
    votes
        .into_iter()
        .map(|(account, result)| Vote { account, result })
        .collect()
}

pub(crate) fn checked_add(
    a: Money,
    b: Money,
    what: &'static str,
) -> Result<Money, InvariantViolation> {
    a.checked_add(b).ok_or(InvariantViolation::Overflow(what))
}

pub(crate) fn checked_sub(
    a: Money,
    b: Money,
    what: &'static str,
) -> Result<Money, InvariantViolation> {
    a.checked_sub(b).ok_or(InvariantViolation::Underflow(what))
}
