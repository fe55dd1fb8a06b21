//! Majority vote over result claims.
//!
//! A result wins when at least two thirds of all voters claim it. The check
//! is done in integers as `count * 3 >= voters * 2`, so exactly 2/3 qualifies.
//! At most one result can reach the threshold for a non-empty voter set.
//!
//! Every account carries one vote. Nothing prevents one party from voting
//! through many accounts.

use std::collections::BTreeMap;

use escrow_types::{ResultId, Vote};

use crate::error::InvariantViolation;

/// Tally of the votes cast for one query.
#[derive(Clone, Debug)]
pub struct Election {
    votes: Vec<Vote>,
    results: BTreeMap<ResultId, usize>,
}

impl Election {
    /// Tally a vote set.
    ///
    /// Fails if any result group is larger than the voter set, which would
    /// mean the tally itself is corrupt.
    pub fn new(votes: Vec<Vote>) -> Result<Self, InvariantViolation> {
        let mut results: BTreeMap<ResultId, usize> = BTreeMap::new();
        for vote in &votes {
            *results.entry(vote.result.clone()).or_insert(0) += 1;
        }
        let voters = votes.len();
        if let Some(&count) = results.values().find(|&&count| count > voters) {
            return Err(InvariantViolation::VoteGroupExceedsVoters { count, voters });
        }
        Ok(Self { votes, results })
    }

    pub fn num_voters(&self) -> usize {
        self.votes.len()
    }

    /// True when every voter claims the same result.
    pub fn is_unanimous(&self) -> bool {
        self.results.len() == 1
    }

    /// True when some result reaches the two-thirds threshold.
    pub fn is_super_majority(&self) -> bool {
        self.winning_result().is_some()
    }

    /// The result agreed on by a supermajority, if any.
    pub fn winning_result(&self) -> Option<&ResultId> {
        self.results
            .iter()
            .find(|(_, count)| self.qualifies(**count))
            .map(|(result, _)| result)
    }

    /// Votes for the winning result.
    pub fn super_majority(&self) -> Vec<&Vote> {
        self.votes
            .iter()
            .filter(|vote| self.qualifies(self.count_of(&vote.result)))
            .collect()
    }

    /// Votes for any other result.
    pub fn minority(&self) -> Vec<&Vote> {
        self.votes
            .iter()
            .filter(|vote| !self.qualifies(self.count_of(&vote.result)))
            .collect()
    }

    pub fn num_super_majority(&self) -> usize {
        self.super_majority().len()
    }

    fn count_of(&self, result: &ResultId) -> usize {
        self.results.get(result).copied().unwrap_or(0)
    }

    fn qualifies(&self, count: usize) -> bool {
        let voters = self.votes.len();
        voters > 0 && count.saturating_mul(3) >= voters.saturating_mul(2)
    }
}
