//! Genesis configuration for the escrow module.
//!
//! This module defines the economic parameters fixed when the chain starts:
//! the privileged recovery account, the minimum host stake, the default
//! settlement window and the rule used to slash minority voters.

use escrow_types::{AccountId, Bips, Height, Money, BIPS_DENOMINATOR, MAX_BIPS, ONE_TOKEN};
use serde::{Deserialize, Serialize};

/// Number of blocks a query accepts results when no fee set a deadline.
pub const DEFAULT_SETTLE_WINDOW: Height = 120;

/// Minority slash rate applied per offence (25%).
pub const DEFAULT_SLASH_BIPS: Bips = 2_500;

/// How much of a minority voter's deposit is confiscated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "value")]
pub enum SlashRule {
    /// Remove `deposit * bips / 10000`.
    Bips(Bips),
    /// Remove `deposit * 10000 / divisor`, clamped to the deposit.
    ///
    /// Kept for compatibility with deployments that configured the rate as a
    /// divisor. With a divisor of 2500 this confiscates the whole deposit.
    LegacyDivisor(Money),
}

impl SlashRule {
    /// Amount to remove from `deposit`. Never exceeds `deposit`.
    pub fn amount(&self, deposit: Money) -> Option<Money> {
        let raw = match *self {
            SlashRule::Bips(bips) => deposit
                .checked_mul(Money::from(bips))?
                .checked_div(BIPS_DENOMINATOR)?,
            SlashRule::LegacyDivisor(divisor) => deposit
                .checked_mul(BIPS_DENOMINATOR)?
                .checked_div(divisor)?,
        };
        Some(raw.min(deposit))
    }
}

impl Default for SlashRule {
    fn default() -> Self {
        SlashRule::Bips(DEFAULT_SLASH_BIPS)
    }
}

/// Genesis configuration for the escrow module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowGenesisConfig {
    /// Account allowed to recover slashed funds
    pub owner: AccountId,

    /// Minimum deposit a host needs to submit results or list an endpoint
    pub min_stake: Money,

    /// Fee attached when deploying a database
    pub storage_cost: Money,

    /// Deadline window set by the first result submission
    pub settle_window: Height,

    /// Penalty for voting against a supermajority
    #[serde(default)]
    pub minority_slash: SlashRule,
}

impl Default for EscrowGenesisConfig {
    fn default() -> Self {
        Self {
            owner: AccountId::from("escrow.near"),
            min_stake: 10_000 * ONE_TOKEN,
            storage_cost: ONE_TOKEN,
            settle_window: DEFAULT_SETTLE_WINDOW,
            minority_slash: SlashRule::default(),
        }
    }
}

impl EscrowGenesisConfig {
    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.owner.is_empty() {
            return Err(GenesisValidationError::MissingOwner);
        }
        if self.min_stake == 0 {
            return Err(GenesisValidationError::ZeroMinStake);
        }
        if self.settle_window == 0 {
            return Err(GenesisValidationError::ZeroSettleWindow);
        }
        match self.minority_slash {
            SlashRule::Bips(bips) if bips > MAX_BIPS => {
                Err(GenesisValidationError::InvalidSlashRule(format!(
                    "{bips} bips exceeds {MAX_BIPS}"
                )))
            }
            SlashRule::LegacyDivisor(0) => Err(GenesisValidationError::InvalidSlashRule(
                "divisor cannot be zero".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Owner account cannot be empty")]
    MissingOwner,

    #[error("Minimum stake cannot be zero")]
    ZeroMinStake,

    #[error("Settlement window cannot be zero")]
    ZeroSettleWindow,

    #[error("Invalid slash rule: {0}")]
    InvalidSlashRule(String),
}
