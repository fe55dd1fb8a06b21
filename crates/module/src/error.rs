//! Escrow module error types.

use thiserror::Error;

use escrow_types::{Bips, DbId, Height, Money, QueryKey};

/// Errors that can occur in the escrow module.
///
/// Every variant except [`EscrowError::Invariant`] is a failed precondition:
/// the call is rejected and no state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    #[error("Database not found: {0}")]
    DatabaseNotFound(DbId),

    #[error("Security deposit too low: need {required}, got {got}")]
    InsufficientStake { required: Money, got: Money },

    #[error("Fee payment is expired: deadline {deadline} not after height {height}")]
    FeeExpired { deadline: Height, height: Height },

    #[error("Settlement timed out: deadline {deadline} reached at height {height}")]
    SettlementTimedOut { deadline: Height, height: Height },

    #[error("Amount must be positive")]
    ZeroAmount,

    #[error("Caller did not pay deposit")]
    NoDeposit,

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Amount {requested} is larger than available funds {available}")]
    InsufficientPool { requested: Money, available: Money },

    #[error("Royalty basis points out of range [0, 10000]: {0}")]
    InvalidRoyalty(Bips),

    #[error("Storage fee too low: need {required}, got {got}")]
    InsufficientStorageFee { required: Money, got: Money },

    #[error("Empty code CID")]
    EmptyCodeCid,

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Broad classification of an [`EscrowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PreconditionFailed,
    FatalInvariantViolation,
}

impl EscrowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EscrowError::Invariant(_) => ErrorKind::FatalInvariantViolation,
            _ => ErrorKind::PreconditionFailed,
        }
    }

    /// True when the error signals corrupted accounting rather than a bad request.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::FatalInvariantViolation
    }
}

/// Accounting invariants that must never break.
///
/// Hitting one of these aborts the whole operation, including a settlement
/// sweep that already processed other queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Arithmetic underflow in {0}")]
    Underflow(&'static str),

    #[error("Vote group of {count} exceeds {voters} voters")]
    VoteGroupExceedsVoters { count: usize, voters: usize },

    #[error("Query {0} purged twice")]
    QueryAlreadyPurged(QueryKey),

    #[error("Pending query references unknown database {0}")]
    UnknownDatabase(DbId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EscrowError::ZeroAmount.kind(), ErrorKind::PreconditionFailed);
        assert!(!EscrowError::NotAuthorized.is_fatal());

        let fatal: EscrowError = InvariantViolation::Overflow("settled fees").into();
        assert!(fatal.is_fatal());
        assert_eq!(fatal.to_string(), "Arithmetic overflow in settled fees");
    }
}
