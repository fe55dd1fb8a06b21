//! Escrow and dispute resolution for hosted database queries.
//!
//! Hosts lock a security deposit per database, clients escrow fees per
//! query, and hosts vote on the result each query produced. Once a query's
//! deadline passes, settlement pays the database owner a royalty, splits the
//! rest among a two-thirds supermajority, and slashes the minority. Without
//! a supermajority the fee is forfeited to the slashed pool.
//!
//! # Architecture
//!
//! The module is laid out like a rollup module:
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Deposits, pending queries, votes and balances
//! - `election`: Supermajority evaluation over a vote set
//! - `settlement`: The expiry sweep
//! - `collaborators`: Registry, host listing and value-transfer seams
//! - `genesis`: Initial configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use escrow_module::{handlers, EscrowCall, EscrowState, PaymentLog};
//!
//! let mut state = EscrowState::from_genesis(config)?;
//! let mut transfers = PaymentLog::new();
//! let ctx = handlers::CallContext { ... };
//!
//! // Lock a deposit
//! handlers::execute(&mut state, &ctx, EscrowCall::Stake { db }, &mut transfers)?;
//!
//! // Settle everything that expired
//! handlers::execute(&mut state, &ctx, EscrowCall::Finalize, &mut transfers)?;
//! ```

pub mod call;
pub mod collaborators;
pub mod election;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod settlement;
pub mod state;

pub use call::EscrowCall;
pub use collaborators::{DatabaseRegistry, HostListing, PaymentLog, Registry, ValueTransfer};
pub use election::Election;
pub use error::{ErrorKind, EscrowError, InvariantViolation};
pub use genesis::{EscrowGenesisConfig, GenesisValidationError, SlashRule};
pub use handlers::{CallContext, CallOutput, CallReceipt, HandlerResult};
pub use queries::{EscrowQuery, EscrowQueryResponse};
pub use settlement::{FinalizedQuery, SettlementOutcome};
pub use state::EscrowState;
