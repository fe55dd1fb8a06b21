//! Mock chain for local testing of the query escrow system.
//!
//! A JSON-RPC server that hosts one escrow module instance with a simulated
//! block height, without requiring a real blockchain. Every call runs under
//! one write lock, so calls never interleave. Scheduled transfers are kept
//! in a log instead of being executed.

pub mod api;
pub mod server;
pub mod types;

pub use api::{EscrowApiClient, EscrowApiServer};
pub use server::{start_server, ChainState, MockChainServer, PRECONDITION_FAILED_CODE};
pub use types::Amount;
