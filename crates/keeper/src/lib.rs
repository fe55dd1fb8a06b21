//! Permissionless settlement keeper for the query escrow system.
//!
//! Settlement only happens when someone calls `finalize` (or `claim`). The
//! keeper service:
//! 1. Polls the chain for queries whose deadline has passed
//! 2. Calls `finalize` when there is anything to settle
//! 3. Logs the outcome of every settled query
//!
//! Anyone can run this service. Finalizing is idempotent, so several keepers
//! may run side by side.

pub mod service;

pub use service::{KeeperConfig, KeeperService};
