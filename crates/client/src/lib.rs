//! Client SDK for the query escrow system.
//!
//! This crate provides a typed API over the mock chain RPC for:
//! - Deploying databases and listing host endpoints
//! - Staking and withdrawing security deposits
//! - Escrowing query fees and submitting results
//! - Finalizing expired queries and claiming earnings

pub mod rpc;

pub use rpc::{ClientError, EscrowClient};
