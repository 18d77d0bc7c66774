//! # `HarvestAP`
//!
//! Active Participation (AP) token with pro-rata redemption into a FARM
//! reward pool, and an upgrade path that swaps the redemption contract
//! without touching AP balances.
//!
//! ## Architecture
//!
//! The system is three contracts on an atomic contract runtime:
//! - **`HarvestAP`**: the participation ledger; admin-only minting, the
//!   burn path, and the pointer to the active redemption authority
//! - **`APRedemption`**: custodies the FARM pool and pays
//!   `floor(amount * pool / supply)` for burned AP
//! - **FARM**: the reward token
//!
//! ## Safety Model
//!
//! - Only the authority the ledger currently points at may burn AP
//! - Migration drains the old pool into the new authority and repoints the
//!   ledger in one transaction
//! - Every transaction commits completely or rolls back completely
//! - Concurrent clients are serialized behind one write lock

#![forbid(unsafe_code)]
#![deny(clippy::all, rust_2018_idioms)]
#![warn(clippy::pedantic, clippy::nursery, missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::future_not_send,
    // Storage key lengths are tiny
    clippy::cast_possible_truncation,
    // Const fn not always beneficial for complex types
    clippy::missing_const_for_fn,
    // must_use on every fn is excessive
    clippy::must_use_candidate,
    // Pass by value is fine for small Copy types
    clippy::needless_pass_by_value
)]

pub mod client;
pub mod config;
pub mod contracts;
pub mod crypto;
pub mod deploy;
pub mod state;
pub mod tokenomics;
pub mod types;

pub use client::ChainClient;
pub use config::{ConfigError, HarvestConfig};
pub use contracts::ledger::{ERR_ONLY_ADMIN, ERR_ONLY_REDEMPTION};
pub use contracts::{ContractError, ContractResult, ExecutionResult};
pub use crypto::Hash;
pub use deploy::Deployment;
pub use state::ChainState;
pub use tokenomics::{redemption_payout, RedemptionQuote};
pub use types::{Address, Amount};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
