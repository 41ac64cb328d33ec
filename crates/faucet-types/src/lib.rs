//! # faucet-types
//!
//! Shared types, errors, and configuration for the **drip faucet**.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Account`]
//! - **Claim history**: [`ClaimRecord`]
//! - **Grant policy**: [`DripConfig`], [`Coin`]
//! - **Transfers**: [`Transfer`]
//! - **Errors**: [`FaucetError`] with `FC_ERR_` prefix codes
//! - **Constants**: hard-coded limits and defaults

pub mod account;
pub mod claim;
pub mod config;
pub mod constants;
pub mod error;
pub mod transfer;

// Re-export all primary types at crate root for ergonomic imports:
//   use faucet_types::{Account, ClaimRecord, DripConfig, ...};

pub use account::*;
pub use claim::*;
pub use config::*;
pub use error::*;
pub use transfer::*;

// Constants are accessed via `faucet_types::constants::FOO`
// (not re-exported to avoid name collisions).
