//! # faucet-limiter
//!
//! **Claim admission**: decides whether an account may receive a grant
//! right now, and durably records every grant it admits.
//!
//! ## Architecture
//!
//! 1. **RecordStore**: durable `Account → ClaimRecord` map
//!    ([`FileRecordStore`] on disk, [`MemoryRecordStore`] in memory)
//! 2. **RateLimiter**: read-decide-write over the store, serialized per
//!    account
//!
//! ## Admission Rules
//!
//! ```text
//! no record                          → Admit
//! now - last < MIN_CLAIM_SPACING     → Deny(TooSoon)
//! |window pruned to interval| ≥ count → Deny(QuotaExceeded)
//! otherwise                          → Admit, window += now, persist
//! ```
//!
//! A denied check never writes.

pub mod limiter;
pub mod store;

pub use limiter::{Admission, ClaimDecision, DenyReason, RateLimiter};
pub use store::{FileRecordStore, MemoryRecordStore, RecordStore};
