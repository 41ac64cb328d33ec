//! # faucet-sequencer
//!
//! **Submission plane**: owns the funding account's ledger sequence and
//! serializes every outbound transfer through one worker.
//!
//! ## Architecture
//!
//! The ledger accepts transactions from an account strictly in sequence
//! order and cannot buffer or reorder them, so:
//! 1. **Sequencer**: holds [`SequencerState`] and runs the submit / classify
//!    / resync protocol for one transfer at a time
//! 2. **Worker**: a single task draining a FIFO queue; callers hold a
//!    cloneable [`SequencerHandle`]
//! 3. **LedgerClient**: the remote ledger seam ([`RestLedgerClient`] over
//!    HTTP, signing through a [`TxSigner`])
//! 4. **Classification**: typed parsing of broadcast replies into a
//!    [`SubmissionOutcome`]
//!
//! ## Submission Flow
//!
//! ```text
//! handle.submit() → queue → worker → Sequencer.submit()
//!     → LedgerClient.submit(tx @ sequence) → classify
//!       Accepted       → sequence += 1, reply
//!       SequenceDrift  → RetryPolicy pause → resync from ledger → retry (≤ 3)
//!       anything else  → reply error, sequence untouched
//! ```

pub mod ledger;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod policy;
pub mod response;
pub mod rest;
pub mod sequencer;
pub mod signer;
pub mod state;
pub mod worker;

pub use ledger::{LedgerClient, TransferTx};
#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockLedger;
pub use policy::RetryPolicy;
pub use response::{SubmissionOutcome, classify, parse_account_view};
pub use rest::RestLedgerClient;
pub use sequencer::{Sequencer, SubmitReport};
pub use signer::{Ed25519TxSigner, TxSigner};
pub use state::SequencerState;
pub use worker::{SequencerHandle, spawn};
