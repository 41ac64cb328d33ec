//! In-memory signer state of the funding account.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account number and next expected sequence of the funding account.
///
/// Owned by exactly one [`Sequencer`](crate::Sequencer). Never persisted:
/// it is reloaded from the ledger at startup and on every drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerState {
    pub account_number: u64,
    pub sequence: u64,
}

impl SequencerState {
    #[must_use]
    pub fn new(account_number: u64, sequence: u64) -> Self {
        Self {
            account_number,
            sequence,
        }
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account#{} seq {}", self.account_number, self.sequence)
    }
}
