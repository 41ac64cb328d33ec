//! Remote ledger seam.

use std::future::Future;
use std::sync::Arc;

use faucet_types::{Result, Transfer};
use serde::{Deserialize, Serialize};

use crate::{SequencerState, SubmissionOutcome};

/// A transfer pinned to a sequence and account number, ready to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTx {
    pub transfer: Transfer,
    pub sequence: u64,
    pub account_number: u64,
}

impl TransferTx {
    #[must_use]
    pub fn new(transfer: Transfer, state: SequencerState) -> Self {
        Self {
            transfer,
            sequence: state.sequence,
            account_number: state.account_number,
        }
    }
}

/// What the sequencer needs from the ledger.
///
/// Implementations build, sign, and broadcast; they never retry and never
/// track sequences themselves.
pub trait LedgerClient: Send + Sync + 'static {
    /// The ledger's authoritative view of the funding account.
    fn account_view(&self) -> impl Future<Output = Result<SequencerState>> + Send;

    /// Broadcast `tx` once and classify the reply.
    fn submit(&self, tx: &TransferTx) -> impl Future<Output = SubmissionOutcome> + Send;
}

impl<L: LedgerClient> LedgerClient for Arc<L> {
    fn account_view(&self) -> impl Future<Output = Result<SequencerState>> + Send {
        (**self).account_view()
    }

    fn submit(&self, tx: &TransferTx) -> impl Future<Output = SubmissionOutcome> + Send {
        (**self).submit(tx)
    }
}
