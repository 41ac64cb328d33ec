//! Sequence-tracking submission protocol.
//!
//! A [`Sequencer`] is the only owner of the funding account's
//! [`SequencerState`]. Every transfer goes through [`Sequencer::submit`],
//! which takes `&mut self`: holding the sequencer *is* the exclusive right
//! to submit. The [`worker`](crate::worker) module wraps it in a single task
//! so that right is shared by queueing rather than by locking.
//!
//! For two accepted transfers from one sequencer, the later one used a
//! sequence exactly one above the earlier one (a drift resync may move the
//! base in between, but only to the ledger's own expected value).

use faucet_types::{FaucetError, Result, Transfer};

use crate::{LedgerClient, RetryPolicy, SequencerState, SubmissionOutcome, TransferTx};

/// Accepted transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    /// Raw ledger reply body.
    pub body: String,
    /// Sequence the accepted transaction was signed with.
    pub sequence_used: u64,
    /// Sequence the next transfer will use.
    pub next_sequence: u64,
    /// Broadcasts spent, including drifted ones.
    pub attempts: u32,
}

/// Owns the signer state and runs the submit / resync loop.
pub struct Sequencer<L> {
    client: L,
    state: SequencerState,
    policy: RetryPolicy,
}

impl<L: LedgerClient> Sequencer<L> {
    /// Start from a known state.
    #[must_use]
    pub fn with_state(client: L, state: SequencerState, policy: RetryPolicy) -> Self {
        Self {
            client,
            state,
            policy,
        }
    }

    /// Start from the ledger's current view of the funding account.
    pub async fn connect(client: L, policy: RetryPolicy) -> Result<Self> {
        let state = client.account_view().await?;
        tracing::info!(%state, "sequencer synchronized from ledger");
        Ok(Self::with_state(client, state, policy))
    }

    #[must_use]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    #[must_use]
    pub fn client(&self) -> &L {
        &self.client
    }

    /// Replace the local state with the ledger's authoritative view.
    pub async fn resync(&mut self) -> Result<SequencerState> {
        let fresh = self.client.account_view().await?;
        if fresh != self.state {
            tracing::warn!(local = %self.state, ledger = %fresh, "sequencer state resynchronized");
        }
        self.state = fresh;
        Ok(fresh)
    }

    /// Broadcast `transfer`, recovering from sequence drift.
    ///
    /// The sequence advances only on acceptance. Drift triggers a resync and
    /// a retry, up to the policy's budget; every other failure returns at
    /// once.
    ///
    /// # Errors
    /// - [`FaucetError::LedgerRejected`] with the ledger's own log
    /// - [`FaucetError::Transport`] when nothing reached the ledger
    /// - [`FaucetError::BroadcastUnconfirmed`] / [`FaucetError::MalformedResponse`]
    ///   when the transfer may have landed
    /// - [`FaucetError::Internal`] when signing fails
    /// - [`FaucetError::SequenceDriftExhausted`] when the budget runs out
    /// - any error from the resync query
    pub async fn submit(&mut self, transfer: &Transfer) -> Result<SubmitReport> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let tx = TransferTx::new(transfer.clone(), self.state);
            let outcome = self.client.submit(&tx).await;

            match outcome {
                SubmissionOutcome::Accepted(body) => {
                    self.state.sequence += 1;
                    tracing::info!(
                        recipient = %transfer.recipient,
                        amount = transfer.amount,
                        sequence = tx.sequence,
                        attempts,
                        "transfer accepted"
                    );
                    return Ok(SubmitReport {
                        body,
                        sequence_used: tx.sequence,
                        next_sequence: self.state.sequence,
                        attempts,
                    });
                }
                SubmissionOutcome::SequenceDrift => {
                    tracing::warn!(sequence = tx.sequence, attempts, "sequence drift");
                    if !self.policy.allows_retry(attempts) {
                        return Err(FaucetError::SequenceDriftExhausted { attempts });
                    }
                    self.policy.pause(attempts).await;
                    self.resync().await?;
                }
                SubmissionOutcome::LedgerRejected { code, message } => {
                    return Err(failed(transfer, &tx, FaucetError::LedgerRejected { code, message }));
                }
                SubmissionOutcome::TransportError(e) => {
                    return Err(failed(transfer, &tx, FaucetError::Transport(e)));
                }
                SubmissionOutcome::Unconfirmed(e) => {
                    return Err(failed(transfer, &tx, FaucetError::BroadcastUnconfirmed(e)));
                }
                SubmissionOutcome::MalformedResponse(e) => {
                    return Err(failed(transfer, &tx, FaucetError::MalformedResponse(e)));
                }
                SubmissionOutcome::SigningFailed(e) => {
                    let err = FaucetError::Internal(format!("signing transfer: {e}"));
                    return Err(failed(transfer, &tx, err));
                }
            }
        }
    }
}

fn failed(transfer: &Transfer, tx: &TransferTx, err: FaucetError) -> FaucetError {
    tracing::warn!(
        recipient = %transfer.recipient,
        sequence = tx.sequence,
        error = %err,
        "transfer failed"
    );
    err
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use faucet_types::Account;

    use super::*;
    use crate::mock::{MockLedger, Scripted};

    fn transfer() -> Transfer {
        Transfer {
            recipient: Account::dummy(1),
            amount: 10_000_000,
            fee: vec![],
        }
    }

    #[tokio::test]
    async fn consecutive_accepts_use_consecutive_sequences() {
        let ledger = Arc::new(MockLedger::new(SequencerState::new(4, 100)));
        let mut seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
            .await
            .unwrap();

        for i in 0..5 {
            let report = seq.submit(&transfer()).await.unwrap();
            assert_eq!(report.sequence_used, 100 + i);
            assert_eq!(report.attempts, 1);
        }
        assert_eq!(seq.state(), SequencerState::new(4, 105));
        let used: Vec<u64> = ledger.submitted().iter().map(|tx| tx.sequence).collect();
        assert_eq!(used, vec![100, 101, 102, 103, 104]);
    }

    #[tokio::test]
    async fn drift_then_accept_advances_once() {
        let ledger = Arc::new(MockLedger::new(SequencerState::new(1, 7)));
        ledger.script([Scripted::drift_empty()]);
        let mut seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
            .await
            .unwrap();

        let report = seq.submit(&transfer()).await.unwrap();
        assert!(!report.body.is_empty());
        assert_eq!(report.attempts, 2);
        assert_eq!(report.sequence_used, 7);
        assert_eq!(seq.state().sequence, 8, "must be initial+1, not initial+2");
        assert_eq!(ledger.account_view_calls(), 2);
    }

    #[tokio::test]
    async fn stale_local_sequence_recovers_via_resync() {
        let ledger = Arc::new(MockLedger::new(SequencerState::new(1, 20)));
        let mut seq = Sequencer::with_state(
            Arc::clone(&ledger),
            SequencerState::new(1, 17),
            RetryPolicy::default(),
        );

        let report = seq.submit(&transfer()).await.unwrap();
        assert_eq!(report.sequence_used, 20);
        assert_eq!(report.next_sequence, 21);
    }

    #[tokio::test]
    async fn drift_budget_exhaustion_is_hard_failure() {
        let ledger = Arc::new(MockLedger::new(SequencerState::new(1, 0)));
        ledger.script(std::iter::repeat_with(Scripted::drift_empty).take(4));
        let mut seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
            .await
            .unwrap();

        let err = seq.submit(&transfer()).await.unwrap_err();
        assert!(matches!(err, FaucetError::SequenceDriftExhausted { attempts: 4 }));
        assert_eq!(ledger.submitted().len(), 4);
        assert_eq!(seq.state().sequence, 0);
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let ledger = Arc::new(MockLedger::new(SequencerState::new(1, 3)));
        ledger.script([Scripted::rejected(5, "insufficient funds")]);
        let mut seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
            .await
            .unwrap();

        let err = seq.submit(&transfer()).await.unwrap_err();
        assert!(matches!(err, FaucetError::LedgerRejected { code: 5, .. }));
        assert_eq!(ledger.submitted().len(), 1);
        assert_eq!(seq.state().sequence, 3);
    }

    #[tokio::test]
    async fn transport_error_is_not_retried() {
        let ledger = Arc::new(MockLedger::new(SequencerState::new(1, 3)));
        ledger.script([Scripted::status(503, "unavailable")]);
        let mut seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
            .await
            .unwrap();

        let err = seq.submit(&transfer()).await.unwrap_err();
        assert!(matches!(err, FaucetError::Transport(_)));
        assert_eq!(seq.state().sequence, 3);
    }

    #[tokio::test]
    async fn lost_reply_is_not_retried_and_keeps_sequence() {
        let ledger = Arc::new(MockLedger::new(SequencerState::new(1, 3)));
        ledger.script([Scripted::Unconfirmed("operation timed out".into())]);
        let mut seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
            .await
            .unwrap();

        let err = seq.submit(&transfer()).await.unwrap_err();
        assert!(matches!(err, FaucetError::BroadcastUnconfirmed(_)));
        assert!(err.may_have_broadcast());
        assert_eq!(ledger.submitted().len(), 1);
        assert_eq!(seq.state().sequence, 3);
    }

    #[tokio::test]
    async fn failed_resync_ends_the_request() {
        let ledger = Arc::new(MockLedger::new(SequencerState::new(1, 3)));
        let mut seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
            .await
            .unwrap();
        ledger.script([Scripted::drift_empty()]);
        ledger.fail_account_view(true);

        let err = seq.submit(&transfer()).await.unwrap_err();
        assert!(matches!(err, FaucetError::Transport(_)));
        assert_eq!(ledger.submitted().len(), 1);
    }
}
