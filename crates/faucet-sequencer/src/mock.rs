//! Scripted in-process ledger for tests.
//!
//! By default the mock behaves like a well-behaved chain: a transaction
//! signed with the expected sequence is accepted and advances it, anything
//! else gets a sequence-mismatch reply. Scripted replies override that, one
//! per broadcast, in order. Every reply goes through [`classify`], so the
//! same parsing the REST client uses is exercised.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use faucet_types::{FaucetError, Result};
use parking_lot::Mutex;

use crate::{LedgerClient, SequencerState, SubmissionOutcome, TransferTx, classify};

/// One canned broadcast reply.
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply { status: u16, body: String },
    Transport(String),
    /// Request sent, reply lost.
    Unconfirmed(String),
}

impl Scripted {
    /// Empty 200: the gateway's answer to a sequence race.
    #[must_use]
    pub fn drift_empty() -> Self {
        Self::Reply {
            status: 200,
            body: String::new(),
        }
    }

    #[must_use]
    pub fn rejected(code: u32, raw_log: &str) -> Self {
        Self::Reply {
            status: 200,
            body: serde_json::json!({"tx_response": {"code": code, "raw_log": raw_log}}).to_string(),
        }
    }

    #[must_use]
    pub fn status(status: u16, body: &str) -> Self {
        Self::Reply {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    chain: SequencerState,
    script: VecDeque<Scripted>,
    submitted: Vec<TransferTx>,
    account_view_calls: usize,
    fail_account_view: bool,
}

/// In-memory ledger with a scripted reply queue.
#[derive(Debug, Default)]
pub struct MockLedger {
    inner: Mutex<Inner>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockLedger {
    #[must_use]
    pub fn new(chain: SequencerState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                chain,
                ..Inner::default()
            }),
            ..Self::default()
        }
    }

    /// Delay every broadcast by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue replies for the next broadcasts.
    pub fn script(&self, replies: impl IntoIterator<Item = Scripted>) {
        self.inner.lock().script.extend(replies);
    }

    /// Make account queries fail (or succeed again).
    pub fn fail_account_view(&self, fail: bool) {
        self.inner.lock().fail_account_view = fail;
    }

    /// Simulate transactions from the funding account sent elsewhere.
    pub fn advance_chain(&self, by: u64) {
        self.inner.lock().chain.sequence += by;
    }

    #[must_use]
    pub fn chain_state(&self) -> SequencerState {
        self.inner.lock().chain
    }

    /// Every transaction broadcast so far, in arrival order.
    #[must_use]
    pub fn submitted(&self) -> Vec<TransferTx> {
        self.inner.lock().submitted.clone()
    }

    #[must_use]
    pub fn account_view_calls(&self) -> usize {
        self.inner.lock().account_view_calls
    }

    /// Highest number of broadcasts ever observed in flight together.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn reply(&self, tx: &TransferTx) -> Scripted {
        let mut inner = self.inner.lock();
        inner.submitted.push(tx.clone());
        if let Some(scripted) = inner.script.pop_front() {
            return scripted;
        }

        let chain = inner.chain;
        if tx.sequence == chain.sequence && tx.account_number == chain.account_number {
            inner.chain.sequence += 1;
            let txhash = format!("{:064X}", inner.submitted.len());
            return Scripted::Reply {
                status: 200,
                body: serde_json::json!({
                    "tx_response": {"txhash": txhash, "code": 0, "raw_log": "[]"}
                })
                .to_string(),
            };
        }
        Scripted::rejected(
            32,
            &format!(
                "account sequence mismatch, expected {}, got {}: incorrect account sequence",
                chain.sequence, tx.sequence
            ),
        )
    }
}

impl LedgerClient for MockLedger {
    async fn account_view(&self) -> Result<SequencerState> {
        let mut inner = self.inner.lock();
        inner.account_view_calls += 1;
        if inner.fail_account_view {
            return Err(FaucetError::Transport("mock account view unavailable".into()));
        }
        Ok(inner.chain)
    }

    async fn submit(&self, tx: &TransferTx) -> SubmissionOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let outcome = match self.reply(tx) {
            Scripted::Reply { status, body } => classify(status, &body),
            Scripted::Transport(e) => SubmissionOutcome::TransportError(e),
            Scripted::Unconfirmed(e) => SubmissionOutcome::Unconfirmed(e),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}
