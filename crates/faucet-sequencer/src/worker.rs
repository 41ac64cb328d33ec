//! Single-task submission worker.
//!
//! [`spawn`] moves a [`Sequencer`] into one tokio task that drains an
//! unbounded FIFO queue. Requests are processed strictly one at a time in
//! arrival order, so no two broadcasts are ever in flight together and the
//! sequencer state needs no lock.
//!
//! A caller that stops waiting does not cancel its transfer: the worker
//! finishes it and drops the reply.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use faucet_types::{FaucetError, Result, Transfer};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::{LedgerClient, Sequencer, SequencerState, SubmitReport};

enum Command {
    Submit {
        transfer: Transfer,
        reply: oneshot::Sender<Result<SubmitReport>>,
    },
    Snapshot {
        reply: oneshot::Sender<SequencerState>,
    },
}

/// Cloneable handle to the worker queue.
#[derive(Clone)]
pub struct SequencerHandle {
    tx: mpsc::UnboundedSender<Command>,
    queued: Arc<AtomicUsize>,
}

impl SequencerHandle {
    /// Enqueue `transfer` and wait for its outcome.
    ///
    /// # Errors
    /// Whatever [`Sequencer::submit`] returns, or
    /// [`FaucetError::SequencerUnavailable`] if the worker has stopped.
    pub async fn submit(&self, transfer: Transfer) -> Result<SubmitReport> {
        let (reply, rx) = oneshot::channel();
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(Command::Submit { transfer, reply }).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(FaucetError::SequencerUnavailable);
        }
        rx.await.map_err(|_| FaucetError::SequencerUnavailable)?
    }

    /// Transfers waiting in the queue or being processed.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Current sequencer state, answered in queue order.
    pub async fn snapshot(&self) -> Result<SequencerState> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .map_err(|_| FaucetError::SequencerUnavailable)?;
        rx.await.map_err(|_| FaucetError::SequencerUnavailable)
    }

    /// Whether the worker task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Start the worker. It runs until every handle is dropped.
pub fn spawn<L: LedgerClient>(mut sequencer: Sequencer<L>) -> (SequencerHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
    let queued = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&queued);

    let task = tokio::spawn(async move {
        tracing::info!(state = %sequencer.state(), "sequencer worker started");
        while let Some(command) = rx.recv().await {
            match command {
                Command::Submit { transfer, reply } => {
                    let result = sequencer.submit(&transfer).await;
                    counter.fetch_sub(1, Ordering::SeqCst);
                    if reply.send(result).is_err() {
                        tracing::debug!(recipient = %transfer.recipient.short(), "submit caller went away");
                    }
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(sequencer.state());
                }
            }
        }
        tracing::info!(state = %sequencer.state(), "sequencer worker stopped");
    });

    (SequencerHandle { tx, queued }, task)
}
