//! # Worker Serialization
//!
//! Many concurrent callers share one [`SequencerHandle`]. The worker must
//! keep at most one broadcast in flight and hand out strictly consecutive
//! sequences, even when drift forces a resync mid-stream.

use std::sync::Arc;
use std::time::Duration;

use faucet_sequencer::mock::Scripted;
use faucet_sequencer::{MockLedger, RetryPolicy, Sequencer, SequencerState, spawn};
use faucet_types::{Account, FaucetError, Transfer};

fn transfer(seed: u8) -> Transfer {
    Transfer {
        recipient: Account::dummy(seed),
        amount: 10_000_000,
        fee: vec![],
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_are_serialized() {
    let ledger = Arc::new(
        MockLedger::new(SequencerState::new(9, 500)).with_latency(Duration::from_millis(5)),
    );
    let seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
        .await
        .unwrap();
    let (handle, _task) = spawn(seq);

    let mut joins = Vec::new();
    for i in 0..20u8 {
        let handle = handle.clone();
        joins.push(tokio::spawn(async move { handle.submit(transfer(i)).await }));
    }

    let mut used = Vec::new();
    for join in joins {
        let report = join.await.unwrap().unwrap();
        assert_eq!(report.attempts, 1);
        used.push(report.sequence_used);
    }
    used.sort_unstable();
    assert_eq!(used, (500..520).collect::<Vec<_>>());

    assert_eq!(ledger.max_in_flight(), 1);
    assert_eq!(handle.snapshot().await.unwrap(), SequencerState::new(9, 520));
    assert_eq!(handle.queued(), 0);

    // Broadcast order on the wire is the sequence order.
    let wire: Vec<u64> = ledger.submitted().iter().map(|tx| tx.sequence).collect();
    assert_eq!(wire, (500..520).collect::<Vec<_>>());
}

#[tokio::test]
async fn external_spend_is_absorbed_by_resync() {
    let ledger = Arc::new(MockLedger::new(SequencerState::new(1, 0)));
    let seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
        .await
        .unwrap();
    let (handle, _task) = spawn(seq);

    handle.submit(transfer(1)).await.unwrap();
    // Someone else used the funding key twice.
    ledger.advance_chain(2);

    let report = handle.submit(transfer(2)).await.unwrap();
    assert_eq!(report.attempts, 2);
    assert_eq!(report.sequence_used, 3);
    assert_eq!(report.next_sequence, 4);
}

#[tokio::test]
async fn failure_does_not_poison_the_queue() {
    let ledger = Arc::new(MockLedger::new(SequencerState::new(1, 40)));
    ledger.script([Scripted::rejected(5, "insufficient funds")]);
    let seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
        .await
        .unwrap();
    let (handle, _task) = spawn(seq);

    let err = handle.submit(transfer(1)).await.unwrap_err();
    assert!(matches!(err, FaucetError::LedgerRejected { code: 5, .. }));

    let report = handle.submit(transfer(2)).await.unwrap();
    assert_eq!(report.sequence_used, 40);
}

#[tokio::test]
async fn abandoned_caller_still_completes() {
    let ledger = Arc::new(
        MockLedger::new(SequencerState::new(1, 7)).with_latency(Duration::from_millis(30)),
    );
    let seq = Sequencer::connect(Arc::clone(&ledger), RetryPolicy::default())
        .await
        .unwrap();
    let (handle, _task) = spawn(seq);

    let abandoned = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.submit(transfer(1)).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    abandoned.abort();

    // Snapshot is answered after the in-flight transfer finishes.
    assert_eq!(handle.snapshot().await.unwrap(), SequencerState::new(1, 8));
    assert_eq!(ledger.chain_state().sequence, 8);
}
