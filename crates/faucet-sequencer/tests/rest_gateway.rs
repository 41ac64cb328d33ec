//! # REST Gateway Integration
//!
//! Runs [`RestLedgerClient`] against an in-process axum gateway that
//! decodes the signed transaction, verifies it, and enforces the account
//! sequence the way the real ledger does.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use faucet_sequencer::signer::SignedTx;
use faucet_sequencer::{
    Ed25519TxSigner, LedgerClient, RestLedgerClient, RetryPolicy, Sequencer, SequencerState,
    SubmissionOutcome, TransferTx, TxSigner, spawn,
};
use faucet_types::{Account, Coin, FaucetError, Transfer};
use parking_lot::Mutex;
use serde_json::{Value, json};

#[derive(Default)]
struct Gateway {
    account_number: u64,
    sequence: u64,
    accepted: Vec<SignedTx>,
    /// Answer the next N broadcasts with an empty 200.
    empty_replies: usize,
    /// Answer the next broadcast with this status.
    fail_status: Option<u16>,
    /// Hold the next broadcast this long before answering.
    stall: Option<Duration>,
    broadcasts: usize,
}

type Shared = Arc<Mutex<Gateway>>;

async fn account(State(gw): State<Shared>, Path(address): Path<String>) -> impl IntoResponse {
    let gw = gw.lock();
    Json(json!({
        "account": {
            "@type": "/cosmos.auth.v1beta1.BaseAccount",
            "address": address,
            "account_number": gw.account_number.to_string(),
            "sequence": gw.sequence.to_string(),
        }
    }))
}

async fn broadcast(State(gw): State<Shared>, Json(req): Json<Value>) -> impl IntoResponse {
    let stall = gw.lock().stall.take();
    if let Some(delay) = stall {
        tokio::time::sleep(delay).await;
    }
    let mut gw = gw.lock();
    gw.broadcasts += 1;
    assert_eq!(req["mode"], "BROADCAST_MODE_SYNC");

    if let Some(status) = gw.fail_status.take() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "gateway down".to_string());
    }
    if gw.empty_replies > 0 {
        gw.empty_replies -= 1;
        return (StatusCode::OK, String::new());
    }

    let bytes = BASE64
        .decode(req["tx_bytes"].as_str().unwrap_or_default())
        .unwrap_or_default();
    let Ok(signed) = serde_json::from_slice::<SignedTx>(&bytes) else {
        let body = json!({"tx_response": {"code": 2, "codespace": "sdk", "raw_log": "tx parse error"}});
        return (StatusCode::OK, body.to_string());
    };
    if signed.verify().is_err() {
        let body = json!({"tx_response": {"code": 4, "codespace": "sdk", "raw_log": "signature verification failed"}});
        return (StatusCode::OK, body.to_string());
    }
    if signed.sign_doc.sequence != gw.sequence {
        let body = json!({"tx_response": {
            "code": 32,
            "codespace": "sdk",
            "raw_log": format!(
                "account sequence mismatch, expected {}, got {}: incorrect account sequence",
                gw.sequence, signed.sign_doc.sequence
            ),
        }});
        return (StatusCode::OK, body.to_string());
    }

    gw.sequence += 1;
    gw.accepted.push(signed);
    let body = json!({"tx_response": {"txhash": format!("{:064X}", gw.sequence), "code": 0, "raw_log": "[]"}});
    (StatusCode::OK, body.to_string())
}

async fn start_gateway(gw: Shared) -> String {
    let router = Router::new()
        .route("/cosmos/auth/v1beta1/accounts/:address", get(account))
        .route("/cosmos/tx/v1beta1/txs", post(broadcast))
        .with_state(gw);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}/")
}

fn client(url: &str) -> RestLedgerClient<Ed25519TxSigner> {
    let signer = Ed25519TxSigner::from_hex(&"2a".repeat(32), "drip-test-1", "uinit").unwrap();
    RestLedgerClient::new(url, signer, Duration::from_secs(5)).unwrap()
}

fn transfer() -> Transfer {
    Transfer {
        recipient: Account::dummy(0x33),
        amount: 10_000_000,
        fee: vec![Coin::new("uinit", 150_000)],
    }
}

#[tokio::test]
async fn account_view_reads_string_fields() {
    let gw: Shared = Arc::new(Mutex::new(Gateway {
        account_number: 12,
        sequence: 345,
        ..Gateway::default()
    }));
    let url = start_gateway(Arc::clone(&gw)).await;

    let state = client(&url).account_view().await.unwrap();
    assert_eq!(state, SequencerState::new(12, 345));
}

#[tokio::test]
async fn signed_broadcast_is_accepted() {
    let gw: Shared = Arc::new(Mutex::new(Gateway {
        account_number: 3,
        sequence: 8,
        ..Gateway::default()
    }));
    let url = start_gateway(Arc::clone(&gw)).await;
    let client = client(&url);
    let from = client.signer().funding_account().to_string();

    let outcome = client
        .submit(&TransferTx::new(transfer(), SequencerState::new(3, 8)))
        .await;
    assert!(matches!(outcome, SubmissionOutcome::Accepted(_)));

    let gw = gw.lock();
    assert_eq!(gw.sequence, 9);
    let doc = &gw.accepted[0].sign_doc;
    assert_eq!(doc.chain_id, "drip-test-1");
    assert_eq!(doc.from, from);
    assert_eq!(doc.to, Account::dummy(0x33).to_string());
    assert_eq!(doc.fee, vec![Coin::new("uinit", 150_000)]);
}

#[tokio::test]
async fn wrong_sequence_and_empty_reply_are_drift() {
    let gw: Shared = Arc::new(Mutex::new(Gateway {
        sequence: 5,
        empty_replies: 1,
        ..Gateway::default()
    }));
    let url = start_gateway(Arc::clone(&gw)).await;
    let client = client(&url);

    let tx = TransferTx::new(transfer(), SequencerState::new(0, 4));
    assert_eq!(client.submit(&tx).await, SubmissionOutcome::SequenceDrift);
    assert_eq!(client.submit(&tx).await, SubmissionOutcome::SequenceDrift);
}

#[tokio::test]
async fn gateway_error_status_is_transport() {
    let gw: Shared = Arc::new(Mutex::new(Gateway {
        fail_status: Some(503),
        ..Gateway::default()
    }));
    let url = start_gateway(Arc::clone(&gw)).await;

    let outcome = client(&url)
        .submit(&TransferTx::new(transfer(), SequencerState::default()))
        .await;
    assert_eq!(
        outcome,
        SubmissionOutcome::TransportError("status: 503, message: gateway down".into())
    );
}

#[tokio::test]
async fn unreachable_gateway_is_transport() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("http://{addr}"));
    let err = client.account_view().await.unwrap_err();
    assert!(matches!(err, FaucetError::Transport(_)));
    let outcome = client
        .submit(&TransferTx::new(transfer(), SequencerState::default()))
        .await;
    assert!(matches!(outcome, SubmissionOutcome::TransportError(_)));
}

#[tokio::test]
async fn lost_reply_is_unconfirmed() {
    let gw: Shared = Arc::new(Mutex::new(Gateway {
        stall: Some(Duration::from_secs(3)),
        ..Gateway::default()
    }));
    let url = start_gateway(Arc::clone(&gw)).await;
    let signer = Ed25519TxSigner::from_hex(&"2a".repeat(32), "drip-test-1", "uinit").unwrap();
    let client = RestLedgerClient::new(&url, signer, Duration::from_millis(200)).unwrap();

    let outcome = client
        .submit(&TransferTx::new(transfer(), SequencerState::default()))
        .await;
    assert!(matches!(outcome, SubmissionOutcome::Unconfirmed(_)), "{outcome:?}");
}

struct BrokenSigner(Account);

impl TxSigner for BrokenSigner {
    fn funding_account(&self) -> &Account {
        &self.0
    }

    fn sign(&self, _tx: &TransferTx) -> faucet_types::Result<Vec<u8>> {
        Err(FaucetError::Serialization("key unavailable".into()))
    }
}

#[tokio::test]
async fn signing_failure_never_hits_the_network() {
    let gw: Shared = Arc::new(Mutex::new(Gateway::default()));
    let url = start_gateway(Arc::clone(&gw)).await;
    let client =
        RestLedgerClient::new(&url, BrokenSigner(Account::dummy(0x01)), Duration::from_secs(5)).unwrap();

    let outcome = client
        .submit(&TransferTx::new(transfer(), SequencerState::default()))
        .await;
    assert!(matches!(outcome, SubmissionOutcome::SigningFailed(ref e) if e.contains("key unavailable")));
    assert_eq!(gw.lock().broadcasts, 0);

    let mut seq = Sequencer::with_state(client, SequencerState::default(), RetryPolicy::default());
    let err = seq.submit(&transfer()).await.unwrap_err();
    assert!(matches!(err, FaucetError::Internal(_)), "{err}");
    assert!(!err.may_have_broadcast());
}

#[tokio::test]
async fn worker_over_rest_recovers_from_external_spend() {
    let gw: Shared = Arc::new(Mutex::new(Gateway {
        account_number: 1,
        sequence: 0,
        ..Gateway::default()
    }));
    let url = start_gateway(Arc::clone(&gw)).await;
    let seq = Sequencer::connect(client(&url), RetryPolicy::default())
        .await
        .unwrap();
    let (handle, _task) = spawn(seq);

    handle.submit(transfer()).await.unwrap();
    gw.lock().sequence += 3;

    let report = handle.submit(transfer()).await.unwrap();
    assert_eq!(report.attempts, 2);
    assert_eq!(report.sequence_used, 4);
    assert_eq!(gw.lock().accepted.len(), 2);
}
