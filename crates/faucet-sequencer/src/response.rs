//! Ledger reply classification.
//!
//! Broadcast replies are deserialized against a typed schema instead of
//! being scraped. A 200 reply that does not match the schema is its own
//! outcome ([`SubmissionOutcome::MalformedResponse`]), distinct from a
//! transport failure or a ledger rejection.

use faucet_types::{FaucetError, Result};
use serde::Deserialize;

use crate::SequencerState;

/// `codespace`/`code` the ledger uses for a wrong account sequence.
const WRONG_SEQUENCE_CODESPACE: &str = "sdk";
const WRONG_SEQUENCE_CODE: u32 = 32;
const SEQUENCE_MISMATCH_MARKER: &str = "sequence mismatch";

/// Classified result of one broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The ledger accepted the transaction. Carries the raw reply body.
    Accepted(String),
    /// The sequence we signed with is not the one the ledger expects.
    SequenceDrift,
    /// The ledger processed and refused the transaction.
    LedgerRejected { code: u32, message: String },
    /// Connection failure or non-200 status: the transfer was not taken.
    TransportError(String),
    /// The request went out but no reply came back in full.
    Unconfirmed(String),
    /// 200 reply that does not match the broadcast schema.
    MalformedResponse(String),
    /// The transaction could not be signed, so nothing was sent.
    SigningFailed(String),
}

#[derive(Debug, Deserialize)]
struct TxResult {
    code: u32,
    #[serde(default)]
    raw_log: String,
    #[serde(default)]
    codespace: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BroadcastReply {
    Wrapped { tx_response: TxResult },
    Flat(TxResult),
}

impl BroadcastReply {
    fn into_result(self) -> TxResult {
        match self {
            Self::Wrapped { tx_response } => tx_response,
            Self::Flat(result) => result,
        }
    }
}

/// Classify a broadcast reply from its HTTP status and body.
#[must_use]
pub fn classify(status: u16, body: &str) -> SubmissionOutcome {
    if status != 200 {
        return SubmissionOutcome::TransportError(format!("status: {status}, message: {body}"));
    }
    // An empty 200 is how the gateway answers a sequence race.
    if body.trim().is_empty() {
        return SubmissionOutcome::SequenceDrift;
    }

    let result = match serde_json::from_str::<BroadcastReply>(body) {
        Ok(reply) => reply.into_result(),
        Err(e) => {
            return SubmissionOutcome::MalformedResponse(format!("{e}: {body}"));
        }
    };

    let wrong_sequence = result.raw_log.contains(SEQUENCE_MISMATCH_MARKER)
        || (result.codespace == WRONG_SEQUENCE_CODESPACE && result.code == WRONG_SEQUENCE_CODE);
    if wrong_sequence {
        return SubmissionOutcome::SequenceDrift;
    }
    if result.code != 0 {
        return SubmissionOutcome::LedgerRejected {
            code: result.code,
            message: result.raw_log,
        };
    }
    SubmissionOutcome::Accepted(body.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Uint {
    Num(u64),
    Str(String),
}

impl Uint {
    fn value(&self) -> Result<u64> {
        match self {
            Self::Num(n) => Ok(*n),
            Self::Str(s) => s
                .parse()
                .map_err(|e| FaucetError::MalformedResponse(format!("bad integer {s:?}: {e}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccountBody {
    account_number: Option<Uint>,
    sequence: Option<Uint>,
    base_account: Option<Box<AccountBody>>,
    base_vesting_account: Option<Box<AccountBody>>,
}

impl AccountBody {
    /// Innermost account object carrying sequence fields.
    fn base(&self) -> &AccountBody {
        if self.account_number.is_some() || self.sequence.is_some() {
            return self;
        }
        if let Some(inner) = &self.base_account {
            return inner.base();
        }
        if let Some(inner) = &self.base_vesting_account {
            return inner.base();
        }
        self
    }
}

#[derive(Debug, Deserialize)]
struct AccountReply {
    account: AccountBody,
}

/// Parse the ledger's account query reply.
///
/// Missing `account_number` / `sequence` mean a never-used account and
/// read as zero.
pub fn parse_account_view(body: &str) -> Result<SequencerState> {
    let reply: AccountReply = serde_json::from_str(body)
        .map_err(|e| FaucetError::MalformedResponse(format!("account view: {e}")))?;
    let base = reply.account.base();
    let account_number = base.account_number.as_ref().map_or(Ok(0), Uint::value)?;
    let sequence = base.sequence.as_ref().map_or(Ok(0), Uint::value)?;
    Ok(SequencerState::new(account_number, sequence))
}
