//! Error types for the drip faucet.
//!
//! All errors use the `FC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Request validation errors
//! - 2xx: Rate limit errors
//! - 3xx: Ledger / sequencer errors
//! - 4xx: Record store errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::Account;

/// Central error enum for all faucet operations.
#[derive(Debug, Error)]
pub enum FaucetError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The recipient identifier could not be decoded.
    #[error("FC_ERR_100: Invalid address: {reason}")]
    InvalidAddress { reason: String },

    /// The request body was malformed.
    #[error("FC_ERR_101: Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // =================================================================
    // Rate Limit Errors (2xx)
    // =================================================================
    /// The account claimed less than the minimum spacing ago.
    #[error(
        "FC_ERR_200: exceed request limit\nAccount Addr: {account}\n\n\
         The account has recently received funds from the faucet!\n\
         Please try again in {retry_after_secs}s"
    )]
    ClaimTooSoon {
        account: Account,
        retry_after_secs: i64,
    },

    /// The account used its whole quota inside the trailing window.
    #[error(
        "FC_ERR_201: exceed request limit\nAccount Addr: {account}\n\n\
         The account has already received {count} grants in the last {interval_secs}s!\n\
         Please try again a bit later"
    )]
    QuotaExceeded {
        account: Account,
        count: u32,
        interval_secs: u64,
    },

    // =================================================================
    // Ledger / Sequencer Errors (3xx)
    // =================================================================
    /// The broadcast never reached the ledger, or came back non-200.
    #[error("FC_ERR_300: Ledger transport error: {0}")]
    Transport(String),

    /// The ledger processed the transaction and rejected it.
    #[error("FC_ERR_301: {message}")]
    LedgerRejected { code: u32, message: String },

    /// A 200 response whose body does not match the expected schema.
    #[error("FC_ERR_302: Malformed ledger response: {0}")]
    MalformedResponse(String),

    /// Sequence drift persisted through every resync attempt.
    #[error("FC_ERR_303: Sequence drift persisted after {attempts} attempts")]
    SequenceDriftExhausted { attempts: u32 },

    /// The sequencer worker has stopped.
    #[error("FC_ERR_304: Sequencer unavailable")]
    SequencerUnavailable,

    /// The broadcast was sent but its reply was lost (timeout, broken body).
    #[error("FC_ERR_305: Broadcast outcome unknown: {0}")]
    BroadcastUnconfirmed(String),

    // =================================================================
    // Store Errors (4xx)
    // =================================================================
    /// The claim-history store failed to read or write.
    #[error("FC_ERR_400: Record store error: {0}")]
    Store(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FC_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("FC_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("FC_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("FC_ERR_903: I/O error: {0}")]
    Io(String),
}

impl FaucetError {
    /// Whether the caller, rather than the faucet or ledger, is at fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress { .. }
                | Self::InvalidRequest { .. }
                | Self::ClaimTooSoon { .. }
                | Self::QuotaExceeded { .. }
        )
    }

    /// Whether the transfer may have reached the ledger despite the error.
    ///
    /// Only a failure that proves nothing was broadcast may give a claim
    /// back to the account.
    #[must_use]
    pub fn may_have_broadcast(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse(_) | Self::BroadcastUnconfirmed(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FaucetError>;

// Conversion from std::io::Error
impl From<std::io::Error> for FaucetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
