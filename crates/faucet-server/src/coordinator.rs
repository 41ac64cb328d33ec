//! Grant coordination: admission, then submission, then refund on failure.
//!
//! ```text
//! claim(address)
//!   → AddressCodec.decode              FC_ERR_100 on bad input
//!   → RateLimiter.check (blocking)     FC_ERR_200/201 on deny, sequencer untouched
//!   → SequencerHandle.submit           queued behind earlier claims
//!       ok  → ClaimResponse
//!       err, nothing broadcast → RateLimiter.refund, return the error
//!       err, outcome unknown   → keep the admission, return the error
//! ```
//!
//! Every claim runs inside a `claim` tracing span keyed by a v7 UUID.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use faucet_limiter::{Admission, ClaimDecision, RateLimiter, RecordStore};
use faucet_sequencer::SequencerHandle;
use faucet_types::{Account, DripConfig, FaucetError, Result, Transfer};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::address::{AddressCodec, HexAddressCodec};
use crate::clock::{Clock, SystemClock};

/// Limiter over a type-erased store, as the server runs it.
pub type SharedLimiter = RateLimiter<Arc<dyn RecordStore>>;

/// Successful claim, as returned to the HTTP caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResponse {
    /// Micro-denominated amount sent.
    pub amount: u64,
    /// The ledger's broadcast reply.
    pub response: serde_json::Value,
}

pub struct GrantCoordinator {
    limiter: Arc<SharedLimiter>,
    sequencer: SequencerHandle,
    drip: DripConfig,
    grant_amount: u64,
    codec: Arc<dyn AddressCodec>,
    clock: Arc<dyn Clock>,
}

impl GrantCoordinator {
    pub fn new(limiter: SharedLimiter, sequencer: SequencerHandle, drip: DripConfig) -> Result<Self> {
        drip.validate()?;
        let grant_amount = drip.grant_amount()?;
        Ok(Self {
            limiter: Arc::new(limiter),
            sequencer,
            drip,
            grant_amount,
            codec: Arc::new(HexAddressCodec),
            clock: Arc::new(SystemClock),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn AddressCodec>) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn limiter(&self) -> &SharedLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn sequencer(&self) -> &SequencerHandle {
        &self.sequencer
    }

    #[must_use]
    pub fn grant_amount(&self) -> u64 {
        self.grant_amount
    }

    /// Admit, fund, and report one claim for `address`.
    pub async fn claim(&self, address: &str) -> Result<ClaimResponse> {
        let claim_id = Uuid::now_v7();
        self.run_claim(address)
            .instrument(tracing::info_span!("claim", %claim_id))
            .await
    }

    async fn run_claim(&self, address: &str) -> Result<ClaimResponse> {
        let account = self.codec.decode(address)?;
        let now = self.clock.now();

        let admission = match self.check(account.clone(), now).await? {
            ClaimDecision::Admit(admission) => admission,
            ClaimDecision::Deny(reason) => {
                tracing::info!(account = %account, ?reason, "claim refused");
                return Err(reason.into_error(account));
            }
        };

        let transfer = Transfer {
            recipient: account.clone(),
            amount: self.grant_amount,
            fee: self.drip.fee.clone(),
        };
        match self.sequencer.submit(transfer).await {
            Ok(report) => {
                tracing::info!(
                    account = %account,
                    amount = self.grant_amount,
                    sequence = report.sequence_used,
                    "claim funded"
                );
                let response = serde_json::from_str(&report.body)
                    .unwrap_or(serde_json::Value::String(report.body));
                Ok(ClaimResponse {
                    amount: self.grant_amount,
                    response,
                })
            }
            Err(err) if err.may_have_broadcast() => {
                tracing::warn!(
                    account = %account,
                    error = %err,
                    "transfer may have landed, admission kept"
                );
                Err(err)
            }
            Err(err) => {
                self.refund(admission).await;
                Err(err)
            }
        }
    }

    async fn check(&self, account: Account, now: DateTime<Utc>) -> Result<ClaimDecision> {
        let limiter = Arc::clone(&self.limiter);
        let drip = self.drip.clone();
        tokio::task::spawn_blocking(move || limiter.check(&account, now, &drip))
            .await
            .map_err(|e| FaucetError::Internal(format!("limiter task: {e}")))?
    }

    /// Best effort: the submission error is what the caller sees.
    async fn refund(&self, admission: Admission) {
        let limiter = Arc::clone(&self.limiter);
        let account = admission.account.clone();
        let result = tokio::task::spawn_blocking(move || limiter.refund(&admission)).await;
        match result {
            Ok(Ok(restored)) => tracing::info!(account = %account, restored, "admission refunded"),
            Ok(Err(e)) => tracing::error!(account = %account, error = %e, "refund failed"),
            Err(e) => tracing::error!(account = %account, error = %e, "refund task failed"),
        }
    }
}
