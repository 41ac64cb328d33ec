//! Per-account claim history.
//!
//! A [`ClaimRecord`] is what the record store keeps for every account that
//! has ever been granted funds. It is created on the first admitted claim,
//! rewritten on each later admission, and never deleted.
//!
//! The serialized layout is kept compatible with existing faucet databases:
//!
//! ```json
//! {"coin_log": {"requested": ["2026-01-01T00:00:00Z"]}, "requested": "2026-01-01T00:00:00Z"}
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{FaucetError, Result};

/// Claim history of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Admitted-claim timestamps, oldest first. Pruned lazily on check.
    #[serde(rename = "coin_log")]
    pub window: ClaimWindow,
    /// Timestamp of the most recent admitted claim.
    #[serde(rename = "requested")]
    pub last_requested_at: DateTime<Utc>,
}

/// Ordered admitted-claim timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimWindow {
    #[serde(rename = "requested", default)]
    pub entries: Vec<DateTime<Utc>>,
}

impl ClaimRecord {
    /// The record written by an account's first admitted claim.
    #[must_use]
    pub fn first(now: DateTime<Utc>) -> Self {
        Self {
            window: ClaimWindow { entries: vec![now] },
            last_requested_at: now,
        }
    }

    /// Time elapsed since the last admitted claim (negative if `now` is
    /// behind the stored clock).
    #[must_use]
    pub fn since_last(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_requested_at
    }

    /// Entries still inside the trailing `interval` as of `now`.
    ///
    /// Pure: the record itself is untouched. An entry whose window end is
    /// past the representable range never expires.
    #[must_use]
    pub fn live_entries(&self, now: DateTime<Utc>, interval: Duration) -> Vec<DateTime<Utc>> {
        self.window
            .entries
            .iter()
            .copied()
            .filter(|at| at.checked_add_signed(interval).is_none_or(|end| end > now))
            .collect()
    }

    /// Record after admitting a claim at `now` on top of `live` entries.
    #[must_use]
    pub fn admitted(mut live: Vec<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        live.push(now);
        Self {
            window: ClaimWindow { entries: live },
            last_requested_at: now,
        }
    }

    /// Number of entries currently stored.
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.window.entries.len()
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| FaucetError::Serialization(e.to_string()))
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| FaucetError::Serialization(e.to_string()))
    }
}
