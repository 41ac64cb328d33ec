//! Sliding-window claim limiter.
//!
//! Two independent gates guard every claim:
//!
//! - a hard-coded minimum spacing ([`constants::MIN_CLAIM_SPACING_SECS`])
//!   between any two admitted claims of one account, and
//! - a trailing window allowing at most `count` admissions per `interval`.
//!
//! The window is exact (no fixed buckets), so there is no boundary-reset
//! burst. Check and commit happen under one per-account lock: two
//! concurrent claims for the same account can never both read the old
//! record and both be admitted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use faucet_types::{Account, ClaimRecord, DripConfig, FaucetError, Result, constants};
use parking_lot::Mutex;

use crate::store::RecordStore;

/// Result of a claim check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimDecision {
    /// The claim was admitted and the new record is already persisted.
    Admit(Admission),
    /// The claim was refused. Nothing was written.
    Deny(DenyReason),
}

impl ClaimDecision {
    #[must_use]
    pub fn is_admit(&self) -> bool {
        matches!(self, Self::Admit(_))
    }
}

/// Why a claim was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Less than the minimum spacing since the last admitted claim.
    TooSoon { retry_after: Duration },
    /// `count` admissions already inside the trailing `interval`.
    QuotaExceeded { count: u32, interval: Duration },
}

impl DenyReason {
    /// Turn the denial into the client-facing error naming `account`.
    #[must_use]
    pub fn into_error(self, account: Account) -> FaucetError {
        match self {
            Self::TooSoon { retry_after } => FaucetError::ClaimTooSoon {
                account,
                retry_after_secs: ceil_secs(retry_after),
            },
            Self::QuotaExceeded { count, interval } => FaucetError::QuotaExceeded {
                account,
                count,
                interval_secs: u64::try_from(interval.num_seconds()).unwrap_or(0),
            },
        }
    }
}

/// Proof of an admitted claim, needed to refund it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub account: Account,
    pub at: DateTime<Utc>,
    /// Record before this admission (`None` for a first claim).
    previous: Option<ClaimRecord>,
    /// Record this admission persisted.
    written: ClaimRecord,
}

impl Admission {
    #[must_use]
    pub fn record(&self) -> &ClaimRecord {
        &self.written
    }
}

/// Per-account claim limiter over a [`RecordStore`].
pub struct RateLimiter<S> {
    store: S,
    /// One lock per account with a check or refund in flight.
    locks: Mutex<HashMap<Account, Arc<Mutex<()>>>>,
}

impl<S: RecordStore> RateLimiter<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decide whether `account` may claim at `now`, committing on admit.
    ///
    /// # Errors
    /// Returns [`FaucetError::Store`] if the record cannot be read or written.
    /// A store failure is never turned into an admit.
    pub fn check(
        &self,
        account: &Account,
        now: DateTime<Utc>,
        config: &DripConfig,
    ) -> Result<ClaimDecision> {
        self.with_account_lock(account, || {
            let previous = self.store.get(account)?;

            let written = match &previous {
                None => ClaimRecord::first(now),
                Some(record) => {
                    if let Some(reason) = Self::evaluate(record, now, config) {
                        tracing::debug!(
                            account = %account,
                            ?reason,
                            "claim denied"
                        );
                        return Ok(ClaimDecision::Deny(reason));
                    }
                    let live = record.live_entries(now, config.interval_chrono());
                    ClaimRecord::admitted(live, now)
                }
            };

            self.store.put(account, &written)?;
            tracing::info!(
                account = %account,
                window = written.window_len(),
                first = previous.is_none(),
                "claim admitted"
            );

            Ok(ClaimDecision::Admit(Admission {
                account: account.clone(),
                at: now,
                previous,
                written,
            }))
        })
    }

    /// Undo an admission whose grant never reached the ledger.
    ///
    /// If the stored record is still the one the admission wrote, the
    /// previous record is restored (or removed for a first claim). If a
    /// later admission already replaced it, only this admission's window
    /// entry is dropped. Either way `last_requested_at` ends up at the
    /// latest admission still standing. Returns whether anything changed.
    pub fn refund(&self, admission: &Admission) -> Result<bool> {
        let account = &admission.account;
        self.with_account_lock(account, || {
            let Some(current) = self.store.get(account)? else {
                return Ok(false);
            };

            if current == admission.written {
                match &admission.previous {
                    Some(prev) => self.store.put(account, prev)?,
                    None => self.store.remove(account)?,
                }
                tracing::info!(account = %account, "claim refunded");
                return Ok(true);
            }

            let mut trimmed = current.clone();
            trimmed.window.entries.retain(|at| *at != admission.at);
            if trimmed == current {
                return Ok(false);
            }
            if trimmed.last_requested_at == admission.at {
                let fallback = admission.previous.as_ref().map(|p| p.last_requested_at);
                match trimmed.window.entries.iter().max().copied().or(fallback) {
                    Some(last) => trimmed.last_requested_at = last,
                    None => {
                        self.store.remove(account)?;
                        tracing::info!(account = %account, "claim refunded from superseded record");
                        return Ok(true);
                    }
                }
            }
            self.store.put(account, &trimmed)?;
            tracing::info!(account = %account, "claim refunded from superseded record");
            Ok(true)
        })
    }

    /// Pure admission rules against an existing record.
    fn evaluate(record: &ClaimRecord, now: DateTime<Utc>, config: &DripConfig) -> Option<DenyReason> {
        let spacing = Duration::seconds(constants::MIN_CLAIM_SPACING_SECS);
        let since_last = record.since_last(now);
        if since_last < spacing {
            return Some(DenyReason::TooSoon {
                retry_after: spacing - since_last,
            });
        }

        let interval = config.interval_chrono();
        let live = record.live_entries(now, interval);
        let count = usize::try_from(config.count).unwrap_or(usize::MAX);
        if live.len() >= count {
            return Some(DenyReason::QuotaExceeded {
                count: config.count,
                interval,
            });
        }
        None
    }

    fn with_account_lock<T>(&self, account: &Account, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = Arc::clone(self.locks.lock().entry(account.clone()).or_default());
        let out = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);

        // Only the map holds it now: nobody is waiting, drop the entry.
        let mut locks = self.locks.lock();
        if locks.get(account).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(account);
        }
        out
    }

    /// Accounts with a check or refund currently holding a lock entry.
    #[must_use]
    pub fn active_locks(&self) -> usize {
        self.locks.lock().len()
    }
}

fn ceil_secs(d: Duration) -> i64 {
    let secs = d.num_seconds();
    if d > Duration::seconds(secs) { secs + 1 } else { secs }
}
