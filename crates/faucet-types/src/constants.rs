//! System-wide constants for the drip faucet.

/// Hard floor between two admitted claims for the same account, in seconds.
///
/// Independent of the configured window: a generous `interval`/`count`
/// still cannot be replayed faster than this.
pub const MIN_CLAIM_SPACING_SECS: i64 = 30;

/// Number of additional attempts after a sequence drift before giving up.
pub const MAX_DRIFT_RETRIES: u32 = 3;

/// Whole units are scaled by this factor into the micro denomination.
pub const MICRO_UNIT: u64 = 1_000_000;

/// Default on-ledger denomination of the granted asset.
pub const DEFAULT_DENOM: &str = "uinit";

/// Gas limit attached to every transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 1_500_000;

/// Memo attached to every transfer.
pub const TRANSFER_MEMO: &str = "faucet";

/// Ledger broadcast mode (returns after CheckTx).
pub const BROADCAST_MODE: &str = "BROADCAST_MODE_SYNC";

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 4000;

/// Maximum accepted `/claim` body size in bytes.
pub const MAX_CLAIM_BODY_BYTES: usize = 4096;

/// Longest raw account identifier accepted, in bytes.
pub const MAX_ACCOUNT_BYTES: usize = 64;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
