//! # faucet-server
//!
//! **Outer shell** of the drip faucet: configuration, recipient decoding,
//! the grant coordinator, and the HTTP router the `drip-faucet` binary
//! serves.
//!
//! ## Architecture
//!
//! ```text
//! POST /claim → GrantCoordinator.claim
//!                 ├─ AddressCodec     (hex → Account)
//!                 ├─ RateLimiter      (faucet-limiter, on a blocking thread)
//!                 └─ SequencerHandle  (faucet-sequencer worker queue)
//! ```
//!
//! The coordinator holds no locks of its own: the limiter serializes per
//! account and the sequencer serializes globally.

pub mod address;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod http;
pub mod telemetry;

pub use address::{AddressCodec, HexAddressCodec};
#[cfg(any(test, feature = "test-helpers"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use config::FaucetConfig;
pub use coordinator::{ClaimResponse, GrantCoordinator, SharedLimiter};
