//! Tracing subscriber setup for the binary.

use faucet_types::{FaucetError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG`, when set, wins over `filter`.
pub fn init(filter: &str, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .map_err(|e| FaucetError::Configuration(format!("log filter {filter:?}: {e}")))?;

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| FaucetError::Internal(format!("tracing subscriber: {e}")))
}
