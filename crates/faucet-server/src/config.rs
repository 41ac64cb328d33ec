//! Process configuration.
//!
//! Loaded once at startup from a JSON file, then overridden from the
//! environment (`FAUCET_*`). The funding key is normally supplied only
//! through `FAUCET_SIGNER_KEY` so it never has to live in the file.
//!
//! ```json
//! {
//!   "home": "/var/lib/drip-faucet",
//!   "port": 4000,
//!   "rest_url": "https://rest.testnet.example",
//!   "chain_id": "testnet-1",
//!   "drip": {"amount": 10, "interval_secs": 86400, "count": 3, "fee": "150000uinit"},
//!   "allowed_origins": ["https://faucet.example"]
//! }
//! ```

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use faucet_sequencer::RetryPolicy;
use faucet_types::{DripConfig, FaucetError, Result, constants};
use serde::{Deserialize, Serialize};

pub const ENV_SIGNER_KEY: &str = "FAUCET_SIGNER_KEY";
pub const ENV_PORT: &str = "FAUCET_PORT";
pub const ENV_REST_URL: &str = "FAUCET_REST_URL";
pub const ENV_CHAIN_ID: &str = "FAUCET_CHAIN_ID";
pub const ENV_HOME: &str = "FAUCET_HOME";
pub const ENV_ALLOWED_ORIGINS: &str = "FAUCET_ALLOWED_ORIGINS";

const DEFAULT_LEDGER_TIMEOUT_SECS: u64 = 10;

/// Validated, immutable process configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct FaucetConfig {
    /// Root for on-disk state. Claim records live under `home/db/faucetdb`.
    pub home: PathBuf,
    #[serde(default = "default_port")]
    pub port: u16,
    pub rest_url: String,
    pub chain_id: String,
    /// Hex-encoded 32-byte ed25519 secret of the funding account.
    #[serde(default)]
    pub signer_key: String,
    pub drip: DripConfig,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_denom")]
    pub denom: String,
    #[serde(default = "default_ledger_timeout_secs")]
    pub ledger_timeout_secs: u64,
    /// Linear backoff before each drift resync. Zero retries immediately.
    #[serde(default)]
    pub retry_backoff_ms: u64,
}

fn default_port() -> u16 {
    constants::DEFAULT_PORT
}

fn default_denom() -> String {
    constants::DEFAULT_DENOM.to_string()
}

fn default_ledger_timeout_secs() -> u64 {
    DEFAULT_LEDGER_TIMEOUT_SECS
}

impl FaucetConfig {
    /// Read `path`, apply process environment overrides, validate.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FaucetError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut cfg = Self::from_json(&raw)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse without overrides or validation.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| FaucetError::Configuration(format!("config file: {e}")))
    }

    /// Apply `FAUCET_*` overrides. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_SIGNER_KEY) {
            self.signer_key = key;
        }
        if let Some(port) = get(ENV_PORT) {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(e) => tracing::warn!(%port, error = %e, "ignoring invalid {ENV_PORT}"),
            }
        }
        if let Some(url) = get(ENV_REST_URL) {
            self.rest_url = url;
        }
        if let Some(chain_id) = get(ENV_CHAIN_ID) {
            self.chain_id = chain_id;
        }
        if let Some(home) = get(ENV_HOME) {
            self.home = PathBuf::from(home);
        }
        if let Some(origins) = get(ENV_ALLOWED_ORIGINS) {
            self.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    /// Normalize and check every field.
    pub fn validate(&mut self) -> Result<()> {
        self.rest_url = self.rest_url.trim().trim_end_matches('/').to_string();
        if self.rest_url.is_empty() {
            return Err(FaucetError::Configuration("rest_url is required".into()));
        }
        if self.chain_id.trim().is_empty() {
            return Err(FaucetError::Configuration("chain_id is required".into()));
        }
        if self.signer_key.trim().is_empty() {
            return Err(FaucetError::Configuration(format!(
                "signer key is required (set {ENV_SIGNER_KEY})"
            )));
        }
        if self.denom.trim().is_empty() {
            return Err(FaucetError::Configuration("denom is required".into()));
        }
        if self.ledger_timeout_secs == 0 {
            return Err(FaucetError::Configuration(
                "ledger_timeout_secs must be > 0".into(),
            ));
        }
        if self.allowed_origins.is_empty() {
            return Err(FaucetError::Configuration(format!(
                "at least one allowed origin is required (set {ENV_ALLOWED_ORIGINS})"
            )));
        }
        if !self.home.is_dir() {
            return Err(FaucetError::Configuration(format!(
                "home {} is not an existing directory",
                self.home.display()
            )));
        }
        self.drip.validate()
    }

    /// Directory of the claim-record store.
    #[must_use]
    pub fn db_dir(&self) -> PathBuf {
        self.home.join("db").join("faucetdb")
    }

    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    #[must_use]
    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_timeout_secs)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            constants::MAX_DRIFT_RETRIES,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }
}

impl fmt::Debug for FaucetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaucetConfig")
            .field("home", &self.home)
            .field("port", &self.port)
            .field("rest_url", &self.rest_url)
            .field("chain_id", &self.chain_id)
            .field("signer_key", &"REDACTED")
            .field("drip", &self.drip)
            .field("allowed_origins", &self.allowed_origins)
            .field("denom", &self.denom)
            .field("ledger_timeout_secs", &self.ledger_timeout_secs)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}
