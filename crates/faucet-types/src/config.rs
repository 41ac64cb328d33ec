//! Grant policy configuration.
//!
//! [`DripConfig`] is validated once at startup and never changes for the
//! lifetime of the process. In config files it looks like:
//!
//! ```json
//! {"amount": 10, "interval_secs": 86400, "count": 3, "fee": "150000uinit"}
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{FaucetError, Result, constants};

/// Per-claim grant policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DripConfig {
    /// Whole units granted per claim (scaled by [`constants::MICRO_UNIT`]).
    pub amount: u64,
    /// Trailing window over which `count` is enforced.
    #[serde(rename = "interval_secs", with = "duration_secs")]
    pub interval: Duration,
    /// Maximum admitted claims per account inside `interval`.
    pub count: u32,
    /// Fee attached to every transfer. May be empty.
    #[serde(
        serialize_with = "serialize_coins",
        deserialize_with = "deserialize_coins"
    )]
    pub fee: Vec<Coin>,
}

impl DripConfig {
    /// Build a validated config.
    ///
    /// # Errors
    /// Returns [`FaucetError::Configuration`] if any field is out of range.
    pub fn new(amount: u64, interval: Duration, count: u32, fee: Vec<Coin>) -> Result<Self> {
        let cfg = Self {
            amount,
            interval,
            count,
            fee,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every invariant the limiter and sequencer rely on.
    pub fn validate(&self) -> Result<()> {
        if self.amount == 0 {
            return Err(FaucetError::Configuration(
                "drip amount must be > 0".to_string(),
            ));
        }
        if self.interval.is_zero() {
            return Err(FaucetError::Configuration(
                "drip interval must be > 0".to_string(),
            ));
        }
        if chrono::Duration::from_std(self.interval).is_err() {
            return Err(FaucetError::Configuration(format!(
                "drip interval of {}s is out of range",
                self.interval.as_secs()
            )));
        }
        if self.count == 0 {
            return Err(FaucetError::Configuration(
                "drip count must be > 0".to_string(),
            ));
        }
        self.grant_amount()?;
        Ok(())
    }

    /// On-ledger amount per claim, in the micro denomination.
    pub fn grant_amount(&self) -> Result<u64> {
        self.amount
            .checked_mul(constants::MICRO_UNIT)
            .ok_or_else(|| {
                FaucetError::Configuration(format!(
                    "drip amount {} overflows when scaled to micro units",
                    self.amount
                ))
            })
    }

    /// `interval` as a signed chrono duration for timestamp arithmetic.
    #[must_use]
    pub fn interval_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.interval).unwrap_or(chrono::Duration::MAX)
    }
}

/// A single asset amount, e.g. `150000uinit`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u64,
}

impl Coin {
    #[must_use]
    pub fn new(denom: impl Into<String>, amount: u64) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = FaucetError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| FaucetError::Configuration(format!("coin {s:?} has no denom")))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() {
            return Err(FaucetError::Configuration(format!(
                "coin {s:?} has no amount"
            )));
        }
        let valid_denom = denom.len() >= 2
            && denom.starts_with(|c: char| c.is_ascii_alphabetic())
            && denom
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
        if !valid_denom {
            return Err(FaucetError::Configuration(format!(
                "coin {s:?} has invalid denom {denom:?}"
            )));
        }
        let amount = amount
            .parse::<u64>()
            .map_err(|e| FaucetError::Configuration(format!("coin {s:?}: {e}")))?;
        Ok(Self::new(denom, amount))
    }
}

/// Parse a comma-separated coin list (`"100uinit,5uusdc"`).
///
/// Zero-amount coins are dropped and denoms are sorted, so `""` and
/// `"0uinit"` both mean "no fee".
pub fn parse_coins(s: &str) -> Result<Vec<Coin>> {
    let mut coins = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let coin: Coin = part.parse()?;
        if coin.amount == 0 {
            continue;
        }
        if coins.iter().any(|c: &Coin| c.denom == coin.denom) {
            return Err(FaucetError::Configuration(format!(
                "duplicate denom {} in {s:?}",
                coin.denom
            )));
        }
        coins.push(coin);
    }
    coins.sort_by(|a, b| a.denom.cmp(&b.denom));
    Ok(coins)
}

fn serialize_coins<S: Serializer>(coins: &[Coin], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let joined = coins
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    serializer.serialize_str(&joined)
}

fn deserialize_coins<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<Coin>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_coins(&raw).map_err(serde::de::Error::custom)
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
