//! Account identifiers.
//!
//! An [`Account`] is the raw address bytes of a ledger account. It is the
//! key of the claim-history store and the recipient of every transfer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FaucetError, Result, constants};

/// Raw ledger address bytes. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>")]
pub struct Account(Vec<u8>);

impl TryFrom<Vec<u8>> for Account {
    type Error = FaucetError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl Account {
    /// Wrap raw address bytes.
    ///
    /// # Errors
    /// Returns [`FaucetError::InvalidAddress`] if `bytes` is empty or longer
    /// than [`constants::MAX_ACCOUNT_BYTES`].
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(FaucetError::InvalidAddress {
                reason: "empty address".to_string(),
            });
        }
        if bytes.len() > constants::MAX_ACCOUNT_BYTES {
            return Err(FaucetError::InvalidAddress {
                reason: format!(
                    "address is {} bytes, max {}",
                    bytes.len(),
                    constants::MAX_ACCOUNT_BYTES
                ),
            });
        }
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex without prefix. Used as the on-disk store key.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Short form for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..self.0.len().min(4)])
    }

    /// Deterministic account for tests.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn dummy(seed: u8) -> Self {
        Self(vec![seed; 20])
    }

    /// Random 20-byte account for tests.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = vec![0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}
