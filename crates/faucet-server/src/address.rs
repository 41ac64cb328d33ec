//! Recipient address decoding.

use faucet_types::{Account, FaucetError, Result};

/// Turns a user-supplied recipient string into an [`Account`].
pub trait AddressCodec: Send + Sync + 'static {
    fn decode(&self, raw: &str) -> Result<Account>;
}

/// Hex addresses, with or without a `0x` prefix, of 20 or 32 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexAddressCodec;

const ACCEPTED_LENGTHS: [usize; 2] = [20, 32];

impl AddressCodec for HexAddressCodec {
    fn decode(&self, raw: &str) -> Result<Account> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(FaucetError::InvalidAddress {
                reason: "empty address".into(),
            });
        }
        let bytes = hex::decode(digits.to_ascii_lowercase()).map_err(|e| {
            FaucetError::InvalidAddress {
                reason: format!("{raw:?} is not hex: {e}"),
            }
        })?;
        if !ACCEPTED_LENGTHS.contains(&bytes.len()) {
            return Err(FaucetError::InvalidAddress {
                reason: format!("expected 20 or 32 bytes, got {}", bytes.len()),
            });
        }
        Account::from_bytes(bytes)
    }
}
