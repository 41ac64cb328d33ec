//! Transfer signing.
//!
//! The ledger's native transaction encoding lives behind [`TxSigner`]. The
//! bundled [`Ed25519TxSigner`] signs a canonical JSON sign-document and
//! emits `{"sign_doc", "pub_key", "signature"}` as the transaction bytes.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use faucet_types::{Account, Coin, FaucetError, Result, constants};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::TransferTx;

/// Turns a pinned transfer into broadcastable transaction bytes.
pub trait TxSigner: Send + Sync + 'static {
    /// The funding account that signs every transfer.
    fn funding_account(&self) -> &Account;

    fn sign(&self, tx: &TransferTx) -> Result<Vec<u8>>;
}

/// Everything a signature commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignDoc {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub from: String,
    pub to: String,
    pub amount: Coin,
    pub fee: Vec<Coin>,
    pub gas_limit: u64,
    pub memo: String,
    pub timeout_height: u64,
}

/// Signed transaction envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    pub sign_doc: SignDoc,
    /// Hex-encoded ed25519 public key.
    pub pub_key: String,
    /// Hex-encoded signature over the JSON-encoded `sign_doc`.
    pub signature: String,
}

impl SignedTx {
    /// Check the signature against the embedded public key.
    pub fn verify(&self) -> Result<()> {
        let key_bytes: [u8; 32] = hex::decode(&self.pub_key)
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| FaucetError::Serialization("bad public key".into()))?;
        let sig_bytes: [u8; 64] = hex::decode(&self.signature)
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| FaucetError::Serialization("bad signature".into()))?;
        let key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| FaucetError::Serialization(e.to_string()))?;
        let msg = serde_json::to_vec(&self.sign_doc)
            .map_err(|e| FaucetError::Serialization(e.to_string()))?;
        key.verify_strict(&msg, &ed25519_dalek::Signature::from_bytes(&sig_bytes))
            .map_err(|e| FaucetError::Serialization(format!("signature: {e}")))
    }
}

/// Ed25519 signer for the funding key.
pub struct Ed25519TxSigner {
    key: SigningKey,
    account: Account,
    chain_id: String,
    denom: String,
}

impl Ed25519TxSigner {
    pub fn new(key: SigningKey, chain_id: impl Into<String>, denom: impl Into<String>) -> Result<Self> {
        let account = derive_account(&key.verifying_key())?;
        Ok(Self {
            key,
            account,
            chain_id: chain_id.into(),
            denom: denom.into(),
        })
    }

    /// Build from a hex-encoded 32-byte secret key.
    pub fn from_hex(secret_hex: &str, chain_id: impl Into<String>, denom: impl Into<String>) -> Result<Self> {
        let bytes: [u8; 32] = hex::decode(secret_hex.trim().trim_start_matches("0x"))
            .map_err(|e| FaucetError::Configuration(format!("signer key is not hex: {e}")))?
            .try_into()
            .map_err(|_| FaucetError::Configuration("signer key must be 32 bytes".into()))?;
        Self::new(SigningKey::from_bytes(&bytes), chain_id, denom)
    }

    #[must_use]
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// The document a transfer signs.
    #[must_use]
    pub fn sign_doc(&self, tx: &TransferTx) -> SignDoc {
        SignDoc {
            chain_id: self.chain_id.clone(),
            account_number: tx.account_number,
            sequence: tx.sequence,
            from: self.account.to_string(),
            to: tx.transfer.recipient.to_string(),
            amount: Coin::new(self.denom.clone(), tx.transfer.amount),
            fee: tx.transfer.fee.clone(),
            gas_limit: constants::TRANSFER_GAS_LIMIT,
            memo: constants::TRANSFER_MEMO.to_string(),
            timeout_height: 0,
        }
    }
}

impl TxSigner for Ed25519TxSigner {
    fn funding_account(&self) -> &Account {
        &self.account
    }

    fn sign(&self, tx: &TransferTx) -> Result<Vec<u8>> {
        let sign_doc = self.sign_doc(tx);
        let msg = serde_json::to_vec(&sign_doc)
            .map_err(|e| FaucetError::Serialization(e.to_string()))?;
        let signature = self.key.sign(&msg);
        let signed = SignedTx {
            sign_doc,
            pub_key: hex::encode(self.key.verifying_key().as_bytes()),
            signature: hex::encode(signature.to_bytes()),
        };
        serde_json::to_vec(&signed).map_err(|e| FaucetError::Serialization(e.to_string()))
    }
}

/// Funding address: first 20 bytes of `sha256(public key)`.
pub fn derive_account(key: &VerifyingKey) -> Result<Account> {
    let digest = Sha256::digest(key.as_bytes());
    Account::from_bytes(&digest[..20])
}
