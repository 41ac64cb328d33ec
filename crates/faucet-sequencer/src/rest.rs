//! HTTP ledger client.
//!
//! Talks to the ledger's REST gateway:
//! - `GET  {rest}/cosmos/auth/v1beta1/accounts/{address}` for the account view
//! - `POST {rest}/cosmos/tx/v1beta1/txs` with `{"tx_bytes", "mode"}` to broadcast

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use faucet_types::{FaucetError, Result, constants};
use serde::Serialize;

use crate::{LedgerClient, SequencerState, SubmissionOutcome, TransferTx, TxSigner, parse_account_view};

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    tx_bytes: String,
    mode: &'a str,
}

/// [`LedgerClient`] over the REST gateway, signing with `S`.
pub struct RestLedgerClient<S> {
    http: reqwest::Client,
    rest_url: String,
    signer: S,
}

impl<S: TxSigner> RestLedgerClient<S> {
    /// `rest_url` may carry a trailing slash; it is trimmed.
    pub fn new(rest_url: &str, signer: S, timeout: Duration) -> Result<Self> {
        let rest_url = rest_url.trim().trim_end_matches('/').to_string();
        if rest_url.is_empty() {
            return Err(FaucetError::Configuration("rest url is empty".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FaucetError::Configuration(format!("http client: {e}")))?;
        Ok(Self {
            http,
            rest_url,
            signer,
        })
    }

    #[must_use]
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    #[must_use]
    pub fn signer(&self) -> &S {
        &self.signer
    }

    fn account_url(&self) -> String {
        format!(
            "{}/cosmos/auth/v1beta1/accounts/{}",
            self.rest_url,
            self.signer.funding_account()
        )
    }

    fn broadcast_url(&self) -> String {
        format!("{}/cosmos/tx/v1beta1/txs", self.rest_url)
    }
}

impl<S: TxSigner> LedgerClient for RestLedgerClient<S> {
    async fn account_view(&self) -> Result<SequencerState> {
        let resp = self
            .http
            .get(self.account_url())
            .send()
            .await
            .map_err(|e| FaucetError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| FaucetError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(FaucetError::Transport(format!(
                "status: {}, message: {body}",
                status.as_u16()
            )));
        }
        parse_account_view(&body)
    }

    async fn submit(&self, tx: &TransferTx) -> SubmissionOutcome {
        let tx_bytes = match self.signer.sign(tx) {
            Ok(bytes) => bytes,
            Err(e) => return SubmissionOutcome::SigningFailed(e.to_string()),
        };
        let request = BroadcastRequest {
            tx_bytes: BASE64.encode(tx_bytes),
            mode: constants::BROADCAST_MODE,
        };

        let resp = match self.http.post(self.broadcast_url()).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_builder() => {
                return SubmissionOutcome::TransportError(e.to_string());
            }
            // Timed out or dropped after the body may have been sent.
            Err(e) => return SubmissionOutcome::Unconfirmed(e.to_string()),
        };
        let status = resp.status().as_u16();
        match resp.text().await {
            Ok(body) => crate::classify(status, &body),
            Err(e) => SubmissionOutcome::Unconfirmed(format!("status: {status}, body: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ed25519TxSigner;

    fn signer() -> Ed25519TxSigner {
        Ed25519TxSigner::from_hex(&"07".repeat(32), "test-1", "uinit").unwrap()
    }

    #[test]
    fn trailing_slash_trimmed() {
        let client =
            RestLedgerClient::new("http://ledger:1317/", signer(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.rest_url(), "http://ledger:1317");
        assert_eq!(client.broadcast_url(), "http://ledger:1317/cosmos/tx/v1beta1/txs");
        assert!(
            client
                .account_url()
                .starts_with("http://ledger:1317/cosmos/auth/v1beta1/accounts/0x")
        );
    }

    #[test]
    fn empty_url_rejected() {
        assert!(RestLedgerClient::new(" / ", signer(), Duration::from_secs(5)).is_err());
    }
}
