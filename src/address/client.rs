//! External postal-code lookup client
//!
//! The resolver only sees the [`AddressLookup`] trait; [`ZipCloudClient`] is the
//! production implementation backed by the zipcloud search API.

use crate::address::PostalCode;
use crate::config::LookupConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Lookup response as returned by the upstream service.
///
/// Every field is optional: a missing `status` is a malformed response, a
/// missing or empty `results` means the code is unknown.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<AddressResult>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AddressResult {
    /// Prefecture (region) name
    #[serde(default)]
    pub address1: String,
    /// City
    #[serde(default)]
    pub address2: Option<String>,
    /// Town
    #[serde(default)]
    pub address3: Option<String>,
    #[serde(default)]
    pub kana1: Option<String>,
    #[serde(default)]
    pub kana2: Option<String>,
    #[serde(default)]
    pub kana3: Option<String>,
    #[serde(default)]
    pub prefcode: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
}

impl LookupResponse {
    pub const STATUS_OK: u16 = 200;
}

/// Transport-level lookup failure
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("response body could not be decoded: {0}")]
    Decode(String),
}

impl LookupError {
    /// Connection failures and 5xx answers may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::HttpStatus(status) => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

/// Postal-code lookup collaborator
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Look up a normalized seven-digit code
    async fn lookup(&self, code: &PostalCode) -> Result<LookupResponse, LookupError>;
}

/// zipcloud search API client
pub struct ZipCloudClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ZipCloudClient {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(LookupError::Transport)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    async fn lookup_once(&self, code: &PostalCode) -> Result<LookupResponse, LookupError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("zipcode", code.as_str())])
            .send()
            .await
            .map_err(LookupError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(LookupError::Transport)?;
        serde_json::from_str(&body).map_err(|e| LookupError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AddressLookup for ZipCloudClient {
    async fn lookup(&self, code: &PostalCode) -> Result<LookupResponse, LookupError> {
        let mut attempt = 0;
        loop {
            match self.lookup_once(code).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt = attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "Postal code lookup failed, retrying"
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
                other => {
                    debug!(attempts = attempt + 1, ok = other.is_ok(), "Postal code lookup finished");
                    return other;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_zipcloud_hit() {
        let body = r#"{
            "message": null,
            "results": [{
                "address1": "東京都",
                "address2": "千代田区",
                "address3": "千代田",
                "kana1": "ﾄｳｷｮｳﾄ",
                "kana2": "ﾁﾖﾀﾞｸ",
                "kana3": "ﾁﾖﾀﾞ",
                "prefcode": "13",
                "zipcode": "1000001"
            }],
            "status": 200
        }"#;

        let response: LookupResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status, Some(200));
        let results = response.results.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].address1, "東京都");
        assert_eq!(results[0].prefcode.as_deref(), Some("13"));
    }

    #[test]
    fn test_decode_zipcloud_miss() {
        let body = r#"{"message": null, "results": null, "status": 200}"#;
        let response: LookupResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status, Some(200));
        assert!(response.results.is_none());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LookupError::HttpStatus(503).is_retryable());
        assert!(!LookupError::HttpStatus(404).is_retryable());
        assert!(!LookupError::Decode("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_decode_missing_status() {
        let response: LookupResponse = serde_json::from_str("{}").unwrap();
        assert!(response.status.is_none());
        assert!(response.message.is_none());
    }
}
