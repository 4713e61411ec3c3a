//! Client for the external JSON document store.
//!
//! The store keeps the whole record as one document (a JSONBin "bin"). Reads
//! return it wrapped in an envelope, writes send the bare document.

mod repository;

pub use repository::*;

use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use thiserror::Error;

use crate::config::Config;

/// Header carrying the store access key.
pub const ACCESS_KEY_HEADER: &str = "X-Access-Key";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("document store answered {0}")]
    Status(StatusCode),

    #[error("document store response is not a JSON envelope: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("document store response has no record")]
    MissingRecord,
}

/// Envelope the store wraps documents in. The record is kept as the exact
/// text the store sent.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, deserialize_with = "present")]
    record: Option<Box<RawValue>>,
}

/// A `null` record is a stored document of its own, only an absent member is missing.
fn present<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

/// HTTP client bound to a single document.
#[derive(Debug, Clone)]
pub struct JsonBinClient {
    http: reqwest::Client,
    record_url: String,
    access_key: Option<String>,
}

impl JsonBinClient {
    pub fn new(record_url: impl Into<String>, access_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            record_url: record_url.into(),
            access_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.record_url(), config.store_access_key.clone())
    }

    /// Fetch the stored document.
    pub async fn fetch(&self) -> Result<Box<RawValue>, StoreError> {
        let response = self
            .authorize(self.http.get(&self.record_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status));
        }

        let body = response.bytes().await?;
        let envelope: Envelope = serde_json::from_slice(&body)?;
        envelope.record.ok_or(StoreError::MissingRecord)
    }

    /// Overwrite the stored document with `record`, sent as is.
    ///
    /// Returns the document as the store echoed it back, when it did.
    pub async fn replace(&self, record: &RawValue) -> Result<Option<Box<RawValue>>, StoreError> {
        let response = self
            .authorize(self.http.put(&self.record_url))
            .header(CONTENT_TYPE, "application/json")
            .body(record.get().to_owned())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice::<Envelope>(&body)
            .ok()
            .and_then(|envelope| envelope.record))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_key {
            Some(key) => request.header(ACCESS_KEY_HEADER, key),
            None => request,
        }
    }
}
