//! Fetching live JWKS documents from provider endpoints.

use crate::error::SyncError;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const ACCEPTED_CONTENT_TYPES: [&str; 2] = ["application/json", "text/json"];

/// A fetched key set. The keys themselves are never inspected; the document
/// is carried as parsed JSON and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JwksDocument(Value);

impl JwksDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct JwksFetcher {
    client: Client,
}

impl JwksFetcher {
    /// Fetcher with its own client: no timeout, and redirects are reported as
    /// a status failure rather than followed.
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        JwksFetcher { client }
    }

    pub async fn fetch(&self, jwks_uri: &str) -> Result<JwksDocument, SyncError> {
        debug!(uri = %jwks_uri, "Requesting JWKS");
        let response = self.client.get(jwks_uri).send().await?;

        if let Err(e) = validate(&response) {
            drain(response).await;
            return Err(e);
        }

        let bytes = response.bytes().await?;
        let text = String::from_utf8_lossy(&bytes);
        let value: Value = serde_json::from_str(&text)?;
        Ok(JwksDocument(value))
    }
}

/// Only an exact 200 is accepted, and the content type must start with one
/// of the JSON media types.
fn validate(response: &Response) -> Result<(), SyncError> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(SyncError::HttpStatus(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .map(|value| value.to_str().map_err(|_| String::from_utf8_lossy(value.as_bytes())));
    match content_type {
        Some(Ok(value)) if is_json_content_type(value) => Ok(()),
        Some(Ok(value)) => Err(SyncError::ContentType(Some(value.to_string()))),
        Some(Err(lossy)) => Err(SyncError::ContentType(Some(lossy.into_owned()))),
        None => Err(SyncError::ContentType(None)),
    }
}

pub fn is_json_content_type(value: &str) -> bool {
    ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| value.starts_with(accepted))
}

// Read and discard a rejected body so the connection is released cleanly.
async fn drain(response: Response) {
    if let Err(e) = response.bytes().await {
        debug!(error = %e, "Failed to drain rejected response body");
    }
}
