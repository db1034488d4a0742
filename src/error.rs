use crate::ProviderId;
use core::fmt;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    #[error("invalid object key: '{0}'")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read OpenID configuration: {0}")]
    StorageRead(#[source] StorageError),

    #[error("failed to write JWKS: {0}")]
    StorageWrite(#[source] StorageError),

    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("request failed with status code {0}")]
    HttpStatus(StatusCode),

    #[error(
        "invalid content-type: expected application/json or text/json but received {}",
        received(.0)
    )]
    ContentType(Option<String>),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

fn received(content_type: &Option<String>) -> &str {
    content_type.as_deref().unwrap_or("nothing")
}

impl SyncError {
    pub fn classify(&self) -> Category {
        match self {
            SyncError::StorageRead(_) => Category::StorageRead,
            SyncError::StorageWrite(_) => Category::StorageWrite,
            SyncError::Parse(_) => Category::Parse,
            SyncError::HttpStatus(_) => Category::HttpStatus,
            SyncError::ContentType(_) => Category::ContentType,
            SyncError::Network(_) => Category::Network,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Category {
    StorageRead,
    StorageWrite,
    Parse,
    HttpStatus,
    ContentType,
    Network,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::StorageRead => "storage_read",
            Category::StorageWrite => "storage_write",
            Category::Parse => "parse",
            Category::HttpStatus => "http_status",
            Category::ContentType => "content_type",
            Category::Network => "network",
        };
        f.write_str(name)
    }
}

/// An error tied to the provider whose processing produced it.
#[derive(Debug)]
pub struct ProviderError {
    provider: ProviderId,
    error: SyncError,
}

impl ProviderError {
    pub fn new(provider: ProviderId, error: SyncError) -> Self {
        ProviderError { provider, error }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn classify(&self) -> Category {
        self.error.classify()
    }

    pub fn error(&self) -> &SyncError {
        &self.error
    }

    pub fn into_error(self) -> SyncError {
        self.error
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider '{}': {}", self.provider, self.error)
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
