//! Object storage capability consumed by the mirror.
//!
//! The pipeline only ever needs to read one object and write one object per
//! provider, so the trait is kept to exactly those two calls. Implementations
//! are shared between concurrent stage items and must do their own locking.

mod fs;
mod memory;

pub use fs::FsObjectStore;
pub use memory::{MemoryObjectStore, StoredObject};

use crate::error::StorageError;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ring::digest::{digest, SHA256};
use serde::Serialize;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the whole object at `key` in `bucket`.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store `body` at `key` in `bucket`, replacing any existing object.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<WriteAck, StorageError>;
}

/// Acknowledgment of a completed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteAck {
    pub bucket: String,
    pub key: String,
    pub e_tag: String,
}

impl WriteAck {
    pub(crate) fn new(bucket: &str, key: &str, body: &[u8]) -> Self {
        WriteAck {
            bucket: bucket.to_string(),
            key: key.to_string(),
            e_tag: entity_tag(body),
        }
    }
}

/// Quoted base64url SHA-256 of `body`. Equal bodies always yield equal tags.
pub fn entity_tag(body: &[u8]) -> String {
    let hash = digest(&SHA256, body);
    format!("\"{}\"", URL_SAFE_NO_PAD.encode(hash.as_ref()))
}
