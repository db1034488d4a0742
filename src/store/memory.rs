use super::{ObjectStore, WriteAck};
use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// In-process store. Clones share the same objects.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), StoredObject>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        bucket: &str,
        key: &str,
        body: impl Into<Vec<u8>>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut objects = self.objects.write().map_err(|_| poisoned())?;
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.into(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    pub fn object(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects.get(&(bucket.to_string(), key.to_string())).cloned())
    }

    /// Every key currently stored in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

fn poisoned() -> StorageError {
    StorageError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| object.body.clone())
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<WriteAck, StorageError> {
        let ack = WriteAck::new(bucket, key, &body);
        self.insert(bucket, key, body, content_type)?;
        Ok(ack)
    }
}
