use super::{ObjectStore, WriteAck};
use crate::error::StorageError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Object store backed by a local directory: one sub-directory per bucket,
/// keys map to relative file paths inside it.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsObjectStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let mut path = self.root.clone();
        for part in [bucket, key] {
            let relative = Path::new(part);
            let valid = !part
                .split('/')
                .any(|segment| matches!(segment, "" | "." | ".."))
                && relative
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
            if !valid {
                return Err(StorageError::InvalidKey(part.to_string()));
            }
            path.push(relative);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<WriteAck, StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let ack = WriteAck::new(bucket, key, &body);
        tokio::fs::write(&path, body).await?;
        debug!(path = %path.display(), content_type = %content_type, "Wrote object");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn nested_keys_create_directories() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        let ack = store
            .put("dest", "jwks/google", b"{\"keys\":[]}".to_vec(), "application/json")
            .await
            .unwrap();
        assert_eq!(ack.key, "jwks/google");
        assert!(dir.path().join("dest").join("jwks").join("google").is_file());

        let body = store.get("dest", "jwks/google").await.unwrap();
        assert_eq!(body, b"{\"keys\":[]}");
    }

    #[tokio::test]
    async fn overwrite_replaces_previous_object() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        store.put("b", "k", b"old".to_vec(), "text/plain").await.unwrap();
        store.put("b", "k", b"new".to_vec(), "text/plain").await.unwrap();
        assert_eq!(store.get("b", "k").await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        let err = store.get("src", "google").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { key, .. } if key == "google"));
    }

    #[tokio::test]
    async fn keys_escaping_the_bucket_are_rejected() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        for key in ["../outside", "/etc/passwd", "", "a//b", "a/./b"] {
            let err = store.get("src", key).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {:?}", key);
        }
        let err = store
            .put("..", "google", Vec::new(), "application/json")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
