use crate::config::Location;
use crate::error::SyncError;
use crate::jwks::JwksDocument;
use crate::store::{ObjectStore, WriteAck};
use tracing::debug;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Write `document` to the destination bucket under the provider's key,
/// replacing whatever was mirrored before.
pub async fn write_jwks(
    store: &dyn ObjectStore,
    destination: &Location,
    provider: &str,
    document: &JwksDocument,
) -> Result<WriteAck, SyncError> {
    let key = destination.key_for(provider);
    let body = document.to_vec()?;
    debug!(provider = %provider, bucket = %destination.bucket, key = %key, bytes = body.len(), "Writing JWKS");

    store
        .put(&destination.bucket, &key, body, JSON_CONTENT_TYPE)
        .await
        .map_err(SyncError::StorageWrite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Category;
    use crate::store::{FsObjectStore, MemoryObjectStore};
    use serde_json::json;

    #[tokio::test]
    async fn writes_json_under_prefixed_key() {
        let store = MemoryObjectStore::new();
        let destination = Location::new("dest", "jwks/");
        let document = JwksDocument::new(json!({"keys": [{"kty": "EC", "kid": "e1"}]}));

        let ack = write_jwks(&store, &destination, "azure", &document)
            .await
            .unwrap();
        assert_eq!(ack.key, "jwks/azure");

        let object = store.object("dest", "jwks/azure").unwrap().unwrap();
        assert_eq!(object.content_type, "application/json");
        let written: JwksDocument = serde_json::from_slice(&object.body).unwrap();
        assert_eq!(written, document);
    }

    #[tokio::test]
    async fn repeated_writes_are_identical() {
        let store = MemoryObjectStore::new();
        let destination = Location::new("dest", "");
        let document = JwksDocument::new(json!({"keys": []}));

        let first = write_jwks(&store, &destination, "a", &document).await.unwrap();
        let second = write_jwks(&store, &destination, "a", &document).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.keys("dest").unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn store_failure_is_a_storage_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        // provider id escaping the bucket is refused by the store
        let destination = Location::new("dest", "");
        let document = JwksDocument::new(json!({"keys": []}));

        let err = write_jwks(&store, &destination, "../a", &document)
            .await
            .unwrap_err();
        assert_eq!(err.classify(), Category::StorageWrite);
    }
}
