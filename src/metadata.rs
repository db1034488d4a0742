use crate::config::Location;
use crate::error::SyncError;
use crate::store::ObjectStore;
use crate::OpenIdConfiguration;
use tracing::debug;

/// Read the cached discovery document for `provider` from the source bucket.
///
/// A document that is valid JSON but has no `jwks_uri` string fails the same
/// way as malformed JSON.
pub async fn fetch_openid_configuration(
    store: &dyn ObjectStore,
    source: &Location,
    provider: &str,
) -> Result<OpenIdConfiguration, SyncError> {
    let key = source.key_for(provider);
    debug!(provider = %provider, bucket = %source.bucket, key = %key, "Reading OpenID configuration");

    let body = store
        .get(&source.bucket, &key)
        .await
        .map_err(SyncError::StorageRead)?;
    let text = String::from_utf8_lossy(&body);
    let configuration: OpenIdConfiguration = serde_json::from_str(&text)?;
    Ok(configuration)
}
