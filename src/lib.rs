pub mod config;
pub mod error;
pub mod jwks;
pub mod metadata;
pub mod mirror;
pub mod pipeline;
pub mod store;

pub use config::{Location, SyncConfig, WriteJoin};
pub use error::{Category, ProviderError, StorageError, SyncError};
pub use jwks::{JwksDocument, JwksFetcher};
pub use pipeline::{MirroredJwks, StageResult, Synchronizer};
pub use store::{FsObjectStore, MemoryObjectStore, ObjectStore, WriteAck};

use serde::{Deserialize, Serialize};

/// Opaque identifier of an OIDC provider, used as the key suffix in both buckets.
pub type ProviderId = String;

/// The only part of a cached discovery document the mirror consumes.
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenIdConfiguration {
    pub jwks_uri: String,
}
