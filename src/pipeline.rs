//! The three-stage synchronization run.
//!
//! Each stage fans out over the providers that survived the previous one and
//! joins before the next stage starts. All futures are polled from the calling
//! task, so a stalled request only stalls its own provider.
//!
//! Reading configurations and fetching key sets settle every item: a failure
//! is logged and the provider is dropped. Writing waits for every write too,
//! but by default the first failed write then rejects the whole run even
//! though the other providers were written. `WriteJoin::SettleAll` opts the write stage into the same
//! isolation as the other two.

use crate::config::{SyncConfig, WriteJoin};
use crate::error::{ProviderError, SyncError};
use crate::jwks::{JwksDocument, JwksFetcher};
use crate::metadata::fetch_openid_configuration;
use crate::mirror::write_jwks;
use crate::store::{ObjectStore, WriteAck};
use crate::{OpenIdConfiguration, ProviderId};
use core::fmt;
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of one provider in one stage.
#[derive(Debug)]
pub enum StageResult<T> {
    Success(ProviderId, T),
    Failure(ProviderError),
}

impl<T> StageResult<T> {
    pub fn from_result(provider: ProviderId, result: Result<T, SyncError>) -> Self {
        match result {
            Ok(value) => StageResult::Success(provider, value),
            Err(e) => StageResult::Failure(ProviderError::new(provider, e)),
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            StageResult::Success(provider, _) => provider,
            StageResult::Failure(e) => e.provider(),
        }
    }

    pub fn into_result(self) -> Result<(ProviderId, T), ProviderError> {
        match self {
            StageResult::Success(provider, value) => Ok((provider, value)),
            StageResult::Failure(e) => Err(e),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Stage {
    Metadata,
    Jwks,
    Mirror,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Metadata => write!(f, "metadata"),
            Stage::Jwks => write!(f, "jwks"),
            Stage::Mirror => write!(f, "mirror"),
        }
    }
}

/// A provider whose key set made it all the way to the destination bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredJwks {
    pub provider: ProviderId,
    #[serde(flatten)]
    pub ack: WriteAck,
}

pub struct Synchronizer {
    config: SyncConfig,
    store: Arc<dyn ObjectStore>,
    fetcher: JwksFetcher,
}

impl Synchronizer {
    pub fn new(config: SyncConfig, store: Arc<dyn ObjectStore>, fetcher: JwksFetcher) -> Self {
        Synchronizer {
            config,
            store,
            fetcher,
        }
    }

    /// Run every stage once. Resolves with the providers that were mirrored,
    /// which may be none at all; rejects only when a write fails under
    /// `WriteJoin::FailFast`.
    pub async fn run(&self) -> Result<Vec<MirroredJwks>, ProviderError> {
        info!(
            providers = self.config.providers.len(),
            source_bucket = %self.config.source.bucket,
            destination_bucket = %self.config.destination.bucket,
            "Starting JWKS synchronization"
        );

        let configurations = settle(
            Stage::Metadata,
            self.config
                .providers
                .iter()
                .map(|provider| self.read_configuration(provider)),
        )
        .await;

        let documents = settle(
            Stage::Jwks,
            configurations
                .into_iter()
                .map(|(provider, configuration)| self.fetch_jwks(provider, configuration)),
        )
        .await;

        let mirrored = self.write_all(documents).await?;
        info!(mirrored = mirrored.len(), "JWKS synchronization complete");
        Ok(mirrored)
    }

    async fn read_configuration(&self, provider: &str) -> StageResult<OpenIdConfiguration> {
        let result =
            fetch_openid_configuration(self.store.as_ref(), &self.config.source, provider).await;
        StageResult::from_result(provider.to_string(), result)
    }

    async fn fetch_jwks(
        &self,
        provider: ProviderId,
        configuration: OpenIdConfiguration,
    ) -> StageResult<JwksDocument> {
        let result = self.fetcher.fetch(&configuration.jwks_uri).await;
        StageResult::from_result(provider, result)
    }

    async fn write(&self, provider: ProviderId, document: JwksDocument) -> StageResult<WriteAck> {
        let result = write_jwks(
            self.store.as_ref(),
            &self.config.destination,
            &provider,
            &document,
        )
        .await;
        StageResult::from_result(provider, result)
    }

    async fn write_all(
        &self,
        documents: Vec<(ProviderId, JwksDocument)>,
    ) -> Result<Vec<MirroredJwks>, ProviderError> {
        let writes = documents
            .into_iter()
            .map(|(provider, document)| self.write(provider, document));

        let written = match self.config.write_join {
            WriteJoin::FailFast => {
                // every issued write runs to completion before the first failure rejects
                let outcomes = join_all(writes).await;
                outcomes
                    .into_iter()
                    .map(StageResult::into_result)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| {
                        error!(
                            stage = %Stage::Mirror,
                            provider = %e.provider(),
                            category = %e.classify(),
                            error = %e.error(),
                            "Write failed, aborting synchronization"
                        );
                        e
                    })?
            }
            WriteJoin::SettleAll => settle(Stage::Mirror, writes).await,
        };

        Ok(written
            .into_iter()
            .map(|(provider, ack)| MirroredJwks { provider, ack })
            .collect())
    }
}

/// Wait for every item regardless of outcome, log the failures and keep the
/// successes in input order.
async fn settle<T, I, F>(stage: Stage, items: I) -> Vec<(ProviderId, T)>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = StageResult<T>>,
{
    let outcomes = join_all(items).await;
    let total = outcomes.len();

    let succeeded: Vec<(ProviderId, T)> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome.into_result() {
            Ok(success) => Some(success),
            Err(e) => {
                warn!(
                    stage = %stage,
                    provider = %e.provider(),
                    category = %e.classify(),
                    error = %e.error(),
                    "Dropping provider"
                );
                None
            }
        })
        .collect();

    info!(
        stage = %stage,
        succeeded = succeeded.len(),
        failed = total - succeeded.len(),
        "Stage complete"
    );
    succeeded
}
