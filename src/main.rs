use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Parser;
use jwks_mirror::config::parse_provider_list;
use jwks_mirror::{
    FsObjectStore, JwksFetcher, Location, ProviderId, SyncConfig, Synchronizer, WriteJoin,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Mirror the JWKS of every configured OIDC provider into the destination bucket.
#[derive(Parser, Debug)]
#[command(name = "jwks-mirror", version)]
struct Args {
    /// OIDC providers as a JSON array of strings, e.g. ["google","azure"]
    #[arg(long, env = "oidc_providers", value_parser = parse_providers)]
    providers: ProviderList,

    /// Bucket holding the cached OpenID configuration documents
    #[arg(long, env = "src_bucket_name")]
    src_bucket: String,

    /// Prefix prepended to each provider id in the source bucket
    #[arg(long, env = "src_bucket_path", default_value = "")]
    src_prefix: String,

    /// Bucket receiving the fetched JWKS documents
    #[arg(long, env = "dest_bucket_name")]
    dest_bucket: String,

    /// Prefix prepended to each provider id in the destination bucket
    #[arg(long, env = "dest_bucket_path", default_value = "")]
    dest_prefix: String,

    /// Root directory of the object store; each bucket is a sub-directory
    #[arg(long, env = "JWKS_MIRROR_STORAGE_ROOT", default_value = ".")]
    storage_root: PathBuf,

    /// Drop providers whose write fails instead of failing the whole run
    #[arg(long, env = "JWKS_MIRROR_SETTLE_WRITES", value_parser = FalseyValueParser::new())]
    settle_writes: bool,

    /// Enable debug logging
    #[arg(short, long, env = "JWKS_MIRROR_VERBOSE", value_parser = FalseyValueParser::new())]
    verbose: bool,
}

#[derive(Debug, Clone)]
struct ProviderList(Vec<ProviderId>);

fn parse_providers(raw: &str) -> Result<ProviderList, String> {
    parse_provider_list(raw)
        .map(ProviderList)
        .map_err(|e| format!("expected a JSON array of strings: {}", e))
}

impl Args {
    fn into_config(self) -> SyncConfig {
        let write_join = if self.settle_writes {
            WriteJoin::SettleAll
        } else {
            WriteJoin::FailFast
        };
        SyncConfig::new(
            self.providers.0,
            Location::new(self.src_bucket, self.src_prefix),
            Location::new(self.dest_bucket, self.dest_prefix),
        )
        .with_write_join(write_join)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let store = Arc::new(FsObjectStore::new(&args.storage_root));
    let config = args.into_config();
    info!(
        providers = ?config.providers,
        storage_root = %store.root().display(),
        write_join = ?config.write_join,
        "Configuration loaded"
    );

    let fetcher = JwksFetcher::new().context("Failed to create HTTP client")?;
    let synchronizer = Synchronizer::new(config, store, fetcher);

    let mirrored = synchronizer
        .run()
        .await
        .context("JWKS synchronization failed")?;

    println!("{}", serde_json::to_string_pretty(&mirrored)?);
    Ok(())
}
