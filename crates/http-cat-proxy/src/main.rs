//! http.cat caching proxy
//!
//! Serves status-code images from a local file cache, fetching and storing
//! them from the upstream service on a miss.

use clap::Parser;
use file_blob_cache::BlobCache;
use http_cat_proxy::{start_server, Cli, ProxyConfig, Result, ServerState, SharedState};
use status_image_client::StatusImageClient;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ProxyConfig::from_cli(Cli::parse()).unwrap_or_else(|e| e.exit());

    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("http_cat_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting http.cat caching proxy...");

    run(config).await.inspect_err(|e| error!(error = %e, "Proxy stopped"))
}

async fn run(config: ProxyConfig) -> Result<()> {
    let cache = BlobCache::new(&config.cache_dir);
    if cache.init().await? {
        info!("Cache directory created: {}", config.cache_dir.display());
    }
    info!("Cache directory: {}", config.cache_dir.display());

    let fetcher = StatusImageClient::new(&config.upstream_url)?;
    info!("Upstream: {}", fetcher.base_url());

    let state: SharedState = Arc::new(ServerState::new(cache, fetcher));

    // Start HTTP server (blocking)
    start_server(state, &config.host, config.port).await?;

    Ok(())
}
