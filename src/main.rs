//! Photo Browser - REST backend for a photo-album browser.
//!
//! This binary starts the HTTP server and configures all components.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_browser::{
    config::Config,
    media::{create_s3_client, S3AssetStorage},
    server::{create_router, AppState, RateLimiters, RouterConfig, TokenAuth},
    store::MemoryStore,
};

/// How often expired rate-limit windows are purged.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let asset_base_url = config.asset_base_url();

    info!("Photo Browser v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Environment: {}", config.environment);
    info!("  Client URL: {}", config.client_url);
    info!("  S3 bucket: {}", config.s3_bucket);
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3_region);
    info!("  Asset URL: {}", asset_base_url);
    info!("  Trust proxy: {}", config.trust_proxy);

    // Create S3 client and asset storage
    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
    let storage = S3AssetStorage::new(s3_client, config.s3_bucket.clone(), asset_base_url);

    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(storage),
        TokenAuth::new(&config.jwt_secret),
    );

    let limiters = RateLimiters::new(config.trust_proxy);
    let _sweeper = limiters.spawn_sweeper(SWEEP_INTERVAL);

    let router_config = RouterConfig::new(vec![config.client_url.clone()])
        .with_environment(config.environment)
        .with_tracing(!config.no_tracing)
        .with_rate_limiters(limiters);

    let router = create_router(state, router_config);

    // Bind and serve
    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/health", addr);

    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "photo_browser=debug,tower_http=debug"
    } else {
        "photo_browser=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
