//! Portico Gateway - pass-through object-store proxy
//!
//! This binary serves plain HTTP GET/PUT requests that carry store
//! credentials and a bucket name in the query string, and forwards each
//! transfer to the backing S3-compatible store.

mod handlers;
mod metrics;
mod metrics_middleware;

use anyhow::Result;
use clap::Parser;
use handlers::AppState;
use portico_common::Config;
use portico_store::S3StoreFactory;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "portico-gateway")]
#[command(about = "Portico pass-through object-store gateway")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/portico/gateway.toml")]
    config: String,

    /// Listen address for the proxy API
    #[arg(short, long)]
    listen: Option<String>,

    /// Backing store endpoint URL
    #[arg(long)]
    store_endpoint: Option<String>,

    /// AWS region for SigV4 signing
    #[arg(long)]
    region: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Load the configuration file (if present) and apply CLI overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut cfg: Config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(config::File::with_name(&args.config).required(false))
        .build()?
        .try_deserialize()?;

    if let Some(listen) = &args.listen {
        cfg.network.listen = listen.parse()?;
    }
    if let Some(endpoint) = &args.store_endpoint {
        cfg.store.endpoint = endpoint.clone();
    }
    if let Some(region) = &args.region {
        cfg.store.region = region.clone();
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portico Gateway");

    let config = load_config(&args)?;
    info!("Store endpoint: {}", config.store.endpoint);
    info!("Signing region: {}", config.store.region);
    info!(
        "Max single-part upload size: {} bytes",
        config.limits.max_object_size
    );
    info!("Metrics endpoint: /metrics");

    let store_factory = Arc::new(S3StoreFactory::new(
        config.store.endpoint.clone(),
        config.store.region.clone(),
    ));

    let addr: SocketAddr = config.network.listen;
    let state = Arc::new(AppState {
        config,
        store_factory,
    });

    let app = handlers::router(state);

    info!("Listening on {}", addr);

    // Start server
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down...");
        })
        .await?;

    info!("Gateway shut down gracefully");

    Ok(())
}
