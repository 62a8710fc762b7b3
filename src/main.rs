//! depotline - logistics back-office service
//!
//! Serves container, depot and reference records from MongoDB, and
//! company, driver and location records fetched from external systems
//! through a shared in-memory entity cache.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `cache` - Entity cache (upstream data) and moka record caches
//! - `upstream` - HTTP client, sources and record normalization
//! - `families` - Per-family cache orchestrators
//! - `database` - MongoDB integration
//! - `api` - Axum routes

mod api;
mod cache;
mod config;
mod database;
mod families;
mod upstream;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::AppState;
use cache::{CacheRegistry, EntityCache};
use config::Config;
use database::{ContainerRepository, Database, DepotRepository, LookupRepository};
use families::{CompanyDirectory, DriverRoster, LocationRegistry};
use upstream::UpstreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("depotline=info,tower_http=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting depotline...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    // Connect to MongoDB
    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let db = Arc::new(db);

    // Local records
    let registry = CacheRegistry::new();
    let containers = ContainerRepository::new(&db, &registry)?;
    let depots = DepotRepository::new(&db, &registry)?;
    containers.ensure_indexes().await?;
    depots.ensure_indexes().await?;
    let shipping_lines = LookupRepository::new(&db, &registry)?;
    let order_statuses = LookupRepository::new(&db, &registry)?;
    info!("Record caches registered: {}", registry.len());

    // Upstream families share one entity cache
    let upstream = &config.upstream;
    let entities = EntityCache::new(upstream.timeout);
    let companies = CompanyDirectory::connect(
        entities.clone(),
        UpstreamClient::new("companies", upstream.hr_api_url.clone(), upstream.timeout)?,
        config.ttls.company,
    );
    let drivers = DriverRoster::connect(
        entities.clone(),
        UpstreamClient::new("drivers", upstream.driver_api_url.clone(), upstream.timeout)?,
        config.ttls.driver,
    );
    let locations = LocationRegistry::connect(
        entities.clone(),
        UpstreamClient::new("locations", upstream.location_api_url.clone(), upstream.timeout)?,
        config.ttls.location,
    );
    info!(
        "Entity cache ready (TTL companies={}s drivers={}s locations={}s)",
        companies.ttl().as_secs(),
        drivers.ttl().as_secs(),
        locations.ttl().as_secs()
    );

    let state = AppState {
        db,
        registry,
        entities,
        companies,
        drivers,
        locations,
        containers: Arc::new(containers),
        depots: Arc::new(depots),
        shipping_lines: Arc::new(shipping_lines),
        order_statuses: Arc::new(order_statuses),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
