//! HTTP server initialization and lifecycle management
//!
//! This module handles all server setup:
//! - Tracing initialization
//! - Vector backend and embedding provider selection
//! - Router assembly (API, docs, health, readiness)
//! - Server startup with graceful shutdown

use std::sync::Arc;

use axum::Router;
use axum_helpers::server::{create_app, create_router, health_router};
use core_config::tracing::init_tracing;
use domain_tenant_store::{ApiDoc, TenantStore, TenantStoreConfig, handlers};
use eyre::{Result, WrapErr};
use tracing::info;

use crate::SharedStore;
use crate::config::Config;
use crate::health::ready_router;

/// Build the tenant store described by `config`.
pub fn build_store(config: &TenantStoreConfig) -> Result<SharedStore> {
    let backend = config
        .build_backend()
        .wrap_err("Failed to initialize vector backend")?;
    let provider = config
        .build_embedding_provider()
        .wrap_err("Failed to initialize embedding provider")?;

    info!(
        backend = %config.backend,
        embedding_provider = %config.embedding.provider,
        dimension = config.dimension,
        distance = %config.distance,
        duplicate_policy = %config.duplicate_policy,
        "Tenant store configured"
    );

    let store = TenantStore::new(backend, config.collection_config())
        .with_embedding_provider(provider)
        .with_telemetry(config.telemetry_enabled);

    Ok(Arc::new(store))
}

/// Full application router: API under `/api`, docs, `/health` and `/ready`.
pub fn build_router(config: &Config, store: SharedStore) -> Result<Router> {
    let api_routes = handlers::router(store.clone());

    let router = create_router::<ApiDoc>(api_routes).wrap_err("Failed to build router")?;

    Ok(router
        .merge(health_router(config.app.clone()))
        .merge(ready_router(store)))
}

/// Run the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The backend or embedding provider cannot be built
/// - Server binding fails
pub async fn run() -> Result<()> {
    let config = Config::from_env().wrap_err("Failed to load configuration")?;

    // Initialize tracing (env-aware: JSON for prod, pretty for dev)
    init_tracing(&config.environment);

    let store = build_store(&config.store)?;
    let app = build_router(&config, store)?;

    info!("Starting {} v{}", config.app.name, config.app.version);
    create_app(app, &config.server)
        .await
        .wrap_err("Server error")?;

    info!("Tenant API shutdown complete");
    Ok(())
}
