//! Products API - catalog REST server backed by PostgreSQL

use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{connect_from_config_with_retry, run_migrations};
use domain_products::ensure_sku_scope;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to PostgreSQL");
    let db = connect_from_config_with_retry(config.database.clone(), None).await?;

    if config.run_migrations {
        run_migrations::<migration::Migrator>(&db, config.app.name).await?;
    }
    ensure_sku_scope(&db, config.catalog.sku_scope).await?;
    info!(sku_scope = %config.catalog.sku_scope, "Catalog store ready");

    let state = AppState {
        config: config.clone(),
        db,
    };

    let router = create_router::<openapi::ApiDoc>(api::routes(&state), &config.server)?;
    let app = router
        .merge(health_router(config.app.clone()))
        .merge(api::ready_router(state.clone()));

    info!("Starting Products API on port {}", config.server.port);

    let db = state.db;
    create_production_app(app, &config.server, Duration::from_secs(30), async move {
        info!("Shutting down: closing PostgreSQL connections");
        if let Err(e) = db.close().await {
            tracing::warn!("Failed to close PostgreSQL connections: {}", e);
        }
    })
    .await?;

    info!("Products API shutdown complete");
    Ok(())
}
