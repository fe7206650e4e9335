use crate::state::AppState;
use axum::Router;
use domain_products::{CatalogService, PgCatalogRepository, handlers};

pub mod health;

/// Catalog routes without the `/api` prefix; `create_router` adds it.
pub fn routes(state: &AppState) -> Router {
    let repository =
        PgCatalogRepository::with_sku_scope(state.db.clone(), state.config.catalog.sku_scope);
    handlers::router(CatalogService::new(repository))
}

/// `/ready`, merged beside the stateless app router.
pub fn ready_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
