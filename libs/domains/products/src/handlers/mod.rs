//! HTTP endpoints, one router and OpenAPI document per resource.

pub mod brands;
pub mod categories;
pub mod products;

use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::repository::CatalogRepository;
use crate::service::CatalogService;

pub const PRODUCTS_TAG: &str = "Products";
pub const BRANDS_TAG: &str = "Brands";
pub const CATEGORIES_TAG: &str = "Categories";

/// OpenAPI documentation for the catalog endpoints
#[derive(OpenApi)]
#[openapi(
    nest(
        (path = "/product", api = products::ApiDoc),
        (path = "/brand", api = brands::ApiDoc),
        (path = "/category", api = categories::ApiDoc)
    ),
    tags(
        (name = PRODUCTS_TAG, description = "Products with their variants and images"),
        (name = BRANDS_TAG, description = "Brand management"),
        (name = CATEGORIES_TAG, description = "Category tree management")
    )
)]
pub struct ApiDoc;

/// Mount `/product`, `/brand` and `/category` over one shared service.
pub fn router<R: CatalogRepository + 'static>(service: CatalogService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .nest("/product", products::router(shared_service.clone()))
        .nest("/brand", brands::router(shared_service.clone()))
        .nest("/category", categories::router(shared_service))
}
