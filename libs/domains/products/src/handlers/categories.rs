use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};
use axum_helpers::{
    UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use super::CATEGORIES_TAG;
use crate::error::ProductResult;
use crate::models::{Category, CategoryDetail, CategoryRef, CreateCategory, UpdateCategory};
use crate::repository::CatalogRepository;
use crate::service::CatalogService;

#[derive(OpenApi)]
#[openapi(
    paths(list_categories, create_category, get_category, update_category),
    components(
        schemas(Category, CategoryDetail, CategoryRef, CreateCategory, UpdateCategory),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn router<R: CatalogRepository + 'static>(service: Arc<CatalogService<R>>) -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", get(get_category).patch(update_category))
        .with_state(service)
}

/// List categories by name
#[utoipa::path(
    get,
    path = "",
    tag = CATEGORIES_TAG,
    responses(
        (status = 200, description = "All categories", body = Vec<Category>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categories<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
) -> ProductResult<Json<Vec<Category>>> {
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "",
    tag = CATEGORIES_TAG,
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> ProductResult<impl IntoResponse> {
    let category = service.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Get a category with its parent, children and products
#[utoipa::path(
    get,
    path = "/{id}",
    tag = CATEGORIES_TAG,
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = CategoryDetail),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<CategoryDetail>> {
    let category = service.get_category(id).await?;
    Ok(Json(category))
}

/// Rename or move a category
///
/// A parent that is the category itself or one of its descendants is rejected.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = CATEGORIES_TAG,
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCategory>,
) -> ProductResult<Json<Category>> {
    let category = service.update_category(id, input).await?;
    Ok(Json(category))
}
