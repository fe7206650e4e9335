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

use super::BRANDS_TAG;
use crate::error::ProductResult;
use crate::models::{Brand, BrandDetail, CreateBrand, ProductRef};
use crate::repository::CatalogRepository;
use crate::service::CatalogService;

#[derive(OpenApi)]
#[openapi(
    paths(list_brands, create_brand, get_brand),
    components(
        schemas(Brand, BrandDetail, CreateBrand, ProductRef),
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
        .route("/", get(list_brands).post(create_brand))
        .route("/{id}", get(get_brand))
        .with_state(service)
}

/// List brands by name
#[utoipa::path(
    get,
    path = "",
    tag = BRANDS_TAG,
    responses(
        (status = 200, description = "All brands", body = Vec<Brand>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_brands<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
) -> ProductResult<Json<Vec<Brand>>> {
    let brands = service.list_brands().await?;
    Ok(Json(brands))
}

#[utoipa::path(
    post,
    path = "",
    tag = BRANDS_TAG,
    request_body = CreateBrand,
    responses(
        (status = 201, description = "Brand created", body = Brand),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_brand<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateBrand>,
) -> ProductResult<impl IntoResponse> {
    let brand = service.create_brand(input).await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

/// Get a brand with its products
#[utoipa::path(
    get,
    path = "/{id}",
    tag = BRANDS_TAG,
    params(
        ("id" = Uuid, Path, description = "Brand ID")
    ),
    responses(
        (status = 200, description = "Brand found", body = BrandDetail),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_brand<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<BrandDetail>> {
    let brand = service.get_brand(id).await?;
    Ok(Json(brand))
}
