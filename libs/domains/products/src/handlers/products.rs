use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    UuidPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use super::PRODUCTS_TAG;
use crate::error::ProductResult;
use crate::models::{
    CreateProduct, DeleteAck, ImageInput, ProductDetail, ProductPage, UpdateProduct, VariantInput,
};
use crate::query::{CategoryFilter, FilterParams, ListParams, SearchParams};
use crate::repository::CatalogRepository;
use crate::service::CatalogService;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
        list_by_category,
        list_by_brand,
        search_products,
    ),
    components(
        schemas(
            ProductDetail,
            ProductPage,
            CreateProduct,
            UpdateProduct,
            VariantInput,
            ImageInput,
            DeleteAck
        ),
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
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/category/{slug}", get(list_by_category))
        .route("/brand/{id}", get(list_by_brand))
        .route(
            "/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .with_state(service)
}

/// List products, newest first by default
#[utoipa::path(
    get,
    path = "",
    tag = PRODUCTS_TAG,
    params(ListParams),
    responses(
        (status = 200, description = "One page of products", body = ProductPage),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    ValidatedQuery(params): ValidatedQuery<ListParams>,
) -> ProductResult<Json<ProductPage>> {
    let page = service.list_products(params.into_query()).await?;
    Ok(Json(page))
}

/// Create a product with its variants and images
///
/// An embedded `brand` or `category` object is looked up by name (and slug)
/// and created when absent.
#[utoipa::path(
    post,
    path = "",
    tag = PRODUCTS_TAG,
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = ProductDetail),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = PRODUCTS_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductDetail),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<ProductDetail>> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Update a product
///
/// Only supplied fields change. A supplied `variants` or `images` list
/// replaces the stored one: entries with a known id are updated, the rest are
/// inserted, and stored entries not listed are deleted.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = PRODUCTS_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated", body = ProductDetail),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> ProductResult<Json<ProductDetail>> {
    let product = service.update_product(id, input).await?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = PRODUCTS_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product and its children deleted", body = DeleteAck),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<DeleteAck>> {
    let ack = service.delete_product(id).await?;
    Ok(Json(ack))
}

/// List products in a category
#[utoipa::path(
    get,
    path = "/category/{slug}",
    tag = PRODUCTS_TAG,
    params(
        ("slug" = String, Path, description = "Category slug"),
        FilterParams
    ),
    responses(
        (status = 200, description = "One page of products", body = ProductPage),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_by_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path(slug): Path<String>,
    ValidatedQuery(params): ValidatedQuery<FilterParams>,
) -> ProductResult<Json<ProductPage>> {
    let query = params.into_query(Some(CategoryFilter::Slug(slug)), None);
    let page = service.list_products(query).await?;
    Ok(Json(page))
}

/// List products of a brand
#[utoipa::path(
    get,
    path = "/brand/{id}",
    tag = PRODUCTS_TAG,
    params(
        ("id" = Uuid, Path, description = "Brand ID"),
        FilterParams
    ),
    responses(
        (status = 200, description = "One page of products", body = ProductPage),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_by_brand<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    UuidPath(brand_id): UuidPath,
    ValidatedQuery(params): ValidatedQuery<FilterParams>,
) -> ProductResult<Json<ProductPage>> {
    let query = params.into_query(None, Some(brand_id));
    let page = service.list_products(query).await?;
    Ok(Json(page))
}

/// Search products by name or description
#[utoipa::path(
    get,
    path = "/search",
    tag = PRODUCTS_TAG,
    params(SearchParams),
    responses(
        (status = 200, description = "One page of matching products", body = ProductPage),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    ValidatedQuery(params): ValidatedQuery<SearchParams>,
) -> ProductResult<Json<ProductPage>> {
    let page = service.list_products(params.into_query()).await?;
    Ok(Json(page))
}
