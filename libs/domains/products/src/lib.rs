//! Products Domain
//!
//! Product catalog: brands, a category tree, and products that own their
//! variants and images.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /product, /brand, /category
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← payload validation, not-found mapping
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← one transaction per call (in-memory or PostgreSQL)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Entity    │  ← SeaORM rows
//! └─────────────┘
//! ```
//!
//! A product and its children form one aggregate: create, update and delete
//! either commit every row or none. On update a submitted `variants` or
//! `images` list is reconciled against the stored one by id (see [`diff`]).
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{handlers, CatalogService, InMemoryCatalogRepository};
//!
//! let service = CatalogService::new(InMemoryCatalogRepository::new());
//! let router = handlers::router(service);
//! ```

pub mod config;
pub mod diff;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;
mod projection;
pub mod query;
pub mod repository;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use config::{CatalogConfig, SkuScope};
pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use memory::InMemoryCatalogRepository;
pub use models::{
    Brand, BrandDetail, Category, CategoryDetail, CreateBrand, CreateCategory, CreateProduct,
    DeleteAck, ImageInput, ProductDetail, ProductPage, ProductSummary, UpdateCategory,
    UpdateProduct, VariantInput,
};
pub use postgres::{PgCatalogRepository, ensure_sku_scope};
pub use query::{FilterParams, ListParams, ProductQuery, SearchParams};
pub use repository::CatalogRepository;
pub use service::CatalogService;
