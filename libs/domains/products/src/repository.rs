use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Brand, BrandDetail, Category, CategoryDetail, ProductDetail, ProductPage};
use crate::query::ProductQuery;
use crate::validation::{CategoryChanges, NewBrand, NewCategory, NewProduct, ProductChanges};

/// Catalog storage.
///
/// Every method is one unit of work: a failure leaves the store exactly as it
/// was before the call. Inputs arrive already validated; stores still enforce
/// uniqueness and referential rules themselves, since concurrent writers can
/// race past any earlier check.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert a product with its variants and images, resolving or creating
    /// its brand and category in the same unit of work.
    async fn create_product(&self, product: NewProduct) -> ProductResult<ProductDetail>;

    async fn get_product(&self, id: Uuid) -> ProductResult<Option<ProductDetail>>;

    /// Apply scalar changes and reconcile child collections.
    ///
    /// Fails with `NotFound` when the product does not exist.
    async fn update_product(&self, id: Uuid, changes: ProductChanges)
    -> ProductResult<ProductDetail>;

    /// Delete a product and its children. Returns false if it did not exist.
    async fn delete_product(&self, id: Uuid) -> ProductResult<bool>;

    /// One page of product summaries matching the query.
    ///
    /// A category slug that names no category is `NotFound`; any other
    /// filter value matching nothing yields an empty page.
    async fn list_products(&self, query: ProductQuery) -> ProductResult<ProductPage>;

    async fn create_brand(&self, brand: NewBrand) -> ProductResult<Brand>;

    async fn get_brand(&self, id: Uuid) -> ProductResult<Option<BrandDetail>>;

    /// All brands ordered by name, then id
    async fn list_brands(&self) -> ProductResult<Vec<Brand>>;

    async fn create_category(&self, category: NewCategory) -> ProductResult<Category>;

    async fn get_category(&self, id: Uuid) -> ProductResult<Option<CategoryDetail>>;

    /// All categories ordered by name, then id
    async fn list_categories(&self) -> ProductResult<Vec<Category>>;

    /// Rename or re-parent a category. A parent that would close a cycle is a
    /// validation error on `parent_id`.
    async fn update_category(&self, id: Uuid, changes: CategoryChanges)
    -> ProductResult<Category>;
}
