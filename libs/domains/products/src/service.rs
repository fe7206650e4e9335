use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    Brand, BrandDetail, Category, CategoryDetail, CreateBrand, CreateCategory, CreateProduct,
    DeleteAck, ProductDetail, ProductPage, UpdateCategory, UpdateProduct,
};
use crate::query::ProductQuery;
use crate::repository::CatalogRepository;
use crate::validation;

/// Catalog use cases: validates input, then hands typed records to the store.
#[derive(Clone)]
pub struct CatalogService<R: CatalogRepository> {
    repository: Arc<R>,
}

fn warn_on_conflict(err: &ProductError) {
    if let ProductError::Conflict { field, value } = err {
        tracing::warn!(%field, %value, "Write rolled back on conflict");
    }
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    // ------------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------------

    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<ProductDetail> {
        let product = validation::new_product(input)?;
        self.repository
            .create_product(product)
            .await
            .inspect_err(warn_on_conflict)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<ProductDetail> {
        self.repository
            .get_product(id)
            .await?
            .ok_or_else(|| ProductError::not_found("Product", id))
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProduct,
    ) -> ProductResult<ProductDetail> {
        let changes = validation::product_changes(input)?;
        self.repository
            .update_product(id, changes)
            .await
            .inspect_err(warn_on_conflict)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<DeleteAck> {
        if !self.repository.delete_product(id).await? {
            return Err(ProductError::not_found("Product", id));
        }
        Ok(DeleteAck::product(id))
    }

    /// Pagination and price bounds are checked before the store is queried.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> ProductResult<ProductPage> {
        query.validate()?;
        self.repository.list_products(query).await
    }

    // ------------------------------------------------------------------------
    // Brands
    // ------------------------------------------------------------------------

    #[instrument(skip(self, input))]
    pub async fn create_brand(&self, input: CreateBrand) -> ProductResult<Brand> {
        let brand = validation::new_brand(input)?;
        self.repository
            .create_brand(brand)
            .await
            .inspect_err(warn_on_conflict)
    }

    #[instrument(skip(self))]
    pub async fn get_brand(&self, id: Uuid) -> ProductResult<BrandDetail> {
        self.repository
            .get_brand(id)
            .await?
            .ok_or_else(|| ProductError::not_found("Brand", id))
    }

    pub async fn list_brands(&self) -> ProductResult<Vec<Brand>> {
        self.repository.list_brands().await
    }

    // ------------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------------

    #[instrument(skip(self, input))]
    pub async fn create_category(&self, input: CreateCategory) -> ProductResult<Category> {
        let category = validation::new_category(input)?;
        self.repository
            .create_category(category)
            .await
            .inspect_err(warn_on_conflict)
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: Uuid) -> ProductResult<CategoryDetail> {
        self.repository
            .get_category(id)
            .await?
            .ok_or_else(|| ProductError::not_found("Category", id))
    }

    pub async fn list_categories(&self) -> ProductResult<Vec<Category>> {
        self.repository.list_categories().await
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        id: Uuid,
        input: UpdateCategory,
    ) -> ProductResult<Category> {
        let changes = validation::category_changes(id, input)?;
        self.repository
            .update_category(id, changes)
            .await
            .inspect_err(warn_on_conflict)
    }
}
