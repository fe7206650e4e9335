//! PostgreSQL catalog store.
//!
//! Every trait method opens one transaction and commits it only on success.
//! Dropping the transaction (early return, error, or a cancelled request
//! future) rolls it back.

mod reader;
mod writer;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use uuid::Uuid;

use crate::config::SkuScope;
use crate::error::ProductResult;
use crate::models::{Brand, BrandDetail, Category, CategoryDetail, ProductDetail, ProductPage};
use crate::query::ProductQuery;
use crate::repository::CatalogRepository;
use crate::validation::{CategoryChanges, NewBrand, NewCategory, NewProduct, ProductChanges};

#[derive(Clone)]
pub struct PgCatalogRepository {
    db: DatabaseConnection,
    sku_scope: SkuScope,
}

impl PgCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_sku_scope(db, SkuScope::default())
    }

    pub fn with_sku_scope(db: DatabaseConnection, sku_scope: SkuScope) -> Self {
        Self { db, sku_scope }
    }
}

/// Align the catalog-wide SKU index with `scope`.
///
/// The per-product index always exists. Switching back to the global scope
/// fails if two products already share a SKU.
pub async fn ensure_sku_scope(db: &DatabaseConnection, scope: SkuScope) -> Result<(), DbErr> {
    let statement = match scope {
        SkuScope::Global => {
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_product_variants_sku ON product_variants (sku)"
        }
        SkuScope::PerProduct => "DROP INDEX IF EXISTS uq_product_variants_sku",
    };
    db.execute_unprepared(statement).await?;
    tracing::info!(%scope, "SKU uniqueness scope applied");
    Ok(())
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn create_product(&self, input: NewProduct) -> ProductResult<ProductDetail> {
        let txn = self.db.begin().await?;
        let detail = writer::create_product(&txn, input, self.sku_scope).await?;
        txn.commit().await?;

        tracing::info!(product_id = %detail.id, variants = detail.variant_count, "Created product");
        Ok(detail)
    }

    async fn get_product(&self, id: Uuid) -> ProductResult<Option<ProductDetail>> {
        let txn = self.db.begin().await?;
        let detail = reader::product_detail(&txn, id).await?;
        txn.commit().await?;
        Ok(detail)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> ProductResult<ProductDetail> {
        let txn = self.db.begin().await?;
        let detail = writer::update_product(&txn, id, changes, self.sku_scope).await?;
        txn.commit().await?;

        tracing::info!(product_id = %id, "Updated product");
        Ok(detail)
    }

    async fn delete_product(&self, id: Uuid) -> ProductResult<bool> {
        let txn = self.db.begin().await?;
        let deleted = writer::delete_product(&txn, id).await?;
        txn.commit().await?;

        if deleted {
            tracing::info!(product_id = %id, "Deleted product");
        }
        Ok(deleted)
    }

    async fn list_products(&self, query: ProductQuery) -> ProductResult<ProductPage> {
        let txn = self.db.begin().await?;
        let page = reader::list_products(&txn, &query).await?;
        txn.commit().await?;
        Ok(page)
    }

    async fn create_brand(&self, input: NewBrand) -> ProductResult<Brand> {
        let txn = self.db.begin().await?;
        let brand = writer::create_brand(&txn, input).await?;
        txn.commit().await?;

        tracing::info!(brand_id = %brand.id, "Created brand");
        Ok(brand.into())
    }

    async fn get_brand(&self, id: Uuid) -> ProductResult<Option<BrandDetail>> {
        let txn = self.db.begin().await?;
        let brand = reader::brand_detail(&txn, id).await?;
        txn.commit().await?;
        Ok(brand)
    }

    async fn list_brands(&self) -> ProductResult<Vec<Brand>> {
        Ok(reader::list_brands(&self.db).await?)
    }

    async fn create_category(&self, input: NewCategory) -> ProductResult<Category> {
        let txn = self.db.begin().await?;
        let category = writer::create_category(&txn, input).await?;
        txn.commit().await?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Created category");
        Ok(category.into())
    }

    async fn get_category(&self, id: Uuid) -> ProductResult<Option<CategoryDetail>> {
        let txn = self.db.begin().await?;
        let category = reader::category_detail(&txn, id).await?;
        txn.commit().await?;
        Ok(category)
    }

    async fn list_categories(&self) -> ProductResult<Vec<Category>> {
        Ok(reader::list_categories(&self.db).await?)
    }

    async fn update_category(&self, id: Uuid, changes: CategoryChanges) -> ProductResult<Category> {
        let txn = self.db.begin().await?;
        let category = writer::update_category(&txn, id, changes).await?;
        txn.commit().await?;

        tracing::info!(category_id = %id, "Updated category");
        Ok(category.into())
    }
}

