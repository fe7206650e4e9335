use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::SkuScope;
use crate::diff::reconcile;
use crate::entity::{brand, category, product, product_image, product_variant};
use crate::error::{ProductError, ProductResult};
use crate::models::{
    Brand, BrandDetail, Category, CategoryDetail, CategoryRef, Pagination, ProductDetail,
    ProductPage, ProductRef, ProductSummary,
};
use crate::projection;
use crate::query::{CategoryFilter, ProductQuery, Sort, SortField, SortOrder};
use crate::repository::CatalogRepository;
use crate::validation::{
    BrandSelector, CategoryChanges, CategorySelector, ImageRecord, NewBrand, NewCategory,
    NewProduct, ProductChanges, VariantRecord,
};

fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

#[derive(Debug, Clone, Default)]
struct CatalogState {
    brands: HashMap<Uuid, brand::Model>,
    categories: HashMap<Uuid, category::Model>,
    products: HashMap<Uuid, product::Model>,
    variants: HashMap<Uuid, product_variant::Model>,
    images: HashMap<Uuid, product_image::Model>,
}

/// In-memory catalog for tests and local development.
///
/// Writes run against a copy of the state that replaces the original only on
/// success, so a failed call leaves nothing behind.
#[derive(Clone, Default)]
pub struct InMemoryCatalogRepository {
    state: Arc<RwLock<CatalogState>>,
    sku_scope: SkuScope,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sku_scope(sku_scope: SkuScope) -> Self {
        Self {
            sku_scope,
            ..Self::default()
        }
    }

    async fn write<T>(
        &self,
        apply: impl FnOnce(&mut CatalogState) -> ProductResult<T>,
    ) -> ProductResult<T> {
        let mut guard = self.state.write().await;
        let mut draft = guard.clone();
        let out = apply(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

impl CatalogState {
    fn brand_by_name(&self, name: &str) -> Option<&brand::Model> {
        self.brands.values().find(|b| b.name == name)
    }

    fn category_by_name(&self, name: &str) -> Option<&category::Model> {
        self.categories.values().find(|c| c.name == name)
    }

    fn category_by_slug(&self, slug: &str) -> Option<&category::Model> {
        self.categories.values().find(|c| c.slug == slug)
    }

    fn insert_brand(&mut self, input: NewBrand, at: DateTimeWithTimeZone) -> brand::Model {
        let model = brand::Model {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            created_at: at,
            updated_at: at,
        };
        self.brands.insert(model.id, model.clone());
        model
    }

    fn insert_category(
        &mut self,
        input: NewCategory,
        at: DateTimeWithTimeZone,
    ) -> ProductResult<category::Model> {
        if let Some(parent_id) = input.parent_id {
            if !self.categories.contains_key(&parent_id) {
                return Err(ProductError::invalid_reference("parent", parent_id));
            }
        }
        self.ensure_category_unique(&input.name, &input.slug, None)?;

        let model = category::Model {
            id: Uuid::now_v7(),
            name: input.name,
            slug: input.slug,
            parent_id: input.parent_id,
            created_at: at,
            updated_at: at,
        };
        self.categories.insert(model.id, model.clone());
        Ok(model)
    }

    fn ensure_category_unique(
        &self,
        name: &str,
        slug: &str,
        except: Option<Uuid>,
    ) -> ProductResult<()> {
        let others = || self.categories.values().filter(move |c| Some(c.id) != except);
        if others().any(|c| c.name == name) {
            return Err(ProductError::conflict("name", name));
        }
        if others().any(|c| c.slug == slug) {
            return Err(ProductError::conflict("slug", slug));
        }
        Ok(())
    }

    fn ensure_product_unique(
        &self,
        name: &str,
        slug: &str,
        except: Option<Uuid>,
    ) -> ProductResult<()> {
        let others = || self.products.values().filter(move |p| Some(p.id) != except);
        if others().any(|p| p.name == name) {
            return Err(ProductError::conflict("name", name));
        }
        if others().any(|p| p.slug == slug) {
            return Err(ProductError::conflict("slug", slug));
        }
        Ok(())
    }

    /// Under the global scope no other product may already hold one of `skus`.
    /// Uniqueness within the submitted list is checked during validation.
    fn ensure_skus_free(
        &self,
        skus: &[&str],
        product_id: Uuid,
        scope: SkuScope,
    ) -> ProductResult<()> {
        if scope == SkuScope::PerProduct {
            return Ok(());
        }
        let wanted: HashSet<&str> = skus.iter().copied().collect();
        match self
            .variants
            .values()
            .find(|v| v.product_id != product_id && wanted.contains(v.sku.as_str()))
        {
            Some(taken) => Err(ProductError::conflict("sku", taken.sku.clone())),
            None => Ok(()),
        }
    }

    fn resolve_brand(
        &mut self,
        selector: BrandSelector,
        at: DateTimeWithTimeZone,
    ) -> ProductResult<Option<Uuid>> {
        match selector {
            BrandSelector::None => Ok(None),
            BrandSelector::Existing(id) if self.brands.contains_key(&id) => Ok(Some(id)),
            BrandSelector::Existing(id) => Err(ProductError::invalid_reference("brand", id)),
            BrandSelector::LookupOrCreate(input) => match self.brand_by_name(&input.name) {
                Some(existing) => Ok(Some(existing.id)),
                None => Ok(Some(self.insert_brand(input, at).id)),
            },
        }
    }

    fn resolve_category(
        &mut self,
        selector: CategorySelector,
        at: DateTimeWithTimeZone,
    ) -> ProductResult<Option<Uuid>> {
        match selector {
            CategorySelector::None => Ok(None),
            CategorySelector::Existing(id) if self.categories.contains_key(&id) => Ok(Some(id)),
            CategorySelector::Existing(id) => Err(ProductError::invalid_reference("category", id)),
            CategorySelector::Slug(slug) => self
                .category_by_slug(&slug)
                .map(|c| Some(c.id))
                .ok_or_else(|| ProductError::invalid_reference("category", slug)),
            CategorySelector::LookupOrCreate(input) => {
                let existing = self
                    .category_by_name(&input.name)
                    .or_else(|| self.category_by_slug(&input.slug))
                    .map(|c| c.id);
                match existing {
                    Some(id) => Ok(Some(id)),
                    None => Ok(Some(self.insert_category(input, at)?.id)),
                }
            }
        }
    }

    /// True when `ancestor` appears on the parent chain starting at `start`.
    fn chain_contains(&self, start: Uuid, ancestor: Uuid) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.categories.get(&id).and_then(|c| c.parent_id);
        }
        false
    }

    fn insert_variant(&mut self, product_id: Uuid, record: VariantRecord) {
        let model = product_variant::Model {
            id: Uuid::now_v7(),
            product_id,
            sku: record.sku,
            color: record.color,
            size: record.size,
            stock: record.stock,
            price_override: record.price_override,
        };
        self.variants.insert(model.id, model);
    }

    fn insert_image(&mut self, product_id: Uuid, record: ImageRecord) {
        let model = product_image::Model {
            id: Uuid::now_v7(),
            product_id,
            image_url: record.image_url,
            alt_text: record.alt_text,
        };
        self.images.insert(model.id, model);
    }

    fn variants_of(&self, product_id: Uuid) -> impl Iterator<Item = &product_variant::Model> {
        self.variants.values().filter(move |v| v.product_id == product_id)
    }

    fn images_of(&self, product_id: Uuid) -> impl Iterator<Item = &product_image::Model> {
        self.images.values().filter(move |i| i.product_id == product_id)
    }

    fn detail(&self, product: &product::Model) -> ProductDetail {
        projection::detail(
            product.clone(),
            product.brand_id.and_then(|id| self.brands.get(&id)),
            product.category_id.and_then(|id| self.categories.get(&id)),
            self.variants_of(product.id).cloned().collect(),
            self.images_of(product.id).cloned().collect(),
        )
    }

    fn summary(&self, product: &product::Model) -> ProductSummary {
        let (total_stock, variant_count) = self
            .variants_of(product.id)
            .fold((0i64, 0usize), |(stock, count), v| (stock + i64::from(v.stock), count + 1));
        projection::summary(
            product,
            product.brand_id.and_then(|id| self.brands.get(&id)),
            product.category_id.and_then(|id| self.categories.get(&id)),
            total_stock,
            variant_count,
        )
    }

    fn product_refs(&self, matches: impl Fn(&product::Model) -> bool) -> Vec<ProductRef> {
        let mut refs: Vec<ProductRef> = self
            .products
            .values()
            .filter(|p| matches(*p))
            .map(ProductRef::from)
            .collect();
        refs.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        refs
    }
}

fn compare(a: &ProductSummary, b: &ProductSummary, sort: Sort) -> Ordering {
    let primary = match sort.field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Price => a.price.cmp(&b.price),
        SortField::Name => a.name.cmp(&b.name),
    };
    let primary = match sort.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn create_product(&self, input: NewProduct) -> ProductResult<ProductDetail> {
        let scope = self.sku_scope;
        let detail = self
            .write(|state| {
                let at = now();
                let brand_id = state.resolve_brand(input.brand, at)?;
                let category_id = state.resolve_category(input.category, at)?;
                state.ensure_product_unique(&input.name, &input.slug, None)?;

                let id = Uuid::now_v7();
                let skus: Vec<&str> = input.variants.iter().map(|v| v.sku.as_str()).collect();
                state.ensure_skus_free(&skus, id, scope)?;

                let model = product::Model {
                    id,
                    name: input.name,
                    slug: input.slug,
                    description: input.description,
                    price: input.price,
                    brand_id,
                    category_id,
                    created_at: at,
                    updated_at: at,
                };
                state.products.insert(id, model.clone());
                for variant in input.variants {
                    state.insert_variant(id, variant);
                }
                for image in input.images {
                    state.insert_image(id, image);
                }

                Ok(state.detail(&model))
            })
            .await?;

        tracing::info!(product_id = %detail.id, variants = detail.variant_count, "Created product");
        Ok(detail)
    }

    async fn get_product(&self, id: Uuid) -> ProductResult<Option<ProductDetail>> {
        let state = self.state.read().await;
        Ok(state.products.get(&id).map(|p| state.detail(p)))
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> ProductResult<ProductDetail> {
        let scope = self.sku_scope;
        let detail = self
            .write(|state| {
                let mut model = state
                    .products
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| ProductError::not_found("Product", id))?;
                if let Some(skus) = changes.skus() {
                    state.ensure_skus_free(&skus, id, scope)?;
                }

                if let Some(name) = changes.name {
                    model.name = name;
                }
                if let Some(slug) = changes.slug {
                    model.slug = slug;
                }
                if let Some(description) = changes.description {
                    model.description = description;
                }
                if let Some(price) = changes.price {
                    model.price = price;
                }
                if let Some(brand_id) = changes.brand_id {
                    if !state.brands.contains_key(&brand_id) {
                        return Err(ProductError::invalid_reference("brand", brand_id));
                    }
                    model.brand_id = Some(brand_id);
                }
                if let Some(category_id) = changes.category_id {
                    if !state.categories.contains_key(&category_id) {
                        return Err(ProductError::invalid_reference("category", category_id));
                    }
                    model.category_id = Some(category_id);
                }
                state.ensure_product_unique(&model.name, &model.slug, Some(id))?;

                if let Some(variants) = changes.variants {
                    let existing: Vec<Uuid> = state.variants_of(id).map(|v| v.id).collect();
                    let plan = reconcile(&existing, variants);
                    for variant_id in plan.deletes {
                        state.variants.remove(&variant_id);
                    }
                    for (variant_id, record) in plan.updates {
                        if let Some(variant) = state.variants.get_mut(&variant_id) {
                            variant.sku = record.sku;
                            variant.color = record.color;
                            variant.size = record.size;
                            variant.stock = record.stock;
                            variant.price_override = record.price_override;
                        }
                    }
                    for record in plan.inserts {
                        state.insert_variant(id, record);
                    }
                }

                if let Some(images) = changes.images {
                    let existing: Vec<Uuid> = state.images_of(id).map(|i| i.id).collect();
                    let plan = reconcile(&existing, images);
                    for image_id in plan.deletes {
                        state.images.remove(&image_id);
                    }
                    for (image_id, record) in plan.updates {
                        if let Some(image) = state.images.get_mut(&image_id) {
                            image.image_url = record.image_url;
                            image.alt_text = record.alt_text;
                        }
                    }
                    for record in plan.inserts {
                        state.insert_image(id, record);
                    }
                }

                model.updated_at = now();
                state.products.insert(id, model.clone());
                Ok(state.detail(&model))
            })
            .await?;

        tracing::info!(product_id = %id, "Updated product");
        Ok(detail)
    }

    async fn delete_product(&self, id: Uuid) -> ProductResult<bool> {
        let deleted = self
            .write(|state| {
                if state.products.remove(&id).is_none() {
                    return Ok(false);
                }
                state.variants.retain(|_, v| v.product_id != id);
                state.images.retain(|_, i| i.product_id != id);
                Ok(true)
            })
            .await?;

        if deleted {
            tracing::info!(product_id = %id, "Deleted product");
        }
        Ok(deleted)
    }

    async fn list_products(&self, query: ProductQuery) -> ProductResult<ProductPage> {
        let state = self.state.read().await;
        let filter = &query.filter;

        let category_id = match &filter.category {
            None => None,
            Some(CategoryFilter::Id(id)) => Some(*id),
            Some(CategoryFilter::Slug(slug)) => Some(
                state
                    .category_by_slug(slug)
                    .ok_or_else(|| ProductError::not_found("Category", slug))?
                    .id,
            ),
        };
        let term = query.search_term().map(str::to_lowercase);

        let mut rows: Vec<ProductSummary> = state
            .products
            .values()
            .filter(|p| category_id.is_none() || p.category_id == category_id)
            .filter(|p| filter.brand_id.is_none() || p.brand_id == filter.brand_id)
            .filter(|p| filter.min_price.is_none_or(|min| p.price >= min))
            .filter(|p| filter.max_price.is_none_or(|max| p.price <= max))
            .filter(|p| match &term {
                Some(term) => {
                    p.name.to_lowercase().contains(term)
                        || p.description.to_lowercase().contains(term)
                }
                None => true,
            })
            .map(|p| state.summary(p))
            .filter(|s| !filter.in_stock || s.total_stock > 0)
            .collect();

        rows.sort_by(|a, b| compare(a, b, query.sort));

        let total = rows.len() as u64;
        let data = rows
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();

        Ok(ProductPage::new(data, Pagination::new(total, query.page, query.per_page)))
    }

    async fn create_brand(&self, input: NewBrand) -> ProductResult<Brand> {
        let model = self
            .write(|state| {
                if state.brand_by_name(&input.name).is_some() {
                    return Err(ProductError::conflict("name", input.name));
                }
                Ok(state.insert_brand(input, now()))
            })
            .await?;

        tracing::info!(brand_id = %model.id, "Created brand");
        Ok(model.into())
    }

    async fn get_brand(&self, id: Uuid) -> ProductResult<Option<BrandDetail>> {
        let state = self.state.read().await;
        Ok(state.brands.get(&id).map(|brand| BrandDetail {
            id: brand.id,
            name: brand.name.clone(),
            description: brand.description.clone(),
            products: state.product_refs(|p| p.brand_id == Some(id)),
            created_at: brand.created_at.into(),
            updated_at: brand.updated_at.into(),
        }))
    }

    async fn list_brands(&self) -> ProductResult<Vec<Brand>> {
        let state = self.state.read().await;
        let mut brands: Vec<Brand> = state.brands.values().cloned().map(Brand::from).collect();
        brands.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(brands)
    }

    async fn create_category(&self, input: NewCategory) -> ProductResult<Category> {
        let model = self.write(|state| state.insert_category(input, now())).await?;

        tracing::info!(category_id = %model.id, slug = %model.slug, "Created category");
        Ok(model.into())
    }

    async fn get_category(&self, id: Uuid) -> ProductResult<Option<CategoryDetail>> {
        let state = self.state.read().await;
        Ok(state.categories.get(&id).map(|category| {
            let mut children: Vec<CategoryRef> = state
                .categories
                .values()
                .filter(|c| c.parent_id == Some(id))
                .map(CategoryRef::from)
                .collect();
            children.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

            CategoryDetail {
                id: category.id,
                name: category.name.clone(),
                slug: category.slug.clone(),
                parent: category
                    .parent_id
                    .and_then(|pid| state.categories.get(&pid))
                    .map(CategoryRef::from),
                children,
                products: state.product_refs(|p| p.category_id == Some(id)),
                created_at: category.created_at.into(),
                updated_at: category.updated_at.into(),
            }
        }))
    }

    async fn list_categories(&self) -> ProductResult<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> =
            state.categories.values().cloned().map(Category::from).collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn update_category(&self, id: Uuid, changes: CategoryChanges) -> ProductResult<Category> {
        let model = self
            .write(|state| {
                let mut model = state
                    .categories
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| ProductError::not_found("Category", id))?;

                if let Some(parent_id) = changes.parent_id {
                    if !state.categories.contains_key(&parent_id) {
                        return Err(ProductError::invalid_reference("parent", parent_id));
                    }
                    if state.chain_contains(parent_id, id) {
                        return Err(ProductError::invalid(
                            "parent_id",
                            "would make the category its own ancestor",
                        ));
                    }
                    model.parent_id = Some(parent_id);
                }
                if let Some(name) = changes.name {
                    model.name = name;
                }
                if let Some(slug) = changes.slug {
                    model.slug = slug;
                }
                state.ensure_category_unique(&model.name, &model.slug, Some(id))?;

                model.updated_at = now();
                state.categories.insert(id, model.clone());
                Ok(model)
            })
            .await?;

        tracing::info!(category_id = %id, "Updated category");
        Ok(model.into())
    }
}
