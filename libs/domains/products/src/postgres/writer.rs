use chrono::Utc;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect,
    QueryTrait,
};
use std::collections::HashSet;
use uuid::Uuid;

use super::reader;
use crate::config::SkuScope;
use crate::diff::reconcile;
use crate::entity::{brand, category, product, product_image, product_variant};
use crate::error::{ProductError, ProductResult};
use crate::models::ProductDetail;
use crate::validation::{
    BrandSelector, CategoryChanges, CategorySelector, ImageRecord, NewBrand, NewCategory,
    NewProduct, ProductChanges, VariantRecord,
};

/// Rounds of select-then-insert before giving up on a contended brand or category.
const RESOLVE_ATTEMPTS: usize = 3;

fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

// ============================================================================
// Products
// ============================================================================

pub(super) async fn create_product(
    txn: &DatabaseTransaction,
    input: NewProduct,
    scope: SkuScope,
) -> ProductResult<ProductDetail> {
    let at = now();
    let brand_id = resolve_brand(txn, input.brand, at).await?;
    let category_id = resolve_category(txn, input.category, at).await?;
    ensure_product_unique(txn, &input.name, &input.slug, None).await?;

    let id = Uuid::now_v7();
    let skus: Vec<&str> = input.variants.iter().map(|v| v.sku.as_str()).collect();
    ensure_skus_free(txn, &skus, id, scope).await?;

    let model = product::ActiveModel {
        id: Set(id),
        name: Set(input.name),
        slug: Set(input.slug),
        description: Set(input.description),
        price: Set(input.price),
        brand_id: Set(brand_id),
        category_id: Set(category_id),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(txn)
    .await?;

    insert_variants(txn, id, input.variants).await?;
    insert_images(txn, id, input.images).await?;

    reader::detail_of(txn, model).await
}

pub(super) async fn update_product(
    txn: &DatabaseTransaction,
    id: Uuid,
    changes: ProductChanges,
    scope: SkuScope,
) -> ProductResult<ProductDetail> {
    let mut model = product::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| ProductError::not_found("Product", id))?;
    if let Some(skus) = changes.skus() {
        ensure_skus_free(txn, &skus, id, scope).await?;
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
        if brand::Entity::find_by_id(brand_id).one(txn).await?.is_none() {
            return Err(ProductError::invalid_reference("brand", brand_id));
        }
        model.brand_id = Some(brand_id);
    }
    if let Some(category_id) = changes.category_id {
        if category::Entity::find_by_id(category_id).one(txn).await?.is_none() {
            return Err(ProductError::invalid_reference("category", category_id));
        }
        model.category_id = Some(category_id);
    }
    ensure_product_unique(txn, &model.name, &model.slug, Some(id)).await?;

    if let Some(variants) = changes.variants {
        let existing: Vec<Uuid> = product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.eq(id))
            .all(txn)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect();
        let plan = reconcile(&existing, variants);

        if !plan.deletes.is_empty() {
            product_variant::Entity::delete_many()
                .filter(product_variant::Column::Id.is_in(plan.deletes))
                .exec(txn)
                .await?;
        }
        for (variant_id, record) in plan.updates {
            product_variant::ActiveModel {
                id: Unchanged(variant_id),
                product_id: Unchanged(id),
                sku: Set(record.sku),
                color: Set(record.color),
                size: Set(record.size),
                stock: Set(record.stock),
                price_override: Set(record.price_override),
            }
            .update(txn)
            .await?;
        }
        insert_variants(txn, id, plan.inserts).await?;
    }

    if let Some(images) = changes.images {
        let existing: Vec<Uuid> = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(id))
            .all(txn)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        let plan = reconcile(&existing, images);

        if !plan.deletes.is_empty() {
            product_image::Entity::delete_many()
                .filter(product_image::Column::Id.is_in(plan.deletes))
                .exec(txn)
                .await?;
        }
        for (image_id, record) in plan.updates {
            product_image::ActiveModel {
                id: Unchanged(image_id),
                product_id: Unchanged(id),
                image_url: Set(record.image_url),
                alt_text: Set(record.alt_text),
            }
            .update(txn)
            .await?;
        }
        insert_images(txn, id, plan.inserts).await?;
    }

    let model = product::ActiveModel {
        id: Unchanged(id),
        name: Set(model.name),
        slug: Set(model.slug),
        description: Set(model.description),
        price: Set(model.price),
        brand_id: Set(model.brand_id),
        category_id: Set(model.category_id),
        created_at: Unchanged(model.created_at),
        updated_at: Set(now()),
    }
    .update(txn)
    .await?;

    reader::detail_of(txn, model).await
}

pub(super) async fn delete_product(txn: &DatabaseTransaction, id: Uuid) -> ProductResult<bool> {
    product_variant::Entity::delete_many()
        .filter(product_variant::Column::ProductId.eq(id))
        .exec(txn)
        .await?;
    product_image::Entity::delete_many()
        .filter(product_image::Column::ProductId.eq(id))
        .exec(txn)
        .await?;

    let result = product::Entity::delete_by_id(id).exec(txn).await?;
    Ok(result.rows_affected > 0)
}

async fn insert_variants(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    records: Vec<VariantRecord>,
) -> ProductResult<()> {
    for record in records {
        product_variant::ActiveModel {
            id: Set(Uuid::now_v7()),
            product_id: Set(product_id),
            sku: Set(record.sku),
            color: Set(record.color),
            size: Set(record.size),
            stock: Set(record.stock),
            price_override: Set(record.price_override),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn insert_images(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    records: Vec<ImageRecord>,
) -> ProductResult<()> {
    for record in records {
        product_image::ActiveModel {
            id: Set(Uuid::now_v7()),
            product_id: Set(product_id),
            image_url: Set(record.image_url),
            alt_text: Set(record.alt_text),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn ensure_product_unique(
    txn: &DatabaseTransaction,
    name: &str,
    slug: &str,
    except: Option<Uuid>,
) -> ProductResult<()> {
    let others = || {
        product::Entity::find().apply_if(except, |q, id| q.filter(product::Column::Id.ne(id)))
    };

    if others()
        .filter(product::Column::Name.eq(name))
        .one(txn)
        .await?
        .is_some()
    {
        return Err(ProductError::conflict("name", name));
    }
    if others()
        .filter(product::Column::Slug.eq(slug))
        .one(txn)
        .await?
        .is_some()
    {
        return Err(ProductError::conflict("slug", slug));
    }
    Ok(())
}

/// Under the global scope no other product may already hold one of `skus`.
///
/// The unique index backs this up against concurrent writers; checking first
/// lets the conflict name the offending SKU.
async fn ensure_skus_free(
    txn: &DatabaseTransaction,
    skus: &[&str],
    product_id: Uuid,
    scope: SkuScope,
) -> ProductResult<()> {
    if scope == SkuScope::PerProduct || skus.is_empty() {
        return Ok(());
    }

    let taken = product_variant::Entity::find()
        .filter(product_variant::Column::Sku.is_in(skus.iter().copied()))
        .filter(product_variant::Column::ProductId.ne(product_id))
        .one(txn)
        .await?;

    match taken {
        Some(variant) => Err(ProductError::conflict("sku", variant.sku)),
        None => Ok(()),
    }
}

// ============================================================================
// Brands
// ============================================================================

fn brand_row(id: Uuid, input: &NewBrand, at: DateTimeWithTimeZone) -> brand::ActiveModel {
    brand::ActiveModel {
        id: Set(id),
        name: Set(input.name.clone()),
        description: Set(input.description.clone()),
        created_at: Set(at),
        updated_at: Set(at),
    }
}

/// Insert unless the name is taken. Returns the number of rows written.
async fn insert_brand_if_absent(
    txn: &DatabaseTransaction,
    id: Uuid,
    input: &NewBrand,
    at: DateTimeWithTimeZone,
) -> ProductResult<u64> {
    let written = brand::Entity::insert(brand_row(id, input, at))
        .on_conflict(
            OnConflict::column(brand::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;
    Ok(written)
}

pub(super) async fn create_brand(
    txn: &DatabaseTransaction,
    input: NewBrand,
) -> ProductResult<brand::Model> {
    let id = Uuid::now_v7();
    if insert_brand_if_absent(txn, id, &input, now()).await? == 0 {
        return Err(ProductError::conflict("name", input.name));
    }

    brand::Entity::find_by_id(id)
        .one(txn)
        .await?
        .ok_or_else(|| ProductError::not_found("Brand", id))
}

async fn brand_id_by_name(txn: &DatabaseTransaction, name: &str) -> ProductResult<Option<Uuid>> {
    Ok(brand::Entity::find()
        .filter(brand::Column::Name.eq(name))
        .one(txn)
        .await?
        .map(|b| b.id))
}

async fn resolve_brand(
    txn: &DatabaseTransaction,
    selector: BrandSelector,
    at: DateTimeWithTimeZone,
) -> ProductResult<Option<Uuid>> {
    match selector {
        BrandSelector::None => Ok(None),
        BrandSelector::Existing(id) => match brand::Entity::find_by_id(id).one(txn).await? {
            Some(_) => Ok(Some(id)),
            None => Err(ProductError::invalid_reference("brand", id)),
        },
        BrandSelector::LookupOrCreate(input) => {
            // A concurrent writer may insert the same name between our select
            // and insert; the insert then writes nothing and we select again.
            for _ in 0..RESOLVE_ATTEMPTS {
                if let Some(id) = brand_id_by_name(txn, &input.name).await? {
                    return Ok(Some(id));
                }
                let id = Uuid::now_v7();
                if insert_brand_if_absent(txn, id, &input, at).await? > 0 {
                    tracing::debug!(
                        brand_id = %id,
                        name = %input.name,
                        "Created brand for product"
                    );
                    return Ok(Some(id));
                }
            }
            Err(ProductError::Storage(format!(
                "could not resolve brand '{}'",
                input.name
            )))
        }
    }
}

// ============================================================================
// Categories
// ============================================================================

async fn ensure_parent_exists(txn: &DatabaseTransaction, parent_id: Uuid) -> ProductResult<()> {
    match category::Entity::find_by_id(parent_id).one(txn).await? {
        Some(_) => Ok(()),
        None => Err(ProductError::invalid_reference("parent", parent_id)),
    }
}

async fn ensure_category_unique(
    txn: &DatabaseTransaction,
    name: &str,
    slug: &str,
    except: Option<Uuid>,
) -> ProductResult<()> {
    let others = || {
        category::Entity::find().apply_if(except, |q, id| q.filter(category::Column::Id.ne(id)))
    };

    if others()
        .filter(category::Column::Name.eq(name))
        .one(txn)
        .await?
        .is_some()
    {
        return Err(ProductError::conflict("name", name));
    }
    if others()
        .filter(category::Column::Slug.eq(slug))
        .one(txn)
        .await?
        .is_some()
    {
        return Err(ProductError::conflict("slug", slug));
    }
    Ok(())
}

async fn insert_category(
    txn: &DatabaseTransaction,
    input: NewCategory,
    at: DateTimeWithTimeZone,
) -> ProductResult<category::Model> {
    if let Some(parent_id) = input.parent_id {
        ensure_parent_exists(txn, parent_id).await?;
    }
    ensure_category_unique(txn, &input.name, &input.slug, None).await?;

    let model = category::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(input.name),
        slug: Set(input.slug),
        parent_id: Set(input.parent_id),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(txn)
    .await?;
    Ok(model)
}

pub(super) async fn create_category(
    txn: &DatabaseTransaction,
    input: NewCategory,
) -> ProductResult<category::Model> {
    insert_category(txn, input, now()).await
}

async fn resolve_category(
    txn: &DatabaseTransaction,
    selector: CategorySelector,
    at: DateTimeWithTimeZone,
) -> ProductResult<Option<Uuid>> {
    match selector {
        CategorySelector::None => Ok(None),
        CategorySelector::Existing(id) => match category::Entity::find_by_id(id).one(txn).await? {
            Some(_) => Ok(Some(id)),
            None => Err(ProductError::invalid_reference("category", id)),
        },
        CategorySelector::Slug(slug) => category::Entity::find()
            .filter(category::Column::Slug.eq(slug.as_str()))
            .one(txn)
            .await?
            .map(|c| Some(c.id))
            .ok_or_else(|| ProductError::invalid_reference("category", slug)),
        CategorySelector::LookupOrCreate(input) => {
            if let Some(parent_id) = input.parent_id {
                ensure_parent_exists(txn, parent_id).await?;
            }
            // Same race as for brands: a concurrent writer may take the name
            // or slug after our select, so the insert writes nothing.
            for _ in 0..RESOLVE_ATTEMPTS {
                if let Some(id) = category_id_by_name_or_slug(txn, &input).await? {
                    return Ok(Some(id));
                }
                let id = Uuid::now_v7();
                if insert_category_if_absent(txn, id, &input, at).await? > 0 {
                    tracing::debug!(
                        category_id = %id,
                        slug = %input.slug,
                        "Created category for product"
                    );
                    return Ok(Some(id));
                }
            }
            Err(ProductError::Storage(format!(
                "could not resolve category '{}'",
                input.slug
            )))
        }
    }
}

async fn category_id_by_name_or_slug(
    txn: &DatabaseTransaction,
    input: &NewCategory,
) -> ProductResult<Option<Uuid>> {
    let by_name = category::Entity::find()
        .filter(category::Column::Name.eq(input.name.as_str()))
        .one(txn)
        .await?;
    if let Some(found) = by_name {
        return Ok(Some(found.id));
    }
    Ok(category::Entity::find()
        .filter(category::Column::Slug.eq(input.slug.as_str()))
        .one(txn)
        .await?
        .map(|c| c.id))
}

/// Insert unless the name or slug is taken. Returns the number of rows written.
async fn insert_category_if_absent(
    txn: &DatabaseTransaction,
    id: Uuid,
    input: &NewCategory,
    at: DateTimeWithTimeZone,
) -> ProductResult<u64> {
    let row = category::ActiveModel {
        id: Set(id),
        name: Set(input.name.clone()),
        slug: Set(input.slug.clone()),
        parent_id: Set(input.parent_id),
        created_at: Set(at),
        updated_at: Set(at),
    };
    // No conflict target: either unique column losing the race counts.
    let written = category::Entity::insert(row)
        .on_conflict(OnConflict::new().do_nothing().to_owned())
        .exec_without_returning(txn)
        .await?;
    Ok(written)
}

/// True when `ancestor` appears on the parent chain starting at `start`.
async fn chain_contains(
    txn: &DatabaseTransaction,
    start: Uuid,
    ancestor: Uuid,
) -> ProductResult<bool> {
    let mut seen = HashSet::new();
    let mut current = Some(start);
    while let Some(id) = current {
        if id == ancestor {
            return Ok(true);
        }
        if !seen.insert(id) {
            return Ok(false);
        }
        current = category::Entity::find_by_id(id)
            .one(txn)
            .await?
            .and_then(|c| c.parent_id);
    }
    Ok(false)
}

pub(super) async fn update_category(
    txn: &DatabaseTransaction,
    id: Uuid,
    changes: CategoryChanges,
) -> ProductResult<category::Model> {
    let mut model = category::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| ProductError::not_found("Category", id))?;

    if let Some(parent_id) = changes.parent_id {
        ensure_parent_exists(txn, parent_id).await?;
        if chain_contains(txn, parent_id, id).await? {
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
    ensure_category_unique(txn, &model.name, &model.slug, Some(id)).await?;

    let model = category::ActiveModel {
        id: Unchanged(id),
        name: Set(model.name),
        slug: Set(model.slug),
        parent_id: Set(model.parent_id),
        created_at: Unchanged(model.created_at),
        updated_at: Set(now()),
    }
    .update(txn)
    .await?;
    Ok(model)
}
