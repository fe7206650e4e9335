//! Validation layer.
//!
//! Turns request payloads into typed records that the stores accept as-is.
//! Nothing here touches storage.

use axum_helpers::errors::flatten_validation_errors;
use axum_helpers::FieldError;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CreateBrand, CreateCategory, CreateProduct, ImageInput, UpdateCategory, UpdateProduct,
    VariantInput,
};

/// Lowercase words joined by single hyphens, e.g. `trail-runner-2`
static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// `DECIMAL(12, 2)` upper bound
const MONEY_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

pub(crate) fn valid_slug(value: &str) -> Result<(), ValidationError> {
    if !SLUG.is_match(value) {
        return Err(ValidationError::new("slug").with_message(
            "must be lowercase letters and digits separated by single hyphens".into(),
        ));
    }
    Ok(())
}

/// Non-negative, at most two decimal places, fits `DECIMAL(12, 2)`.
pub(crate) fn valid_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("range").with_message("must be at least 0".into()));
    }
    if value.normalize().scale() > 2 {
        return Err(ValidationError::new("scale")
            .with_message("must have at most 2 decimal places".into()));
    }
    if *value >= MONEY_LIMIT {
        return Err(ValidationError::new("range")
            .with_message("must be less than 10000000000".into()));
    }
    Ok(())
}

// ============================================================================
// Typed records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBrand {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// How a new product picks its brand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrandSelector {
    None,
    Existing(Uuid),
    LookupOrCreate(NewBrand),
}

/// How a new product picks its category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelector {
    None,
    Existing(Uuid),
    Slug(String),
    LookupOrCreate(NewCategory),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub sku: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub stock: i32,
    pub price_override: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub image_url: String,
    pub alt_text: Option<String>,
}

/// A child record with the id the caller sent for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyed<T> {
    pub id: Option<Uuid>,
    pub record: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub brand: BrandSelector,
    pub category: CategorySelector,
    pub variants: Vec<VariantRecord>,
    pub images: Vec<ImageRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub variants: Option<Vec<Keyed<VariantRecord>>>,
    pub images: Option<Vec<Keyed<ImageRecord>>>,
}

impl ProductChanges {
    /// SKUs of the submitted variant list, if one was submitted.
    pub fn skus(&self) -> Option<Vec<&str>> {
        self.variants
            .as_ref()
            .map(|variants| variants.iter().map(|v| v.record.sku.as_str()).collect())
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn check<T: Validate>(input: &T) -> ProductResult<()> {
    input
        .validate()
        .map_err(|errors| ProductError::Validation(flatten_validation_errors(&errors)))
}

/// Unwrap a field that `#[validate(required)]` already guarantees.
fn required<T>(value: Option<T>, field: &str) -> ProductResult<T> {
    value.ok_or_else(|| ProductError::invalid(field, "is required"))
}

fn variant_record(input: VariantInput) -> ProductResult<Keyed<VariantRecord>> {
    Ok(Keyed {
        id: input.id,
        record: VariantRecord {
            sku: required(input.sku, "sku")?,
            color: input.color,
            size: input.size,
            stock: input.stock.unwrap_or(0),
            price_override: input.price_override,
        },
    })
}

fn image_record(input: ImageInput) -> ProductResult<Keyed<ImageRecord>> {
    Ok(Keyed {
        id: input.id,
        record: ImageRecord {
            image_url: required(input.image_url, "image_url")?,
            alt_text: input.alt_text,
        },
    })
}

/// A SKU may appear only once per payload.
fn ensure_distinct_skus<'a>(skus: impl IntoIterator<Item = &'a str>) -> ProductResult<()> {
    let mut seen = HashSet::new();
    for sku in skus {
        if !seen.insert(sku) {
            return Err(ProductError::conflict("sku", sku));
        }
    }
    Ok(())
}

/// An existing child id may be claimed by one item only.
fn ensure_distinct_ids<T>(items: &[Keyed<T>], collection: &str) -> ProductResult<()> {
    let mut seen = HashSet::new();
    let errors: Vec<FieldError> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| item.id.map(|id| (index, id)))
        .filter(|(_, id)| !seen.insert(*id))
        .map(|(index, _)| FieldError::new(format!("{collection}[{index}].id"), "is duplicated"))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ProductError::Validation(errors))
    }
}

pub fn new_brand(input: CreateBrand) -> ProductResult<NewBrand> {
    check(&input)?;
    Ok(NewBrand {
        name: required(input.name, "name")?,
        description: input.description,
    })
}

pub fn new_category(input: CreateCategory) -> ProductResult<NewCategory> {
    check(&input)?;
    Ok(NewCategory {
        name: required(input.name, "name")?,
        slug: required(input.slug, "slug")?,
        parent_id: input.parent_id,
    })
}

pub fn category_changes(id: Uuid, input: UpdateCategory) -> ProductResult<CategoryChanges> {
    check(&input)?;
    if input.parent_id == Some(id) {
        return Err(ProductError::invalid(
            "parent_id",
            "a category cannot be its own parent",
        ));
    }
    Ok(CategoryChanges {
        name: input.name,
        slug: input.slug,
        parent_id: input.parent_id,
    })
}

pub fn new_product(input: CreateProduct) -> ProductResult<NewProduct> {
    check(&input)?;

    let brand = match (input.brand, input.brand_id) {
        (Some(brand), _) => BrandSelector::LookupOrCreate(new_brand(brand).map_err(nest("brand"))?),
        (None, Some(id)) => BrandSelector::Existing(id),
        (None, None) => BrandSelector::None,
    };

    let category = match (input.category, input.category_id, input.category_slug) {
        (Some(category), _, _) => {
            CategorySelector::LookupOrCreate(new_category(category).map_err(nest("category"))?)
        }
        (None, Some(id), _) => CategorySelector::Existing(id),
        (None, None, Some(slug)) => CategorySelector::Slug(slug),
        (None, None, None) => CategorySelector::None,
    };

    let variants = input
        .variants
        .unwrap_or_default()
        .into_iter()
        .map(|v| variant_record(v).map(|keyed| keyed.record))
        .collect::<ProductResult<Vec<_>>>()?;
    ensure_distinct_skus(variants.iter().map(|v| v.sku.as_str()))?;

    let images = input
        .images
        .unwrap_or_default()
        .into_iter()
        .map(|i| image_record(i).map(|keyed| keyed.record))
        .collect::<ProductResult<Vec<_>>>()?;

    Ok(NewProduct {
        name: required(input.name, "name")?,
        slug: required(input.slug, "slug")?,
        description: required(input.description, "description")?,
        price: required(input.price, "price")?,
        brand,
        category,
        variants,
        images,
    })
}

pub fn product_changes(input: UpdateProduct) -> ProductResult<ProductChanges> {
    check(&input)?;

    let variants = input
        .variants
        .map(|list| list.into_iter().map(variant_record).collect::<ProductResult<Vec<_>>>())
        .transpose()?;
    if let Some(variants) = &variants {
        ensure_distinct_ids(variants, "variants")?;
        ensure_distinct_skus(variants.iter().map(|v| v.record.sku.as_str()))?;
    }

    let images = input
        .images
        .map(|list| list.into_iter().map(image_record).collect::<ProductResult<Vec<_>>>())
        .transpose()?;
    if let Some(images) = &images {
        ensure_distinct_ids(images, "images")?;
    }

    Ok(ProductChanges {
        name: input.name,
        slug: input.slug,
        description: input.description,
        price: input.price,
        brand_id: input.brand_id,
        category_id: input.category_id,
        variants,
        images,
    })
}

/// Re-root field errors of an embedded object under its field name.
fn nest(parent: &'static str) -> impl Fn(ProductError) -> ProductError {
    move |err| match err {
        ProductError::Validation(fields) => ProductError::Validation(
            fields.into_iter().map(|f| f.nested_under(parent)).collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_product() -> CreateProduct {
        CreateProduct {
            name: Some("Trail Runner".into()),
            slug: Some("trail-runner".into()),
            description: Some("Lightweight trail shoe".into()),
            price: Some(Decimal::new(8999, 2)),
            variants: Some(vec![VariantInput {
                sku: Some("TR-001".into()),
                stock: Some(5),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    fn fields(err: ProductError) -> Vec<String> {
        match err {
            ProductError::Validation(fields) => fields.into_iter().map(|f| f.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_slug_rule() {
        for ok in ["shoes", "trail-runner", "a1-b2-c3"] {
            assert!(valid_slug(ok).is_ok(), "{ok}");
        }
        for bad in ["Shoes", "trail--runner", "-shoes", "shoes-", "trail runner", ""] {
            assert!(valid_slug(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_money_rule() {
        assert!(valid_money(&Decimal::ZERO).is_ok());
        assert!(valid_money(&Decimal::new(8999, 2)).is_ok());
        assert!(valid_money(&Decimal::new(89990, 3)).is_ok());
        assert!(valid_money(&Decimal::new(-1, 2)).is_err());
        assert!(valid_money(&Decimal::new(8999, 3)).is_err());
        assert!(valid_money(&Decimal::new(10_000_000_000, 0)).is_err());
        assert!(valid_money(&Decimal::new(999_999_999_999, 2)).is_ok());
    }

    #[test]
    fn test_new_product_from_valid_payload() {
        let product = new_product(valid_product()).unwrap();
        assert_eq!(product.name, "Trail Runner");
        assert_eq!(product.brand, BrandSelector::None);
        assert_eq!(product.category, CategorySelector::None);
        assert_eq!(product.variants.len(), 1);
        assert_eq!(product.variants[0].stock, 5);
        assert!(product.images.is_empty());
    }

    #[test]
    fn test_stock_defaults_to_zero() {
        let mut input = valid_product();
        input.variants = Some(vec![VariantInput {
            sku: Some("TR-002".into()),
            ..Default::default()
        }]);
        assert_eq!(new_product(input).unwrap().variants[0].stock, 0);
    }

    #[test]
    fn test_nested_errors_carry_paths() {
        let mut input = valid_product();
        input.price = Some(Decimal::new(-100, 2));
        input.variants = Some(vec![
            VariantInput {
                sku: Some("OK-1".into()),
                stock: Some(1),
                ..Default::default()
            },
            VariantInput {
                sku: Some("X".into()),
                stock: Some(-1),
                ..Default::default()
            },
        ]);

        let fields = fields(new_product(input).unwrap_err());
        assert!(fields.contains(&"price".to_string()));
        assert!(fields.contains(&"variants[1].sku".to_string()));
        assert!(fields.contains(&"variants[1].stock".to_string()));
    }

    #[test]
    fn test_embedded_brand_errors_are_nested() {
        let mut input = valid_product();
        input.brand = Some(CreateBrand {
            name: Some(" ".into()),
            description: None,
        });
        let fields = fields(new_product(input).unwrap_err());
        assert_eq!(fields, vec!["brand.name".to_string()]);
    }

    #[test]
    fn test_duplicate_sku_in_payload_is_conflict() {
        let mut input = valid_product();
        input.variants = Some(vec![
            VariantInput {
                sku: Some("TR-001".into()),
                ..Default::default()
            },
            VariantInput {
                sku: Some("TR-001".into()),
                ..Default::default()
            },
        ]);

        match new_product(input).unwrap_err() {
            ProductError::Conflict { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "TR-001");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_selector_precedence() {
        let mut input = valid_product();
        let brand_id = Uuid::now_v7();
        let category_id = Uuid::now_v7();
        input.brand = Some(CreateBrand {
            name: Some("Acme".into()),
            description: None,
        });
        input.brand_id = Some(brand_id);
        input.category_id = Some(category_id);
        input.category_slug = Some("shoes".into());

        let product = new_product(input.clone()).unwrap();
        assert!(matches!(product.brand, BrandSelector::LookupOrCreate(ref b) if b.name == "Acme"));
        assert_eq!(product.category, CategorySelector::Existing(category_id));

        input.brand = None;
        input.category_id = None;
        let product = new_product(input).unwrap();
        assert_eq!(product.brand, BrandSelector::Existing(brand_id));
        assert_eq!(product.category, CategorySelector::Slug("shoes".into()));
    }

    #[test]
    fn test_update_rejects_duplicate_child_ids() {
        let id = Uuid::now_v7();
        let input = UpdateProduct {
            images: Some(vec![
                ImageInput {
                    id: Some(id),
                    image_url: Some("https://a".into()),
                    alt_text: None,
                },
                ImageInput {
                    id: Some(id),
                    image_url: Some("https://b".into()),
                    alt_text: None,
                },
            ]),
            ..Default::default()
        };
        assert_eq!(fields(product_changes(input).unwrap_err()), vec!["images[1].id"]);
    }

    #[test]
    fn test_partial_update_checks_only_present_fields() {
        let changes = product_changes(UpdateProduct {
            price: Some(Decimal::new(9499, 2)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.price, Some(Decimal::new(9499, 2)));
        assert!(changes.variants.is_none());
        assert!(changes.skus().is_none());

        let err = product_changes(UpdateProduct {
            slug: Some("Not A Slug".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(fields(err), vec!["slug"]);
    }

    #[test]
    fn test_category_cannot_parent_itself() {
        let id = Uuid::now_v7();
        let err = category_changes(
            id,
            UpdateCategory {
                parent_id: Some(id),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(fields(err), vec!["parent_id"]);
    }
}
