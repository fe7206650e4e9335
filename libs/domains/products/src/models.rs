use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{not_blank, valid_money, valid_slug};

// ============================================================================
// Output projections
// ============================================================================

/// A brand as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Brand reference embedded in product projections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BrandRef {
    pub id: Uuid,
    pub name: String,
}

/// A category as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category reference embedded in other projections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Product reference listed under a brand or category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BrandDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub products: Vec<ProductRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryDetail {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent: Option<CategoryRef>,
    pub children: Vec<CategoryRef>,
    pub products: Vec<ProductRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub stock: i32,
    #[schema(value_type = Option<String>, example = "79.99")]
    pub price_override: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_url: String,
    pub alt_text: Option<String>,
}

/// Product row as returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[schema(value_type = String, example = "89.99")]
    pub price: Decimal,
    pub brand: Option<BrandRef>,
    pub category: Option<CategoryRef>,
    /// Sum of stock across all variants
    pub total_stock: i64,
    pub variant_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full product aggregate: the product with its variants and images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[schema(value_type = String, example = "89.99")]
    pub price: Decimal,
    pub brand: Option<BrandRef>,
    pub category: Option<CategoryRef>,
    pub total_stock: i64,
    pub variant_count: usize,
    /// Ordered by sku, then id
    pub variants: Vec<ProductVariant>,
    /// Ordered by id
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u64, per_page: u64) -> Self {
        Self {
            total,
            page,
            per_page,
            total_pages: total.div_ceil(per_page.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub pagination: Pagination,
}

/// One page of products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub data: Vec<ProductSummary>,
    pub meta: PageMeta,
}

impl ProductPage {
    pub fn new(data: Vec<ProductSummary>, pagination: Pagination) -> Self {
        Self {
            data,
            meta: PageMeta { pagination },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteAck {
    pub message: String,
    pub id: Uuid,
}

impl DeleteAck {
    pub fn product(id: Uuid) -> Self {
        Self {
            message: "Product deleted successfully".to_string(),
            id,
        }
    }
}

// ============================================================================
// Request payloads
// ============================================================================
//
// Required fields are `Option` so that a missing field is reported as a field
// error instead of a deserialization failure.

/// Brand payload, used both embedded in a product and on `POST /brand`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBrand {
    #[validate(required, length(min = 1, max = 100), custom(function = "not_blank"))]
    #[schema(example = "Acme")]
    pub name: Option<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Category payload, used both embedded in a product and on `POST /category`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(required, length(min = 1, max = 100), custom(function = "not_blank"))]
    #[schema(example = "Shoes")]
    pub name: Option<String>,

    #[validate(required, length(min = 1, max = 100), custom(function = "valid_slug"))]
    #[schema(example = "shoes")]
    pub slug: Option<String>,

    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 100), custom(function = "valid_slug"))]
    pub slug: Option<String>,

    pub parent_id: Option<Uuid>,
}

/// Variant payload. On update, `id` matches an existing variant of the product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct VariantInput {
    pub id: Option<Uuid>,

    #[validate(required, length(min = 2, max = 100), custom(function = "not_blank"))]
    #[schema(example = "TR-001")]
    pub sku: Option<String>,

    #[validate(length(max = 50))]
    pub color: Option<String>,

    #[validate(length(max = 50))]
    pub size: Option<String>,

    /// Defaults to 0
    #[validate(range(min = 0))]
    pub stock: Option<i32>,

    #[validate(custom(function = "valid_money"))]
    #[schema(value_type = Option<String>, example = "79.99")]
    pub price_override: Option<Decimal>,
}

/// Image payload. On update, `id` matches an existing image of the product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImageInput {
    pub id: Option<Uuid>,

    #[validate(required, length(min = 1, max = 256), custom(function = "not_blank"))]
    #[schema(example = "https://cdn.example.com/trail-runner.jpg")]
    pub image_url: Option<String>,

    #[validate(length(max = 256))]
    pub alt_text: Option<String>,
}

/// Input for creating a product aggregate
///
/// Brand resolution: `brand` (lookup-or-create by name), then `brand_id`.
/// Category resolution: `category` (lookup-or-create), then `category_id`,
/// then `category_slug`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(required, length(min = 1, max = 100), custom(function = "not_blank"))]
    #[schema(example = "Trail Runner")]
    pub name: Option<String>,

    #[validate(required, length(min = 1, max = 100), custom(function = "valid_slug"))]
    #[schema(example = "trail-runner")]
    pub slug: Option<String>,

    #[validate(required, length(min = 1, max = 256), custom(function = "not_blank"))]
    pub description: Option<String>,

    #[validate(required, custom(function = "valid_money"))]
    #[schema(value_type = String, example = "89.99")]
    pub price: Option<Decimal>,

    #[validate(nested)]
    pub brand: Option<CreateBrand>,

    pub brand_id: Option<Uuid>,

    #[validate(nested)]
    pub category: Option<CreateCategory>,

    pub category_id: Option<Uuid>,

    #[schema(example = "shoes")]
    pub category_slug: Option<String>,

    #[validate(nested)]
    pub variants: Option<Vec<VariantInput>>,

    #[validate(nested)]
    pub images: Option<Vec<ImageInput>>,
}

/// Input for updating a product
///
/// Absent fields are left untouched. A present `variants`/`images` list is the
/// complete new collection: items with a known id are updated, the rest are
/// inserted, and existing items missing from the list are deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 100), custom(function = "valid_slug"))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub description: Option<String>,

    #[validate(custom(function = "valid_money"))]
    #[schema(value_type = Option<String>, example = "94.99")]
    pub price: Option<Decimal>,

    pub brand_id: Option<Uuid>,

    pub category_id: Option<Uuid>,

    #[validate(nested)]
    pub variants: Option<Vec<VariantInput>>,

    #[validate(nested)]
    pub images: Option<Vec<ImageInput>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagination_rounds_up() {
        let p = Pagination::new(25, 2, 10);
        assert_eq!(p.total_pages, 3);
        assert_eq!(Pagination::new(0, 1, 10).total_pages, 0);
        assert_eq!(Pagination::new(20, 1, 10).total_pages, 2);
    }

    #[test]
    fn test_price_accepts_number_or_string() {
        let from_number: CreateProduct = serde_json::from_value(json!({ "price": 89.99 })).unwrap();
        let from_string: CreateProduct =
            serde_json::from_value(json!({ "price": "89.99" })).unwrap();
        assert_eq!(from_number.price, from_string.price);
        assert_eq!(from_string.price, Some(Decimal::new(8999, 2)));
    }

    #[test]
    fn test_missing_required_fields_are_reported() {
        let errors = CreateProduct::default().validate().unwrap_err();
        let fields = errors.field_errors();
        for field in ["name", "slug", "description", "price"] {
            assert!(fields.contains_key(field), "{field} should be required");
        }
    }

    #[test]
    fn test_update_with_nothing_set_is_valid() {
        assert!(UpdateProduct::default().validate().is_ok());
    }

    #[test]
    fn test_delete_ack_message() {
        let id = Uuid::now_v7();
        let ack = serde_json::to_value(DeleteAck::product(id)).unwrap();
        assert_eq!(ack["message"], "Product deleted successfully");
        assert_eq!(ack["id"], id.to_string());
    }
}
