//! Query model for product listings: filters, sorting and pagination.

use axum_helpers::FieldError;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};

pub const MAX_PER_PAGE: u64 = 100;
/// `GET /product`
pub const DEFAULT_PER_PAGE: u64 = 20;
/// Category, brand and search listings
pub const DEFAULT_FILTERED_PER_PAGE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Price,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sort key; ties always break on id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    /// Lenient parse of the `sort_by` / `sort_order` parameters.
    ///
    /// An unknown field falls back to `created_at desc` as a whole; an unknown
    /// order falls back to `desc`.
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let order = sort_order
            .and_then(|o| SortOrder::from_str(o.trim()).ok())
            .unwrap_or_default();

        match sort_by.map(|s| SortField::from_str(s.trim())) {
            None => Self {
                field: SortField::default(),
                order,
            },
            Some(Ok(field)) => Self { field, order },
            Some(Err(_)) => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    Id(Uuid),
    /// Must name an existing category
    Slug(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<CategoryFilter>,
    pub brand_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Only products whose variant stock sums above zero
    pub in_stock: bool,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u64,
    pub per_page: u64,
    pub filter: ProductFilter,
    pub sort: Sort,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

impl ProductQuery {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page,
            per_page,
            filter: ProductFilter::default(),
            sort: Sort::default(),
        }
    }

    pub fn with_filter(mut self, filter: ProductFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)).saturating_mul(self.per_page)
    }

    /// Storage binds the row offset as a signed 64-bit integer.
    fn offset_fits(&self) -> bool {
        (self.page - 1)
            .checked_mul(self.per_page)
            .is_some_and(|offset| i64::try_from(offset).is_ok())
    }

    /// Reject pagination and price bounds that cannot be answered.
    pub fn validate(&self) -> ProductResult<()> {
        let mut fields = Vec::new();

        if self.page < 1 {
            fields.push(FieldError::new("page", "must be at least 1"));
        } else if !self.offset_fits() {
            fields.push(FieldError::new("page", "is past the last addressable page"));
        }
        if !(1..=MAX_PER_PAGE).contains(&self.per_page) {
            fields.push(FieldError::new(
                "per_page",
                format!("must be between 1 and {MAX_PER_PAGE}"),
            ));
        }

        let ProductFilter {
            min_price,
            max_price,
            ..
        } = &self.filter;
        for (field, bound) in [("min_price", min_price), ("max_price", max_price)] {
            if bound.is_some_and(|b| b.is_sign_negative() && !b.is_zero()) {
                fields.push(FieldError::new(field, "must be at least 0"));
            }
        }
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                fields.push(FieldError::new(
                    "min_price",
                    "must not exceed max_price",
                ));
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ProductError::Validation(fields))
        }
    }

    /// The trimmed search term, if it has any content.
    pub fn search_term(&self) -> Option<&str> {
        self.filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// Escape `LIKE` metacharacters so the term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%term%` pattern for a case-insensitive substring match against a lowered column.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(&term.to_lowercase()))
}

// ============================================================================
// Query string parameters
// ============================================================================

/// `GET /product`
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page index (default 1)
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    /// Page size, 1 to 100 (default 20)
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u64>,
    /// `created_at`, `updated_at`, `price` or `name`
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub sort_order: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> ProductQuery {
        ProductQuery::new(self.page.unwrap_or(1), self.per_page.unwrap_or(DEFAULT_PER_PAGE))
            .with_sort(Sort::parse(self.sort_by.as_deref(), self.sort_order.as_deref()))
    }
}

/// Listing by category slug or brand id
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    /// 1-based page index (default 1)
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    /// Page size, 1 to 100 (default 10)
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u64>,
    #[param(value_type = Option<String>, example = "10.00")]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<String>, example = "100.00")]
    pub max_price: Option<Decimal>,
    /// `true` keeps only products with stock; `false` applies no filter
    pub in_stock: Option<bool>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl FilterParams {
    pub fn into_query(
        self,
        category: Option<CategoryFilter>,
        brand_id: Option<Uuid>,
    ) -> ProductQuery {
        ProductQuery::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_FILTERED_PER_PAGE),
        )
        .with_sort(Sort::parse(self.sort_by.as_deref(), self.sort_order.as_deref()))
        .with_filter(ProductFilter {
            category,
            brand_id,
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock: self.in_stock.unwrap_or(false),
            search: self.search,
        })
    }
}

/// `GET /product/search`
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring of name or description; empty lists everything
    pub search: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u64>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    #[param(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl SearchParams {
    pub fn into_query(self) -> ProductQuery {
        ProductQuery::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_FILTERED_PER_PAGE),
        )
        .with_sort(Sort::parse(self.sort_by.as_deref(), self.sort_order.as_deref()))
        .with_filter(ProductFilter {
            category: self.category_id.map(CategoryFilter::Id),
            brand_id: self.brand_id,
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock: self.in_stock.unwrap_or(false),
            search: self.search,
        })
    }
}
