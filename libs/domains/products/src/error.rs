use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, FieldError};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("{resource} '{key}' not found")]
    NotFound { resource: &'static str, key: String },

    #[error("{}", conflict_message(field, value))]
    Conflict { field: String, value: String },

    #[error("{}", reference_message(relation, id))]
    InvalidReference { relation: &'static str, id: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

fn conflict_message(field: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{field} already exists")
    } else {
        format!("{field} '{value}' already exists")
    }
}

fn reference_message(relation: &str, id: &str) -> String {
    if id.is_empty() {
        format!("Referenced {relation} not found")
    } else {
        format!("Referenced {relation} '{id}' not found")
    }
}

impl ProductError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ProductError::Validation(vec![FieldError::new(field, reason)])
    }

    pub fn not_found(resource: &'static str, key: impl ToString) -> Self {
        ProductError::NotFound {
            resource,
            key: key.to_string(),
        }
    }

    pub fn conflict(field: impl Into<String>, value: impl Into<String>) -> Self {
        ProductError::Conflict {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn invalid_reference(relation: &'static str, id: impl ToString) -> Self {
        ProductError::InvalidReference {
            relation,
            id: id.to_string(),
        }
    }
}

/// Input field guarded by a unique constraint, keyed by the constraint name
/// used in the catalog migration.
pub(crate) fn conflict_field(message: &str) -> &'static str {
    const FIELDS: &[(&str, &str)] = &[
        ("uq_product_variants_product_sku", "sku"),
        ("uq_product_variants_sku", "sku"),
        ("uq_products_name", "name"),
        ("uq_products_slug", "slug"),
        ("uq_brands_name", "name"),
        ("uq_categories_name", "name"),
        ("uq_categories_slug", "slug"),
    ];

    FIELDS
        .iter()
        .find(|(constraint, _)| message.contains(constraint))
        .map(|(_, field)| *field)
        .unwrap_or("unique")
}

/// Relation named by a foreign key constraint.
pub(crate) fn reference_relation(message: &str) -> &'static str {
    const RELATIONS: &[(&str, &str)] = &[
        ("fk_products_brand_id", "brand"),
        ("fk_products_category_id", "category"),
        ("fk_categories_parent_id", "parent"),
        ("fk_product_variants_product_id", "product"),
        ("fk_product_images_product_id", "product"),
    ];

    RELATIONS
        .iter()
        .find(|(constraint, _)| message.contains(constraint))
        .map(|(_, relation)| *relation)
        .unwrap_or("record")
}

impl From<DbErr> for ProductError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                tracing::warn!(%message, "Unique constraint violated");
                ProductError::conflict(conflict_field(&message), String::new())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                tracing::warn!(%message, "Foreign key constraint violated");
                ProductError::invalid_reference(reference_relation(&message), "")
            }
            _ => ProductError::Storage(err.to_string()),
        }
    }
}

/// Convert ProductError to AppError for the shared error envelope
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Validation(fields) => AppError::Validation(fields),
            err @ (ProductError::NotFound { .. } | ProductError::InvalidReference { .. }) => {
                AppError::NotFound(err.to_string())
            }
            ProductError::Conflict { field, value } => AppError::Conflict {
                message: conflict_message(&field, &value),
                fields: vec![FieldError::new(field, "already exists")],
            },
            ProductError::Storage(detail) => AppError::Storage(detail),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_conflict_field_from_constraint_name() {
        let message = r#"duplicate key value violates unique constraint "uq_product_variants_sku""#;
        assert_eq!(conflict_field(message), "sku");
        assert_eq!(conflict_field("uq_products_slug"), "slug");
        assert_eq!(conflict_field("something else"), "unique");
    }

    #[test]
    fn test_reference_relation_from_constraint_name() {
        let message = concat!(
            r#"insert or update on table "products" "#,
            r#"violates foreign key constraint "fk_products_brand_id""#
        );
        assert_eq!(reference_relation(message), "brand");
        assert_eq!(reference_relation("fk_categories_parent_id"), "parent");
    }

    #[test]
    fn test_messages_name_the_offender() {
        assert_eq!(
            ProductError::conflict("sku", "TR-001").to_string(),
            "sku 'TR-001' already exists"
        );
        assert_eq!(ProductError::conflict("slug", "").to_string(), "slug already exists");
        assert_eq!(
            ProductError::not_found("Category", "shoes").to_string(),
            "Category 'shoes' not found"
        );
        assert_eq!(
            ProductError::invalid_reference("brand", "abc").to_string(),
            "Referenced brand 'abc' not found"
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ProductError::invalid("price", "must be at least 0"), StatusCode::BAD_REQUEST),
            (ProductError::not_found("Product", "x"), StatusCode::NOT_FOUND),
            (ProductError::invalid_reference("category", "x"), StatusCode::NOT_FOUND),
            (ProductError::conflict("sku", "A"), StatusCode::CONFLICT),
            (ProductError::Storage("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_plain_db_error_is_storage() {
        let err = ProductError::from(DbErr::Custom("connection reset".into()));
        assert!(matches!(err, ProductError::Storage(_)));
    }
}
