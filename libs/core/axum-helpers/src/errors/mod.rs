pub mod codes;
pub mod fields;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;
pub use fields::{FieldError, flatten_validation_errors};

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error response.
///
/// - `code`: integer for logs and monitoring (e.g. 1008)
/// - `kind`: machine-readable identifier (e.g. `"CONFLICT"`)
/// - `message`: human-readable summary naming the missing resource or the rule broken
/// - `fields`: offending input fields, present for validation and conflict errors
///
/// ```json
/// {
///   "code": 1008,
///   "kind": "CONFLICT",
///   "message": "sku 'TR-001' already exists",
///   "fields": [{ "field": "sku", "reason": "already exists" }]
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: i32,
    pub kind: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            kind: code,
            message: message.into(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// Errors that reach the HTTP boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Query string error: {0}")]
    QueryRejection(#[from] QueryRejection),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        fields: Vec<FieldError>,
    },

    /// The detail is logged, never sent to the client
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(flatten_validation_errors(&errors))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorResponse) {
        match self {
            AppError::JsonExtractorRejection(e) => {
                (e.status(), ErrorResponse::new(ErrorCode::JsonExtraction, e.body_text()))
            }
            AppError::QueryRejection(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::InvalidQuery, e.body_text()),
            ),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::ValidationError, "Request validation failed")
                    .with_fields(fields),
            ),
            AppError::InvalidUuid(raw) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::InvalidUuid, format!("Invalid UUID: {raw}")),
            ),
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(ErrorCode::NotFound, message),
            ),
            AppError::Conflict { message, fields } => {
                let body = ErrorResponse::new(ErrorCode::Conflict, message);
                let body = if fields.is_empty() { body } else { body.with_fields(fields) };
                (StatusCode::CONFLICT, body)
            }
            AppError::Storage(detail) => {
                tracing::error!(
                    error_code = ErrorCode::StorageError.code(),
                    %detail,
                    "Storage error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(ErrorCode::StorageError, "A storage error occurred"),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_client_error() {
            tracing::info!(
                status = status.as_u16(),
                error_code = body.code,
                kind = %body.kind,
                message = %body.message,
                "Request rejected"
            );
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let (status, body) = body_of(AppError::Validation(vec![FieldError::new(
            "price",
            "must be at least 0",
        )]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "VALIDATION_ERROR");
        assert_eq!(body["code"], 1001);
        assert_eq!(body["fields"][0]["field"], "price");
    }

    #[tokio::test]
    async fn test_conflict_maps_to_409() {
        let (status, body) = body_of(AppError::Conflict {
            message: "sku 'A-1' already exists".into(),
            fields: vec![FieldError::new("sku", "already exists")],
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "CONFLICT");
        assert_eq!(body["fields"][0]["field"], "sku");
    }

    #[tokio::test]
    async fn test_not_found_has_no_fields() {
        let (status, body) = body_of(AppError::NotFound("Product 1 not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product 1 not found");
        assert!(body.get("fields").is_none());
    }

    #[tokio::test]
    async fn test_storage_error_hides_detail() {
        let err = AppError::from(DbErr::Custom("connection reset".into()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "STORAGE_ERROR");
        assert_eq!(body["message"], "A storage error occurred");
    }
}
