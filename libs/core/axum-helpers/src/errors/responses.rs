//! Reusable OpenAPI responses for the error envelope.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "code": 2003,
        "kind": "STORAGE_ERROR",
        "message": "A storage error occurred"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "code": 1001,
        "kind": "VALIDATION_ERROR",
        "message": "Request validation failed",
        "fields": [
            { "field": "price", "reason": "must not be negative" },
            { "field": "variants[0].sku", "reason": "length must be between 2 and 100" }
        ]
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Invalid UUID",
    content_type = "application/json",
    example = json!({
        "code": 1002,
        "kind": "INVALID_UUID",
        "message": "Invalid UUID: not-a-uuid"
    })
)]
pub struct BadRequestUuidResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "code": 1004,
        "kind": "NOT_FOUND",
        "message": "Category 'boots' not found"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Conflict - Unique value already taken",
    content_type = "application/json",
    example = json!({
        "code": 1008,
        "kind": "CONFLICT",
        "message": "sku 'TR-001' already exists",
        "fields": [{ "field": "sku", "reason": "already exists" }]
    })
)]
pub struct ConflictResponse(pub ErrorResponse);
