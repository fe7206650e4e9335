//! Field-level error reporting.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// One offending input field.
///
/// Nested fields use dotted paths with list indices, e.g. `variants[1].sku`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the path, e.g. `sku` under `variants[0]`.
    pub fn nested_under(mut self, parent: &str) -> Self {
        self.field = format!("{parent}.{}", self.field);
        self
    }
}

/// Flatten `validator` output into a sorted list of [`FieldError`]s.
pub fn flatten_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, None, &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.reason.cmp(&b.reason)));
    out
}

fn collect(errors: &ValidationErrors, prefix: Option<&str>, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(parent) => format!("{parent}.{field}"),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|err| FieldError::new(path.clone(), describe(err))));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, Some(&format!("{path}[{index}]")), out);
                }
            }
        }
    }
}

/// Human readable reason for a single validator failure.
pub fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }

    let param = |name: &str| err.params.get(name).map(|v| v.to_string());

    match err.code.as_ref() {
        "required" => "is required".to_string(),
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("length must be between {min} and {max}"),
            (Some(min), None) => format!("length must be at least {min}"),
            (None, Some(max)) => format!("length must be at most {max}"),
            (None, None) => "has an invalid length".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (Some(min), None) => format!("must be at least {min}"),
            (None, Some(max)) => format!("must be at most {max}"),
            (None, None) => "is out of range".to_string(),
        },
        "regex" => "has an invalid format".to_string(),
        "url" => "must be a valid URL".to_string(),
        other => other.replace('_', " "),
    }
}
