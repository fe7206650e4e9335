//! Machine-readable error kinds.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::Conflict;
//! assert_eq!(code.as_str(), "CONFLICT");
//! assert_eq!(code.code(), 1008);
//! ```

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use utoipa::ToSchema;

/// The `kind` of an error body. Serialized as SCREAMING_SNAKE_CASE.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// One or more input fields break a rule
    ValidationError,
    /// A path id is not a UUID
    InvalidUuid,
    /// The body is not JSON of the expected shape
    JsonExtraction,
    /// The query string could not be decoded
    InvalidQuery,
    NotFound,
    /// A unique field is already taken
    Conflict,
    /// The store failed; details stay in the logs
    StorageError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Numeric code for logs: 1xxx request problems, 2xxx storage.
    pub fn code(self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidUuid => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::Conflict => 1008,
            Self::InvalidQuery => 1012,
            Self::StorageError => 2003,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_serde_agree() {
        for code in [
            ErrorCode::ValidationError,
            ErrorCode::InvalidUuid,
            ErrorCode::JsonExtraction,
            ErrorCode::InvalidQuery,
            ErrorCode::NotFound,
            ErrorCode::Conflict,
            ErrorCode::StorageError,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
            assert_eq!(serde_json::from_str::<ErrorCode>(&json).unwrap(), code);
        }
        assert_eq!(ErrorCode::InvalidUuid.as_str(), "INVALID_UUID");
        assert_eq!(ErrorCode::StorageError.code(), 2003);
    }
}
