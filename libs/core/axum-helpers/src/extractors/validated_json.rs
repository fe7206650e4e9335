//! JSON body extractor that runs `validator` rules.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Deserializes the body and validates it.
///
/// Rejections use the shared error envelope: malformed JSON keeps axum's
/// status, rule violations become a 400 listing every offending field.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CreateBrand {
///     #[validate(length(min = 1, max = 100))]
///     name: String,
/// }
///
/// async fn create_brand(ValidatedJson(payload): ValidatedJson<CreateBrand>) -> String {
///     payload.name
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}
