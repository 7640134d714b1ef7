//! Axum extractor that parses, validates and sanitizes a JSON body.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::sanitize::Sanitize;
use super::schema::field_errors;
use crate::error::ApiError;

/// Structural failures answer `INVALID_JSON`; rule violations answer
/// `VALIDATION_ERROR` with every offending field listed.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Sanitize + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                ApiError::invalid_json(rejection.body_text())
            })?;

        check(&payload)?;
        payload.sanitize();
        // Sanitizing can empty a field that passed (e.g. a name of only `<>`).
        check(&payload)?;
        Ok(ValidatedJson(payload))
    }
}

fn check<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload.validate().map_err(|errors| {
        let field_errors = field_errors(&errors);
        tracing::debug!("Validation failed for {} field(s)", field_errors.len());
        ApiError::validation_error("Validation failed", Some(field_errors))
    })
}
