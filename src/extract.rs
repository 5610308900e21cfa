use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{error::AppError, validation::Validate};

/// JSON body that has passed its `Validate` rules.
///
/// Malformed bodies and rule violations both answer 422 in the
/// `{success, message}` shape instead of axum's plain-text rejection.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| {
                warn!(error = %e.body_text(), "malformed json body");
                AppError::validation(e.body_text())
            })?;
        value.validate().map_err(|e| {
            warn!(error = %e, "validation failed");
            e
        })?;
        Ok(ValidJson(value))
    }
}
