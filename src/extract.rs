use crate::errors::AppError;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::warn;
use validator::Validate;

/// JSON body that has already passed its `validator` rules. Anything that
/// fails to parse or validate is answered with a plain 400.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            warn!("rejected body: {rejection}");
            AppError::invalid_request()
        })?;
        value.validate().map_err(|err| {
            warn!("invalid body: {err}");
            AppError::invalid_request()
        })?;
        Ok(Self(value))
    }
}

/// Query-string counterpart of [`ValidJson`], with the same 400 body.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                warn!("rejected query: {rejection}");
                AppError::invalid_request()
            })?;
        value.validate().map_err(|err| {
            warn!("invalid query: {err}");
            AppError::invalid_request()
        })?;
        Ok(Self(value))
    }
}
