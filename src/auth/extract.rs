use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::auth::errors::AuthError;

/// JSON body whose rejections surface as `invalid_input`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for AuthJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| {
                warn!(status = %e.status(), "rejected request body");
                AuthError::invalid_input(e.body_text())
            })?;
        Ok(AuthJson(value))
    }
}

/// Query string whose rejections surface as `invalid_input`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for AuthQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                warn!("rejected query string");
                AuthError::invalid_input(e.body_text())
            })?;
        Ok(AuthQuery(value))
    }
}
