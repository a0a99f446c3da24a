//! Extractors that run a [`Schema`] before the handler sees its input.

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::Json;
use http::request::Parts;
use tracing::debug;

use super::schemas::Schema;
use super::validate;
use crate::error::ApiError;

/// JSON body validated against schema `S`.
pub struct ValidatedJson<S: Schema>(pub S::Output);

impl<S, St> FromRequest<St> for ValidatedJson<S>
where
    S: Schema + Send,
    S::Output: Send,
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<S>::from_request(req, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection, "Rejected request body");
                ApiError::field("body", rejection.body_text())
            })?;
        validate(raw).map(ValidatedJson)
    }
}

/// Query string validated against schema `S`.
pub struct ValidatedQuery<S: Schema>(pub S::Output);

impl<S, St> FromRequestParts<St> for ValidatedQuery<S>
where
    S: Schema + Send,
    S::Output: Send,
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<S>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::field("query", rejection.body_text()))?;
        validate(raw).map(ValidatedQuery)
    }
}

/// Numeric resource id taken from the single path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub u64);

impl ResourceId {
    fn parse(raw: &str) -> Result<Self, ApiError> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApiError::field("id", "ID must be a valid number"));
        }
        raw.parse::<u64>()
            .map(ResourceId)
            .map_err(|_| ApiError::field("id", "ID must be a valid number"))
    }
}

impl<St> FromRequestParts<St> for ResourceId
where
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::field("id", "ID must be a valid number"))?;
        ResourceId::parse(&raw)
    }
}
