//! Custom Axum extractors
//!
//! Path ids are taken as strings and validated here so a malformed id is a
//! 400 with the usual JSON body, never axum's plain-text rejection.

use axum::extract::{FromRequest, FromRequestParts, Path, Query};
use axum::http::request::Parts;

use super::error::ApiError;
use crate::models::{parse_id, required, ValidationError};

/// JSON body whose rejections render as [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections render as [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Extract and validate a positive integer id from a single-segment path
pub struct ValidId(pub i64);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        Ok(Self(parse_id("id", &raw)?))
    }
}

/// Extract and validate two positive integer ids from the path
pub struct ValidIdPair(pub i64, pub i64);

impl<S> FromRequestParts<S> for ValidIdPair
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((first, second)): Path<(String, String)> =
            Path::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        Ok(Self(parse_id("id", &first)?, parse_id("id", &second)?))
    }
}

/// Validate a required id that arrived in the query string.
pub fn query_id(field: &'static str, raw: Option<&str>) -> Result<i64, ValidationError> {
    parse_id(field, required(field, raw)?)
}
