/// Request extractors with envelope-shaped rejections
///
/// Axum's own `Json` and `Query` reject with plain-text bodies. These
/// wrappers reject with [`ApiError::BadRequest`] instead, so malformed input
/// is answered with the usual envelope.
use axum::extract::{FromRequest, FromRequestParts};
use uuid::Uuid;

use crate::error::ApiError;

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

/// Parses a path id; anything that is not a UUID cannot name a row
pub fn parse_id(raw: &str, resource: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(resource))
}
