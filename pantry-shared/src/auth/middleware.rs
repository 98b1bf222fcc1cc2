//! Bearer token authentication
//!
//! Extracts the JWT from the `Authorization: Bearer <token>` header,
//! validates it, and checks that it has not been revoked by a logout. The API
//! crate wraps [`authenticate`] in an Axum middleware that inserts the
//! resulting [`AuthContext`] into the request extensions.
//!
//! # Example
//!
//! ```
//! use axum::Extension;
//! use pantry_shared::auth::middleware::AuthContext;
//!
//! async fn handler(Extension(auth): Extension<AuthContext>) -> String {
//!     format!("User: {}", auth.user_id)
//! }
//! ```

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::revoked_token::RevokedToken;

/// Authentication context added to request extensions
///
/// Handlers pass `user_id` explicitly to every model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// `jti` of the presented token, needed to revoke it at logout
    pub token_id: Uuid,

    /// When the presented token stops being valid anyway
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            token_id: claims.jti,
            expires_at: claims.expires_at(),
        }
    }
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Missing authorization token")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Signature, issuer or timestamps rejected
    #[error("Invalid token")]
    InvalidToken(#[source] JwtError),

    #[error("Token has expired")]
    Expired,

    /// Token was logged out
    #[error("Token has been revoked")]
    Revoked,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            other => AuthError::InvalidToken(other),
        }
    }
}

/// Returns the token from an `Authorization: Bearer <token>` header
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use pantry_shared::auth::middleware::bearer_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
/// assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}

/// Validates the request's bearer token and checks the revocation list
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_token(token, secret)?;

    if RevokedToken::is_revoked(pool, claims.jti).await? {
        tracing::debug!(user_id = %claims.sub, jti = %claims.jti, "Rejected revoked token");
        return Err(AuthError::Revoked);
    }

    Ok(AuthContext::from_claims(&claims))
}
