/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `ApiResult<T>`; errors are rendered through the same
/// [`Envelope`] as successful responses.
///
/// # Example
///
/// ```
/// use pantry_api::error::{ApiError, ApiResult};
///
/// fn find(found: bool) -> ApiResult<&'static str> {
///     if found {
///         Ok("item")
///     } else {
///         Err(ApiError::not_found("Item"))
///     }
/// }
///
/// assert!(find(false).is_err());
/// ```
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pantry_shared::{
    auth::{jwt::JwtError, middleware::AuthError, password::PasswordError},
    models::ModelError,
    validation::ValidationErrorDetail,
};

use crate::envelope::Envelope;

/// Message for requests to protected routes without a usable token
pub const UNAUTHENTICATED: &str = "You need to sign in or sign up before continuing.";

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unparsable body or query string (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, invalid, expired or revoked token; failed login (401)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String, errors: Vec<String> },

    /// Missing row, or a row owned by someone else (404)
    #[error("Not found: {message}")]
    NotFound { message: String, errors: Vec<String> },

    /// Rejected attributes (422)
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: Vec<ValidationErrorDetail>,
    },

    /// Anything else (500); details are logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// 404 for a resource that does not exist or is not the caller's
    pub fn not_found(resource: &str) -> Self {
        ApiError::NotFound {
            message: format!("{} not found.", resource),
            errors: vec![format!(
                "{} does not exist or you do not have permission to access it.",
                resource
            )],
        }
    }

    /// 404 for deleting an image that is not set
    pub fn no_image(resource: &str) -> Self {
        let resource = resource.to_lowercase();
        ApiError::NotFound {
            message: format!("No {} image found.", resource),
            errors: vec![format!("No {} image to delete.", resource)],
        }
    }

    /// 401 for protected routes
    pub fn unauthenticated(reason: impl ToString) -> Self {
        ApiError::Unauthorized {
            message: UNAUTHENTICATED.to_string(),
            errors: vec![reason.to_string()],
        }
    }

    /// Maps a failed model write, using `message` for validation failures
    pub fn unprocessable(message: impl Into<String>, err: ModelError) -> Self {
        match err {
            ModelError::Validation(details) => ApiError::Validation {
                message: message.into(),
                details,
            },
            ModelError::Database(err) => ApiError::from(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, errors) = match self {
            ApiError::BadRequest(msg) => ("Bad request.".to_string(), vec![msg]),
            ApiError::Unauthorized { message, errors } => (message, errors),
            ApiError::NotFound { message, errors } => (message, errors),
            ApiError::Validation { message, details } => (
                message,
                details.into_iter().map(|detail| detail.message).collect(),
            ),
            ApiError::Internal(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred.".to_string(), Vec::new())
            }
        };

        Envelope::error(status, message, errors).into_response()
    }
}

/// Constraint violations become 422, everything else 500
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return ApiError::not_found("Record");
        }

        match ModelError::from(err) {
            ModelError::Validation(details) => ApiError::Validation {
                message: "Record is invalid.".to_string(),
                details,
            },
            ModelError::Database(err) => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        ApiError::unprocessable("Record is invalid.", err)
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Database(err) => ApiError::Internal(format!("Database error: {}", err)),
            other => ApiError::unauthenticated(other),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Token creation failures are server-side problems
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::Internal(format!("Token operation failed: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Joins messages the way they read in a sentence
///
/// ```
/// use pantry_api::error::to_sentence;
///
/// assert_eq!(to_sentence(&["a".to_string()]), "a");
/// assert_eq!(to_sentence(&["a".to_string(), "b".to_string()]), "a and b");
/// assert_eq!(
///     to_sentence(&["a".to_string(), "b".to_string(), "c".to_string()]),
///     "a, b, and c"
/// );
/// ```
pub fn to_sentence(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_shared::auth::middleware::AuthError;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::not_found("Storage");
        assert_eq!(err.to_string(), "Not found: Storage not found.");
    }

    #[tokio::test]
    async fn test_not_found_rendering() {
        let (status, body) = body_json(ApiError::not_found("Item")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"]["code"], 404);
        assert_eq!(body["status"]["message"], "Item not found.");
        assert_eq!(
            body["errors"][0],
            "Item does not exist or you do not have permission to access it."
        );
    }

    #[tokio::test]
    async fn test_no_image_rendering() {
        let (status, body) = body_json(ApiError::no_image("Space")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"]["message"], "No space image found.");
        assert_eq!(body["errors"][0], "No space image to delete.");
    }

    #[tokio::test]
    async fn test_validation_rendering() {
        let err = ApiError::unprocessable(
            "Item could not be created.",
            ModelError::invalid("name", "can't be blank"),
        );
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"]["message"], "Item could not be created.");
        assert_eq!(body["errors"], serde_json::json!(["Name can't be blank"]));
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (status, body) = body_json(ApiError::Internal("connection refused".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("errors").is_none());
        assert!(!body.to_string().contains("connection refused"));
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        let err = ApiError::from(AuthError::Revoked);
        match err {
            ApiError::Unauthorized { message, errors } => {
                assert_eq!(message, UNAUTHENTICATED);
                assert_eq!(errors, vec!["Token has been revoked".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = ApiError::from(AuthError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_row_not_found_is_404() {
        assert_eq!(ApiError::from(sqlx::Error::RowNotFound).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_to_sentence_empty() {
        assert_eq!(to_sentence(&[]), "");
    }
}
