/// JWT authentication middleware
///
/// Validates the bearer token, rejects revoked tokens and injects the
/// [`AuthContext`] into the request extensions. Handlers behind this layer
/// read it with `Extension<AuthContext>`.
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use pantry_shared::auth::middleware::{authenticate, AuthContext};

use crate::{app::AppState, error::ApiError};

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth: AuthContext = authenticate(&state.db, state.jwt_secret(), req.headers())
        .await
        .map_err(|err| {
            tracing::debug!(error = %err, path = %req.uri().path(), "Rejected request");
            ApiError::from(err)
        })?;

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}
