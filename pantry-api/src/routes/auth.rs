/// Authentication endpoints
///
/// - `POST /api/v1/signup` - Create an account (and its free subscription)
/// - `POST /api/v1/login` - Exchange credentials for a JWT
/// - `DELETE /api/v1/logout` - Revoke the presented JWT
///
/// Signing up does not log in; the client calls `/login` afterwards.
use crate::{
    app::AppState,
    envelope::{Envelope, Message},
    error::{to_sentence, ApiError, ApiResult},
    extract::Json,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
};
use pantry_shared::{
    auth::{
        jwt::{self, Claims},
        middleware::{authenticate, AuthError},
        password,
    },
    models::{
        revoked_token::RevokedToken,
        user::{CreateUser, Registration, User},
        ModelError,
    },
    validation::ValidationErrorDetail,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sign-up request (`{"user": {...}}`)
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub user: Registration,
}

/// Login credentials
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// Login request (`{"user": {...}}`)
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user: Credentials,
}

/// The `user` member of auth responses
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupData {
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user: UserSummary,
    pub token: String,
}

fn signup_failed(details: Vec<ValidationErrorDetail>) -> ApiError {
    let messages: Vec<String> = details.iter().map(|detail| detail.message.clone()).collect();
    ApiError::Validation {
        message: format!("User couldn't be created successfully. {}", to_sentence(&messages)),
        details,
    }
}

fn login_failed() -> ApiError {
    ApiError::Unauthorized {
        message: "Login failed. Please check your credentials.".to_string(),
        errors: vec!["Invalid email or password.".to_string()],
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/signup
/// Content-Type: application/json
///
/// {
///   "user": {
///     "email": "user@example.com",
///     "password": "secret123",
///     "password_confirmation": "secret123"
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Body is not JSON or lacks `user`
/// - `422 Unprocessable Entity`: Invalid email or password, email taken
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Envelope<SignupData>> {
    let registration = req.user;
    registration.validate_all().map_err(signup_failed)?;

    let email = registration.email.unwrap_or_default();
    let password_hash =
        password::hash_password(registration.password.as_deref().unwrap_or_default())?;

    let (user, subscription) = User::register(
        &state.db,
        CreateUser {
            email,
            password_hash,
        },
    )
    .await
    .map_err(|err| match err {
        ModelError::Validation(details) => signup_failed(details),
        ModelError::Database(err) => ApiError::from(err),
    })?;

    tracing::info!(user_id = %user.id, plan = %subscription.plan, "User signed up");

    Ok(Envelope::ok(
        "Signed up successfully. Please login to get your token.",
        SignupData {
            user: UserSummary::from(&user),
        },
    ))
}

/// Login endpoint
///
/// Returns the token in `data.token` and in the `Authorization` response
/// header.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(HeaderMap, Envelope<LoginData>)> {
    let email = req.user.email.unwrap_or_default();
    let password = req.user.password.unwrap_or_default();

    if email.trim().is_empty() || password.is_empty() {
        return Err(login_failed());
    }

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(login_failed)?;

    if !password::verify_password(&password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(login_failed());
    }

    User::record_sign_in(&state.db, user.id).await?;

    let claims = Claims::new(user.id, state.token_lifetime());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|err| ApiError::Internal(format!("Invalid token header: {}", err)))?;
    headers.insert(header::AUTHORIZATION, bearer);

    tracing::info!(user_id = %user.id, jti = %claims.jti, "User logged in");

    Ok((
        headers,
        Envelope::ok(
            "Logged in successfully.",
            LoginData {
                user: UserSummary::from(&user),
                token,
            },
        ),
    ))
}

/// Logout endpoint
///
/// Adds the token's `jti` to the denylist until the token expires.
///
/// # Errors
///
/// - `401 Unauthorized`: No valid, unrevoked token was presented
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Message> {
    let auth = authenticate(&state.db, state.jwt_secret(), &headers)
        .await
        .map_err(|err| match err {
            AuthError::Database(err) => ApiError::from(err),
            _ => ApiError::Unauthorized {
                message: "Couldn't find an active session.".to_string(),
                errors: Vec::new(),
            },
        })?;

    RevokedToken::revoke(&state.db, auth.token_id, auth.expires_at).await?;

    if let Err(err) = RevokedToken::purge_expired(&state.db).await {
        tracing::warn!(error = %err, "Failed to purge expired revoked tokens");
    }

    tracing::info!(user_id = %auth.user_id, jti = %auth.token_id, "User logged out");
    Ok(Envelope::message("Logged out successfully."))
}
