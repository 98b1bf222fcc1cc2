/// Profile endpoints for the signed-in user
///
/// - `GET    /api/v1/profile`
/// - `PATCH  /api/v1/profile`
/// - `DELETE /api/v1/profile/image`
use crate::{
    app::AppState,
    envelope::Envelope,
    error::{ApiError, ApiResult},
    extract::Json,
};
use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use pantry_shared::{
    auth::middleware::AuthContext,
    models::user::{ProfileParams, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const RESOURCE: &str = "Profile";

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub profile: ProfileParams,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub full_name: String,
    pub gender: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for ProfileView {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            middle_name: user.middle_name,
            gender: user.gender,
            profile_image_url: user.profile_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileData {
    pub profile: ProfileView,
}

async fn current_user(state: &AppState, auth: &AuthContext) -> ApiResult<User> {
    User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<ProfileData>> {
    let user = current_user(&state, &auth).await?;

    Ok(Envelope::ok(
        "Profile retrieved successfully.",
        ProfileData {
            profile: user.into(),
        },
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ProfileRequest>,
) -> ApiResult<Envelope<ProfileData>> {
    let user = current_user(&state, &auth).await?;

    let mut profile = user.profile();
    req.profile.apply_to(&mut profile);

    let user = User::update_profile(&state.db, user.id, profile)
        .await
        .map_err(|err| ApiError::unprocessable("Profile could not be updated.", err))?
        .ok_or_else(|| ApiError::not_found(RESOURCE))?;

    Ok(Envelope::ok(
        "Profile updated successfully.",
        ProfileData {
            profile: user.into(),
        },
    ))
}

pub async fn destroy_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<ProfileData>> {
    let user = current_user(&state, &auth).await?;

    let user = User::clear_profile_image(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::no_image(RESOURCE))?;

    Ok(Envelope::ok(
        "Profile image deleted successfully.",
        ProfileData {
            profile: user.into(),
        },
    ))
}
