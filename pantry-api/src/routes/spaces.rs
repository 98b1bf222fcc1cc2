/// Space endpoints
///
/// - `GET    /api/v1/spaces`
/// - `GET    /api/v1/spaces/:id` (includes the storages placed in it)
/// - `POST   /api/v1/spaces`
/// - `PATCH  /api/v1/spaces/:id`
/// - `DELETE /api/v1/spaces/:id`
/// - `DELETE /api/v1/spaces/:id/image`
use crate::{
    app::AppState,
    envelope::{Envelope, Message},
    error::{ApiError, ApiResult},
    extract::{parse_id, Json},
};
use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::{DateTime, Utc};
use pantry_shared::{
    auth::middleware::AuthContext,
    models::space::{Space, SpaceParams, StorageSummary},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const RESOURCE: &str = "Space";

#[derive(Debug, Deserialize)]
pub struct SpaceRequest {
    pub space: SpaceParams,
}

#[derive(Debug, Serialize)]
pub struct SpaceView {
    pub id: Uuid,
    pub name: String,
    pub space_type: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub storages_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storages: Option<Vec<StorageSummary>>,
}

impl SpaceView {
    pub fn new(space: Space, storages_count: i64) -> Self {
        Self {
            id: space.id,
            name: space.name,
            space_type: space.space_type,
            description: space.description,
            image_url: space.image_url,
            storages_count,
            created_at: space.created_at,
            updated_at: space.updated_at,
            storages: None,
        }
    }

    fn with_storages(space: Space, storages: Vec<StorageSummary>) -> Self {
        let storages_count = storages.len() as i64;
        Self {
            storages: Some(storages),
            ..Self::new(space, storages_count)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SpaceData {
    pub space: SpaceView,
}

#[derive(Debug, Serialize)]
pub struct SpacesData {
    pub spaces: Vec<SpaceView>,
}

async fn load(state: &AppState, auth: &AuthContext, raw_id: &str) -> ApiResult<Space> {
    let id = parse_id(raw_id, RESOURCE)?;
    Space::find_owned(&state.db, auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE))
}

pub async fn index(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<SpacesData>> {
    let spaces = Space::list_by_user(&state.db, auth.user_id)
        .await?
        .into_iter()
        .map(|listing| SpaceView::new(listing.space, listing.storages_count))
        .collect();

    Ok(Envelope::ok(
        "Spaces retrieved successfully.",
        SpacesData { spaces },
    ))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<SpaceData>> {
    let space = load(&state, &auth, &id).await?;
    let storages = Space::storages(&state.db, auth.user_id, space.id).await?;

    Ok(Envelope::ok(
        "Space retrieved successfully.",
        SpaceData {
            space: SpaceView::with_storages(space, storages),
        },
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SpaceRequest>,
) -> ApiResult<Envelope<SpaceData>> {
    let space = Space::create(&state.db, auth.user_id, req.space.into_attributes())
        .await
        .map_err(|err| ApiError::unprocessable("Space could not be created.", err))?;

    Ok(Envelope::created(
        "Space created successfully.",
        SpaceData {
            space: SpaceView::new(space, 0),
        },
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<SpaceRequest>,
) -> ApiResult<Envelope<SpaceData>> {
    let space = load(&state, &auth, &id).await?;

    let mut attributes = space.attributes();
    req.space.apply_to(&mut attributes);

    let space = Space::update(&state.db, auth.user_id, space.id, attributes)
        .await
        .map_err(|err| ApiError::unprocessable("Space could not be updated.", err))?
        .ok_or_else(|| ApiError::not_found(RESOURCE))?;
    let storages_count = Space::storages_count(&state.db, space.id).await?;

    Ok(Envelope::ok(
        "Space updated successfully.",
        SpaceData {
            space: SpaceView::new(space, storages_count),
        },
    ))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id(&id, RESOURCE)?;

    if !Space::delete_owned(&state.db, auth.user_id, id).await? {
        return Err(ApiError::not_found(RESOURCE));
    }

    Ok(Envelope::message("Space deleted successfully."))
}

pub async fn destroy_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<SpaceData>> {
    let space = load(&state, &auth, &id).await?;

    let space = Space::clear_image(&state.db, auth.user_id, space.id)
        .await?
        .ok_or_else(|| ApiError::no_image(RESOURCE))?;
    let storages_count = Space::storages_count(&state.db, space.id).await?;

    Ok(Envelope::ok(
        "Space image deleted successfully.",
        SpaceData {
            space: SpaceView::new(space, storages_count),
        },
    ))
}
