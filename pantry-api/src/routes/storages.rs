/// Storage endpoints
///
/// - `GET    /api/v1/storages`
/// - `GET    /api/v1/storages/:id`
/// - `POST   /api/v1/storages`
/// - `PATCH  /api/v1/storages/:id`
/// - `DELETE /api/v1/storages/:id` (removes nested storages and their items)
/// - `DELETE /api/v1/storages/:id/image`
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
    models::storage::{Storage, StorageListing, StorageParams},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const RESOURCE: &str = "Storage";

#[derive(Debug, Deserialize)]
pub struct StorageRequest {
    pub storage: StorageParams,
}

#[derive(Debug, Serialize)]
pub struct StorageView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub space_id: Option<Uuid>,
    pub space_name: Option<String>,
    pub parent_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub children_count: i64,
    pub items_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StorageListing> for StorageView {
    fn from(listing: StorageListing) -> Self {
        let storage = listing.storage;
        Self {
            id: storage.id,
            name: storage.name,
            description: storage.description,
            space_id: storage.space_id,
            space_name: listing.space_name,
            parent_id: storage.parent_id,
            image_url: storage.image_url,
            children_count: listing.children_count,
            items_count: listing.items_count,
            created_at: storage.created_at,
            updated_at: storage.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StorageData {
    pub storage: StorageView,
}

#[derive(Debug, Serialize)]
pub struct StoragesData {
    pub storages: Vec<StorageView>,
}

/// Reloads a storage with its space name and counts
async fn view(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<StorageView> {
    Storage::find_listing(&state.db, auth.user_id, id)
        .await?
        .map(StorageView::from)
        .ok_or_else(|| ApiError::not_found(RESOURCE))
}

async fn load(state: &AppState, auth: &AuthContext, raw_id: &str) -> ApiResult<Storage> {
    let id = parse_id(raw_id, RESOURCE)?;
    Storage::find_owned(&state.db, auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE))
}

pub async fn index(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<StoragesData>> {
    let storages = Storage::list_by_user(&state.db, auth.user_id)
        .await?
        .into_iter()
        .map(StorageView::from)
        .collect();

    Ok(Envelope::ok(
        "Storages retrieved successfully.",
        StoragesData { storages },
    ))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<StorageData>> {
    let id = parse_id(&id, RESOURCE)?;
    let storage = view(&state, &auth, id).await?;

    Ok(Envelope::ok(
        "Storage retrieved successfully.",
        StorageData { storage },
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<StorageRequest>,
) -> ApiResult<Envelope<StorageData>> {
    let storage = Storage::create(&state.db, auth.user_id, req.storage.into_attributes())
        .await
        .map_err(|err| ApiError::unprocessable("Storage could not be created.", err))?;

    Ok(Envelope::created(
        "Storage created successfully.",
        StorageData {
            storage: view(&state, &auth, storage.id).await?,
        },
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<StorageRequest>,
) -> ApiResult<Envelope<StorageData>> {
    let storage = load(&state, &auth, &id).await?;

    let mut attributes = storage.attributes();
    req.storage.apply_to(&mut attributes);

    let storage = Storage::update(&state.db, auth.user_id, storage.id, attributes)
        .await
        .map_err(|err| ApiError::unprocessable("Storage could not be updated.", err))?
        .ok_or_else(|| ApiError::not_found(RESOURCE))?;

    Ok(Envelope::ok(
        "Storage updated successfully.",
        StorageData {
            storage: view(&state, &auth, storage.id).await?,
        },
    ))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id(&id, RESOURCE)?;

    if !Storage::delete_owned(&state.db, auth.user_id, id).await? {
        return Err(ApiError::not_found(RESOURCE));
    }

    Ok(Envelope::message("Storage deleted successfully."))
}

pub async fn destroy_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<StorageData>> {
    let storage = load(&state, &auth, &id).await?;

    let storage = Storage::clear_image(&state.db, auth.user_id, storage.id)
        .await?
        .ok_or_else(|| ApiError::no_image(RESOURCE))?;

    Ok(Envelope::ok(
        "Storage image deleted successfully.",
        StorageData {
            storage: view(&state, &auth, storage.id).await?,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_from_listing() {
        let now = Utc::now();
        let space_id = Uuid::new_v4();
        let listing = StorageListing {
            storage: Storage {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                parent_id: None,
                space_id: Some(space_id),
                name: "Pantry".to_string(),
                description: Some("Dry goods".to_string()),
                image_url: None,
                created_at: now,
                updated_at: now,
            },
            space_name: Some("Kitchen".to_string()),
            children_count: 2,
            items_count: 5,
        };

        let value = serde_json::to_value(StorageView::from(listing)).unwrap();
        assert_eq!(value["space_name"], "Kitchen");
        assert_eq!(value["space_id"], space_id.to_string());
        assert_eq!(value["children_count"], 2);
        assert_eq!(value["items_count"], 5);
        assert!(value["parent_id"].is_null());
    }

    #[test]
    fn test_request_requires_wrapper() {
        let missing = serde_json::from_value::<StorageRequest>(serde_json::json!({ "name": "x" }));
        assert!(missing.is_err());
    }
}
