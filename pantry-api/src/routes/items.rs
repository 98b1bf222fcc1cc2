/// Item endpoints
///
/// - `GET    /api/v1/items` (optional `?storage_id=`)
/// - `GET    /api/v1/items/low_stock`
/// - `GET    /api/v1/items/out_of_stock`
/// - `GET    /api/v1/items/:id`
/// - `POST   /api/v1/items`
/// - `PATCH  /api/v1/items/:id`
/// - `DELETE /api/v1/items/:id`
/// - `DELETE /api/v1/items/:id/image`
///
/// Every item is rendered with its location breadcrumbs and stock flags.
use crate::{
    app::AppState,
    envelope::{Envelope, Message},
    error::{ApiError, ApiResult},
    extract::{parse_id, Json, Query},
};
use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::{DateTime, NaiveDate, Utc};
use pantry_shared::{
    auth::middleware::AuthContext,
    inventory::{Breadcrumb, StorageTree},
    models::{
        item::{Item, ItemListing, ItemParams},
        storage::Storage,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const RESOURCE: &str = "Item";

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub item: ItemParams,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    #[serde(default)]
    pub storage_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub id: Uuid,
    pub name: String,
    pub quantity: Option<Decimal>,
    pub unit: String,
    pub min_quantity: Option<Decimal>,
    pub out_of_stock_threshold: Option<Decimal>,
    pub low_stock_alert_enabled: bool,
    pub out_of_stock_alert_enabled: bool,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub storage_id: Uuid,
    pub storage_name: String,
    pub image_url: Option<String>,
    pub location_path: String,
    pub location_array: Vec<Breadcrumb>,
    pub low_stock: bool,
    pub out_of_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemView {
    pub fn new(listing: ItemListing, tree: &StorageTree) -> Self {
        let item = listing.item;
        let status = item.stock_levels().status();
        let location = tree.locate(item.storage_id, item.id, &item.name);

        Self {
            id: item.id,
            name: item.name,
            quantity: item.quantity,
            unit: item.unit,
            min_quantity: item.min_quantity,
            out_of_stock_threshold: item.out_of_stock_threshold,
            low_stock_alert_enabled: item.low_stock_alert_enabled,
            out_of_stock_alert_enabled: item.out_of_stock_alert_enabled,
            expiration_date: item.expiration_date,
            notes: item.notes,
            storage_id: item.storage_id,
            storage_name: listing.storage_name,
            image_url: item.image_url,
            location_path: location.path,
            location_array: location.breadcrumbs,
            low_stock: status.low_stock,
            out_of_stock: status.out_of_stock,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemData {
    pub item: ItemView,
}

#[derive(Debug, Serialize)]
pub struct ItemsData {
    pub items: Vec<ItemView>,
}

async fn render_all(
    state: &AppState,
    auth: &AuthContext,
    listings: Vec<ItemListing>,
) -> ApiResult<Vec<ItemView>> {
    if listings.is_empty() {
        return Ok(Vec::new());
    }

    let tree = Storage::tree(&state.db, auth.user_id).await?;
    Ok(listings
        .into_iter()
        .map(|listing| ItemView::new(listing, &tree))
        .collect())
}

async fn view(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<ItemView> {
    let listing = Item::find_listing(&state.db, auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE))?;
    let tree = Storage::tree(&state.db, auth.user_id).await?;

    Ok(ItemView::new(listing, &tree))
}

async fn load(state: &AppState, auth: &AuthContext, raw_id: &str) -> ApiResult<Item> {
    let id = parse_id(raw_id, RESOURCE)?;
    Item::find_owned(&state.db, auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE))
}

/// Lists items, optionally within one storage
///
/// An unknown or malformed `storage_id` yields an empty list.
pub async fn index(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ItemsQuery>,
) -> ApiResult<Envelope<ItemsData>> {
    let listings = match query.storage_id.as_deref().map(str::trim) {
        None | Some("") => Item::list_by_user(&state.db, auth.user_id, None).await?,
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(storage_id) => Item::list_by_user(&state.db, auth.user_id, Some(storage_id)).await?,
            Err(_) => Vec::new(),
        },
    };

    Ok(Envelope::ok(
        "Items retrieved successfully.",
        ItemsData {
            items: render_all(&state, &auth, listings).await?,
        },
    ))
}

pub async fn low_stock(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<ItemsData>> {
    let listings = Item::low_stock(&state.db, auth.user_id).await?;

    Ok(Envelope::ok(
        "Low stock items retrieved successfully.",
        ItemsData {
            items: render_all(&state, &auth, listings).await?,
        },
    ))
}

pub async fn out_of_stock(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<ItemsData>> {
    let listings = Item::out_of_stock(&state.db, auth.user_id).await?;

    Ok(Envelope::ok(
        "Out of stock items retrieved successfully.",
        ItemsData {
            items: render_all(&state, &auth, listings).await?,
        },
    ))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<ItemData>> {
    let id = parse_id(&id, RESOURCE)?;

    Ok(Envelope::ok(
        "Item retrieved successfully.",
        ItemData {
            item: view(&state, &auth, id).await?,
        },
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ItemRequest>,
) -> ApiResult<Envelope<ItemData>> {
    let item = Item::create(&state.db, auth.user_id, req.item.into_attributes())
        .await
        .map_err(|err| ApiError::unprocessable("Item could not be created.", err))?;

    Ok(Envelope::created(
        "Item created successfully.",
        ItemData {
            item: view(&state, &auth, item.id).await?,
        },
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<ItemRequest>,
) -> ApiResult<Envelope<ItemData>> {
    let item = load(&state, &auth, &id).await?;

    let mut attributes = item.attributes();
    req.item.apply_to(&mut attributes);

    let item = Item::update(&state.db, auth.user_id, item.id, attributes)
        .await
        .map_err(|err| ApiError::unprocessable("Item could not be updated.", err))?
        .ok_or_else(|| ApiError::not_found(RESOURCE))?;

    Ok(Envelope::ok(
        "Item updated successfully.",
        ItemData {
            item: view(&state, &auth, item.id).await?,
        },
    ))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id(&id, RESOURCE)?;

    if !Item::delete_owned(&state.db, auth.user_id, id).await? {
        return Err(ApiError::not_found(RESOURCE));
    }

    Ok(Envelope::message("Item deleted successfully."))
}

pub async fn destroy_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<ItemData>> {
    let item = load(&state, &auth, &id).await?;

    let item = Item::clear_image(&state.db, auth.user_id, item.id)
        .await?
        .ok_or_else(|| ApiError::no_image(RESOURCE))?;

    Ok(Envelope::ok(
        "Item image deleted successfully.",
        ItemData {
            item: view(&state, &auth, item.id).await?,
        },
    ))
}
