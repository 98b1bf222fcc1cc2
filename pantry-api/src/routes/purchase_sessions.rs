/// Purchase session endpoints
///
/// - `GET    /api/v1/purchase_sessions` (most recent purchase first)
/// - `GET    /api/v1/purchase_sessions/:id` (includes its lines)
/// - `POST   /api/v1/purchase_sessions` (session and lines in one request)
/// - `PATCH  /api/v1/purchase_sessions/:id` (session columns only)
/// - `DELETE /api/v1/purchase_sessions/:id`
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
    models::{
        purchase_item::{PurchaseItemInput, PurchaseLine},
        purchase_session::{PurchaseSession, PurchaseSessionParams},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const RESOURCE: &str = "Purchase session";

/// Create body
///
/// ```json
/// {
///   "purchase_session": { "store_name": "Market", "purchased_at": "2024-05-01T10:00:00Z" },
///   "purchase_items": [{ "item_id": "...", "quantity": 2, "unit_price": "3.50" }]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseSessionRequest {
    pub purchase_session: PurchaseSessionParams,

    #[serde(default)]
    pub purchase_items: Vec<PurchaseItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseSessionRequest {
    pub purchase_session: PurchaseSessionParams,
}

#[derive(Debug, Serialize)]
pub struct PurchaseSessionView {
    pub id: Uuid,
    pub store_name: String,
    pub total_amount: Option<Decimal>,
    pub purchased_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub items_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PurchaseLine>>,
}

impl PurchaseSessionView {
    pub fn new(session: PurchaseSession, items_count: i64) -> Self {
        Self {
            id: session.id,
            store_name: session.store_name,
            total_amount: session.total_amount,
            purchased_at: session.purchased_at,
            notes: session.notes,
            items_count,
            created_at: session.created_at,
            updated_at: session.updated_at,
            items: None,
        }
    }

    fn with_items(session: PurchaseSession, items: Vec<PurchaseLine>) -> Self {
        let items_count = items.len() as i64;
        Self {
            items: Some(items),
            ..Self::new(session, items_count)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseSessionData {
    pub purchase_session: PurchaseSessionView,
}

#[derive(Debug, Serialize)]
pub struct PurchaseSessionsData {
    pub purchase_sessions: Vec<PurchaseSessionView>,
}

async fn load(state: &AppState, auth: &AuthContext, raw_id: &str) -> ApiResult<PurchaseSession> {
    let id = parse_id(raw_id, RESOURCE)?;
    PurchaseSession::find_owned(&state.db, auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE))
}

pub async fn index(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<PurchaseSessionsData>> {
    let purchase_sessions = PurchaseSession::list_by_user(&state.db, auth.user_id)
        .await?
        .into_iter()
        .map(|listing| PurchaseSessionView::new(listing.session, listing.items_count))
        .collect();

    Ok(Envelope::ok(
        "Purchase sessions retrieved successfully.",
        PurchaseSessionsData { purchase_sessions },
    ))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<PurchaseSessionData>> {
    let session = load(&state, &auth, &id).await?;
    let items = PurchaseSession::lines(&state.db, session.id).await?;

    Ok(Envelope::ok(
        "Purchase session retrieved successfully.",
        PurchaseSessionData {
            purchase_session: PurchaseSessionView::with_items(session, items),
        },
    ))
}

/// Records a shopping trip
///
/// Nothing is stored unless the session and every line are valid and every
/// line refers to one of the user's items.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePurchaseSessionRequest>,
) -> ApiResult<Envelope<PurchaseSessionData>> {
    let (session, items) = PurchaseSession::create_with_items(
        &state.db,
        auth.user_id,
        req.purchase_session.into_attributes(),
        req.purchase_items,
    )
    .await
    .map_err(|err| ApiError::unprocessable("Purchase session could not be created.", err))?;

    Ok(Envelope::created(
        "Purchase session created successfully.",
        PurchaseSessionData {
            purchase_session: PurchaseSessionView::with_items(session, items),
        },
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePurchaseSessionRequest>,
) -> ApiResult<Envelope<PurchaseSessionData>> {
    let session = load(&state, &auth, &id).await?;

    let mut attributes = session.attributes();
    req.purchase_session.apply_to(&mut attributes);

    let session = PurchaseSession::update(&state.db, auth.user_id, session.id, attributes)
        .await
        .map_err(|err| ApiError::unprocessable("Purchase session could not be updated.", err))?
        .ok_or_else(|| ApiError::not_found(RESOURCE))?;
    let items_count = PurchaseSession::items_count(&state.db, session.id).await?;

    Ok(Envelope::ok(
        "Purchase session updated successfully.",
        PurchaseSessionData {
            purchase_session: PurchaseSessionView::new(session, items_count),
        },
    ))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id(&id, RESOURCE)?;

    if !PurchaseSession::delete_owned(&state.db, auth.user_id, id).await? {
        return Err(ApiError::not_found(RESOURCE));
    }

    Ok(Envelope::message("Purchase session deleted successfully."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PurchaseSession {
        let now = Utc::now();
        PurchaseSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            store_name: "Market".to_string(),
            total_amount: None,
            purchased_at: now,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_request_without_items() {
        let req: CreatePurchaseSessionRequest = serde_json::from_value(serde_json::json!({
            "purchase_session": { "store_name": "Market" }
        }))
        .unwrap();

        assert!(req.purchase_items.is_empty());
    }

    #[test]
    fn test_create_request_with_items() {
        let item_id = Uuid::new_v4();
        let req: CreatePurchaseSessionRequest = serde_json::from_value(serde_json::json!({
            "purchase_session": { "store_name": "Market" },
            "purchase_items": [{ "item_id": item_id, "quantity": 2, "unit_price": "3.50" }]
        }))
        .unwrap();

        assert_eq!(req.purchase_items.len(), 1);
        assert_eq!(req.purchase_items[0].item_id, Some(item_id));
        assert_eq!(req.purchase_items[0].unit_price, Some(Decimal::new(350, 2)));
    }

    #[test]
    fn test_view_with_items() {
        let line = PurchaseLine {
            id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            item_name: "Milk".to_string(),
            quantity: Decimal::new(2, 0),
            unit_price: Decimal::new(150, 2),
            total_price: Decimal::new(300, 2),
        };

        let value = serde_json::to_value(PurchaseSessionView::with_items(session(), vec![line]))
            .unwrap();

        assert_eq!(value["items_count"], 1);
        assert_eq!(value["items"][0]["item_name"], "Milk");
        assert_eq!(value["items"][0]["total_price"], "3.00");
    }

    #[test]
    fn test_view_without_items() {
        let value = serde_json::to_value(PurchaseSessionView::new(session(), 4)).unwrap();
        assert_eq!(value["items_count"], 4);
        assert!(value.get("items").is_none());
    }
}
