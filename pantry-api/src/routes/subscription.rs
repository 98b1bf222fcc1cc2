/// Subscription endpoints
///
/// - `GET   /api/v1/subscription`
/// - `PATCH /api/v1/subscription`
///
/// Each user has a single subscription, so there is no id in the path.
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
    models::{
        subscription::{Subscription, SubscriptionParams, SubscriptionPlan},
        ModelError,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub subscription: SubscriptionParams,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub id: Uuid,
    pub plan: SubscriptionPlan,
    pub pantry_limit: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionView {
    fn from(subscription: Subscription) -> Self {
        Self {
            active: subscription.is_active(),
            id: subscription.id,
            plan: subscription.plan,
            pantry_limit: subscription.pantry_limit,
            started_at: subscription.started_at,
            expires_at: subscription.expires_at,
            created_at: subscription.created_at,
            updated_at: subscription.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionData {
    pub subscription: SubscriptionView,
}

fn missing() -> ApiError {
    ApiError::NotFound {
        message: "Subscription not found.".to_string(),
        errors: vec!["No subscription found for this user.".to_string()],
    }
}

fn update_failed(err: ModelError) -> ApiError {
    ApiError::unprocessable("Subscription could not be updated.", err)
}

pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<SubscriptionData>> {
    let subscription = Subscription::find_by_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(missing)?;

    Ok(Envelope::ok(
        "Subscription retrieved successfully.",
        SubscriptionData {
            subscription: subscription.into(),
        },
    ))
}

/// Changes the plan or expiry
///
/// The pantry limit set at creation is kept as is.
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SubscriptionRequest>,
) -> ApiResult<Envelope<SubscriptionData>> {
    let current = Subscription::find_by_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(missing)?;

    let changes = req
        .subscription
        .apply_to(&current)
        .map_err(|details| update_failed(ModelError::Validation(details)))?;

    let subscription = Subscription::update(&state.db, auth.user_id, changes)
        .await
        .map_err(update_failed)?
        .ok_or_else(missing)?;

    Ok(Envelope::ok(
        "Subscription updated successfully.",
        SubscriptionData {
            subscription: subscription.into(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_view_reports_active() {
        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan: SubscriptionPlan::Premium,
            pantry_limit: Some(10),
            started_at: Some(now),
            expires_at: Some(now - Duration::days(1)),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(SubscriptionView::from(subscription)).unwrap();
        assert_eq!(value["plan"], "premium");
        assert_eq!(value["pantry_limit"], 10);
        assert_eq!(value["active"], false);
        assert!(value.get("user_id").is_none());
    }

    #[test]
    fn test_missing_subscription_error() {
        match missing() {
            ApiError::NotFound { message, errors } => {
                assert_eq!(message, "Subscription not found.");
                assert_eq!(errors, vec!["No subscription found for this user."]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
