//! Subscription model
//!
//! Every user has exactly one subscription, created at sign-up on the free
//! plan. The plan carries a `pantry_limit` that is recorded but not enforced;
//! changing the plan later leaves the limit as it was.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE subscriptions (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
//!     plan VARCHAR(20) NOT NULL DEFAULT 'free',
//!     pantry_limit INTEGER,
//!     started_at TIMESTAMPTZ,
//!     expires_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::{assign, nullable, ModelResult};
use crate::validation::{FieldErrors, ValidationErrorDetail};

/// Pantry limit given to free subscriptions at creation
pub const FREE_PANTRY_LIMIT: i32 = 10;

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, plan, pantry_limit, started_at, expires_at, created_at, updated_at";

/// Billing plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Premium,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown subscription plan: {0}")]
pub struct UnknownPlan(pub String);

impl SubscriptionPlan {
    pub const ALL: [&'static str; 2] = ["free", "premium"];

    /// Converts plan to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Premium => "premium",
        }
    }

    /// Limit assigned when a subscription is created; `None` is unlimited
    pub fn default_pantry_limit(&self) -> Option<i32> {
        match self {
            SubscriptionPlan::Free => Some(FREE_PANTRY_LIMIT),
            SubscriptionPlan::Premium => None,
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionPlan {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionPlan::Free),
            "premium" => Ok(SubscriptionPlan::Premium),
            other => Err(UnknownPlan(other.to_string())),
        }
    }
}

impl TryFrom<String> for SubscriptionPlan {
    type Error = UnknownPlan;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,

    #[sqlx(try_from = "String")]
    pub plan: SubscriptionPlan,

    /// Maximum number of pantries; `None` means unlimited
    pub pantry_limit: Option<i32>,

    pub started_at: Option<DateTime<Utc>>,

    /// End of the paid period; `None` never expires
    pub expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription update body (`{"subscription": {...}}`)
///
/// The plan arrives as a string so that unknown values become a validation
/// error instead of a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionParams {
    #[serde(default)]
    pub plan: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Validated subscription changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionChanges {
    pub plan: SubscriptionPlan,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SubscriptionParams {
    /// Applies the sent fields to the current state
    pub fn apply_to(
        self,
        current: &Subscription,
    ) -> Result<SubscriptionChanges, Vec<ValidationErrorDetail>> {
        let mut errors = FieldErrors::new();
        let mut plan = current.plan;

        match self.plan.as_deref().map(str::trim) {
            None => {}
            Some("") => errors.add("plan", "can't be blank"),
            Some(value) => match value.parse() {
                Ok(parsed) => plan = parsed,
                Err(_) => errors.add("plan", "is not included in the list"),
            },
        }

        let mut expires_at = current.expires_at;
        assign(&mut expires_at, self.expires_at);

        errors.into_result()?;
        Ok(SubscriptionChanges { plan, expires_at })
    }
}

impl Subscription {
    /// `expires_at` is absent or still in the future
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }

    /// Inserts a subscription with the plan's default limit, starting now
    pub async fn create<'e, E>(executor: E, user_id: Uuid, plan: SubscriptionPlan) -> ModelResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions (user_id, plan, pantry_limit, started_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(user_id)
        .bind(plan.as_str())
        .bind(plan.default_pantry_limit())
        .fetch_one(executor)
        .await?;

        Ok(subscription)
    }

    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Stores a new plan and expiry; `pantry_limit` is left untouched
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        changes: SubscriptionChanges,
    ) -> ModelResult<Option<Self>> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions
            SET plan = $2, expires_at = $3, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(user_id)
        .bind(changes.plan.as_str())
        .bind(changes.expires_at)
        .fetch_optional(pool)
        .await?;

        if let Some(subscription) = &subscription {
            tracing::info!(user_id = %user_id, plan = %subscription.plan, "Subscription updated");
        }
        Ok(subscription)
    }
}
