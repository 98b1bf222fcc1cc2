//! Purchase session model
//!
//! A shopping trip: store, optional total, date and its purchase lines.
//! A session and the lines sent with it are written in one transaction.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE purchase_sessions (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     store_name VARCHAR(255) NOT NULL,
//!     total_amount NUMERIC(10, 2),
//!     purchased_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     notes TEXT,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::purchase_item::{line_detail, PurchaseItem, PurchaseItemInput, PurchaseLine};
use super::{assign, nullable, presence, ModelError, ModelResult};
use crate::validation::{FieldErrors, ValidationErrorDetail};

const PURCHASE_SESSION_COLUMNS: &str =
    "purchase_sessions.id, purchase_sessions.user_id, purchase_sessions.store_name, \
     purchase_sessions.total_amount, purchase_sessions.purchased_at, purchase_sessions.notes, \
     purchase_sessions.created_at, purchase_sessions.updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub store_name: String,
    pub total_amount: Option<Decimal>,
    pub purchased_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A session with the number of lines it holds
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PurchaseSessionListing {
    #[sqlx(flatten)]
    pub session: PurchaseSession,
    pub items_count: i64,
}

/// Writable state of a purchase session
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct PurchaseSessionAttributes {
    #[validate(length(max = 255, message = "is too long (maximum is 255 characters)"))]
    pub store_name: String,

    pub total_amount: Option<Decimal>,

    /// `None` stores the current time
    pub purchased_at: Option<DateTime<Utc>>,

    pub notes: Option<String>,
}

impl PurchaseSessionAttributes {
    pub fn validate_all(&self) -> Result<(), Vec<ValidationErrorDetail>> {
        let mut errors = FieldErrors::new();
        errors.require_present("store_name", &self.store_name);
        errors.merge(self.validate());
        errors.non_negative("total_amount", self.total_amount);
        errors.into_result()
    }
}

/// Purchase session request body (`{"purchase_session": {...}}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseSessionParams {
    #[serde(default)]
    pub store_name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub total_amount: Option<Option<Decimal>>,

    #[serde(default, deserialize_with = "nullable")]
    pub purchased_at: Option<Option<DateTime<Utc>>>,

    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl PurchaseSessionParams {
    pub fn apply_to(self, attributes: &mut PurchaseSessionAttributes) {
        assign(&mut attributes.store_name, self.store_name.map(|name| name.trim().to_string()));
        assign(&mut attributes.total_amount, self.total_amount);
        assign(&mut attributes.purchased_at, self.purchased_at);
        assign(&mut attributes.notes, self.notes.map(presence));
    }

    pub fn into_attributes(self) -> PurchaseSessionAttributes {
        let mut attributes = PurchaseSessionAttributes::default();
        self.apply_to(&mut attributes);
        attributes
    }
}

impl PurchaseSession {
    pub fn attributes(&self) -> PurchaseSessionAttributes {
        PurchaseSessionAttributes {
            store_name: self.store_name.clone(),
            total_amount: self.total_amount,
            purchased_at: Some(self.purchased_at),
            notes: self.notes.clone(),
        }
    }

    /// Creates a session and its lines, all or nothing
    ///
    /// Every line is validated up front and every referenced item must
    /// belong to the user. Returns the session and its stored lines.
    pub async fn create_with_items(
        pool: &PgPool,
        user_id: Uuid,
        attributes: PurchaseSessionAttributes,
        lines: Vec<PurchaseItemInput>,
    ) -> ModelResult<(Self, Vec<PurchaseLine>)> {
        let mut details = attributes.validate_all().err().unwrap_or_default();
        for (index, line) in lines.iter().enumerate() {
            details.extend(line.validate_at(index));
        }
        if !details.is_empty() {
            return Err(ModelError::Validation(details));
        }

        let mut tx = pool.begin().await?;

        for (index, line) in lines.iter().enumerate() {
            let Some(item_id) = line.item_id else {
                continue;
            };
            let owned: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM items WHERE id = $1 AND user_id = $2)",
            )
            .bind(item_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

            if !owned {
                details.push(line_detail(index, ValidationErrorDetail::new("item", "must exist")));
            }
        }
        if !details.is_empty() {
            return Err(ModelError::Validation(details));
        }

        let session = sqlx::query_as::<_, PurchaseSession>(&format!(
            r#"
            INSERT INTO purchase_sessions (user_id, store_name, total_amount, purchased_at, notes)
            VALUES ($1, $2, $3, COALESCE($4, NOW()), $5)
            RETURNING {}
            "#,
            PURCHASE_SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(attributes.store_name)
        .bind(attributes.total_amount)
        .bind(attributes.purchased_at)
        .bind(attributes.notes)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            PurchaseItem::insert(&mut tx, session.id, line).await?;
        }
        let stored = PurchaseItem::lines(&mut tx, session.id).await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            purchase_session_id = %session.id,
            lines = stored.len(),
            "Purchase session created"
        );
        Ok((session, stored))
    }

    /// Replaces the session's own columns; lines are left untouched
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        attributes: PurchaseSessionAttributes,
    ) -> ModelResult<Option<Self>> {
        attributes.validate_all()?;

        let session = sqlx::query_as::<_, PurchaseSession>(&format!(
            r#"
            UPDATE purchase_sessions
            SET store_name = $3, total_amount = $4, purchased_at = COALESCE($5, NOW()),
                notes = $6, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            PURCHASE_SESSION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(attributes.store_name)
        .bind(attributes.total_amount)
        .bind(attributes.purchased_at)
        .bind(attributes.notes)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    pub async fn find_owned(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PurchaseSession>(&format!(
            "SELECT {} FROM purchase_sessions WHERE id = $1 AND user_id = $2",
            PURCHASE_SESSION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// The user's sessions, most recent purchase first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<PurchaseSessionListing>, sqlx::Error> {
        sqlx::query_as::<_, PurchaseSessionListing>(&format!(
            r#"
            SELECT {},
                   (SELECT COUNT(*) FROM purchase_items
                     WHERE purchase_items.purchase_session_id = purchase_sessions.id) AS items_count
            FROM purchase_sessions
            WHERE purchase_sessions.user_id = $1
            ORDER BY purchase_sessions.purchased_at DESC, purchase_sessions.id
            "#,
            PURCHASE_SESSION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn items_count(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM purchase_items WHERE purchase_session_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn lines(pool: &PgPool, id: Uuid) -> Result<Vec<PurchaseLine>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        PurchaseItem::lines(&mut conn, id).await
    }

    pub async fn delete_owned(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM purchase_sessions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!(user_id = %user_id, purchase_session_id = %id, "Purchase session deleted");
        }
        Ok(result.rows_affected() > 0)
    }
}
