//! Purchase lines
//!
//! One line per item and session. `total_price` is derived from quantity and
//! unit price on every write; a client-supplied total is ignored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{ModelError, ModelResult};
use crate::inventory::pricing;
use crate::validation::{FieldErrors, ValidationErrorDetail};

const PURCHASE_ITEM_COLUMNS: &str =
    "id, purchase_session_id, item_id, quantity, unit_price, total_price, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseItem {
    pub id: Uuid,
    pub purchase_session_id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchase line joined with its item's name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PurchaseLine {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// One entry of the `purchase_items` array sent with a new session
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseItemInput {
    #[serde(default)]
    pub item_id: Option<Uuid>,

    #[serde(default)]
    pub quantity: Option<Decimal>,

    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

impl PurchaseItemInput {
    pub fn validate_all(&self) -> Result<(), Vec<ValidationErrorDetail>> {
        let mut errors = FieldErrors::new();
        errors.require_some("item", &self.item_id, "must exist");
        errors.require_some("quantity", &self.quantity, "is not a number");
        errors.positive("quantity", self.quantity);
        errors.require_some("unit_price", &self.unit_price, "is not a number");
        errors.non_negative("unit_price", self.unit_price);
        errors.into_result()
    }

    /// Validates the line at `index` of a request, labelling each message
    /// with its 1-based position
    pub fn validate_at(&self, index: usize) -> Vec<ValidationErrorDetail> {
        match self.validate_all() {
            Ok(()) => Vec::new(),
            Err(details) => details
                .into_iter()
                .map(|detail| line_detail(index, detail))
                .collect(),
        }
    }
}

pub(crate) fn line_detail(index: usize, detail: ValidationErrorDetail) -> ValidationErrorDetail {
    ValidationErrorDetail {
        field: format!("purchase_items[{}].{}", index, detail.field),
        message: format!("Purchase item {}: {}", index + 1, detail.message),
    }
}

impl PurchaseItem {
    /// Inserts a validated line into a session
    ///
    /// Quantity and unit price are rounded to the column scale first, so
    /// the stored total is exactly their product.
    pub async fn insert(
        conn: &mut PgConnection,
        purchase_session_id: Uuid,
        input: &PurchaseItemInput,
    ) -> ModelResult<Self> {
        let (Some(item_id), Some(quantity), Some(unit_price)) =
            (input.item_id, input.quantity, input.unit_price)
        else {
            return Err(input.validate_all().err().unwrap_or_default().into());
        };

        let quantity = pricing::normalize(quantity);
        let unit_price = pricing::normalize(unit_price);
        let total_price = pricing::line_total(quantity, unit_price)
            .filter(|total| *total < Decimal::from(pricing::TOTAL_LIMIT))
            .ok_or_else(|| ModelError::invalid("total_price", "is out of range"))?;

        let purchase_item = sqlx::query_as::<_, PurchaseItem>(&format!(
            r#"
            INSERT INTO purchase_items (purchase_session_id, item_id, quantity, unit_price, total_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PURCHASE_ITEM_COLUMNS
        ))
        .bind(purchase_session_id)
        .bind(item_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(total_price)
        .fetch_one(&mut *conn)
        .await?;

        Ok(purchase_item)
    }

    /// Lines of a session with item names, in insertion order
    pub async fn lines(
        conn: &mut PgConnection,
        purchase_session_id: Uuid,
    ) -> Result<Vec<PurchaseLine>, sqlx::Error> {
        sqlx::query_as::<_, PurchaseLine>(
            r#"
            SELECT purchase_items.id, purchase_items.item_id, items.name AS item_name,
                   purchase_items.quantity, purchase_items.unit_price, purchase_items.total_price
            FROM purchase_items
            JOIN items ON items.id = purchase_items.item_id
            WHERE purchase_items.purchase_session_id = $1
            ORDER BY purchase_items.created_at, purchase_items.id
            "#,
        )
        .bind(purchase_session_id)
        .fetch_all(&mut *conn)
        .await
    }
}
