//! Item model
//!
//! An item is something kept in a storage, with an optional quantity and two
//! independent alert thresholds. Stock flags are never stored; see
//! [`crate::inventory::stock`].
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE items (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     storage_id UUID NOT NULL REFERENCES storages(id) ON DELETE CASCADE,
//!     name VARCHAR(100) NOT NULL,
//!     quantity NUMERIC(10, 2),
//!     unit VARCHAR(50) NOT NULL,
//!     min_quantity NUMERIC(10, 2),
//!     out_of_stock_threshold NUMERIC(10, 2),
//!     low_stock_alert_enabled BOOLEAN NOT NULL DEFAULT TRUE,
//!     out_of_stock_alert_enabled BOOLEAN NOT NULL DEFAULT TRUE,
//!     expiration_date DATE,
//!     notes TEXT,
//!     image_url TEXT,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::storage::Storage;
use super::{assign, nullable, presence, ModelError, ModelResult};
use crate::inventory::StockLevels;
use crate::validation::{FieldErrors, ValidationErrorDetail};

const ITEM_COLUMNS: &str = "items.id, items.user_id, items.storage_id, items.name, items.quantity, \
     items.unit, items.min_quantity, items.out_of_stock_threshold, \
     items.low_stock_alert_enabled, items.out_of_stock_alert_enabled, items.expiration_date, \
     items.notes, items.image_url, items.created_at, items.updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,
    pub user_id: Uuid,
    pub storage_id: Uuid,
    pub name: String,
    pub quantity: Option<Decimal>,
    pub unit: String,
    pub min_quantity: Option<Decimal>,
    pub out_of_stock_threshold: Option<Decimal>,
    pub low_stock_alert_enabled: bool,
    pub out_of_stock_alert_enabled: bool,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An item together with the name of its storage
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemListing {
    #[sqlx(flatten)]
    pub item: Item,
    pub storage_name: String,
}

/// Writable state of an item
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct ItemAttributes {
    #[validate(length(max = 100, message = "is too long (maximum is 100 characters)"))]
    pub name: String,

    pub quantity: Option<Decimal>,

    #[validate(length(max = 50, message = "is too long (maximum is 50 characters)"))]
    pub unit: String,

    pub min_quantity: Option<Decimal>,
    pub out_of_stock_threshold: Option<Decimal>,
    pub low_stock_alert_enabled: bool,
    pub out_of_stock_alert_enabled: bool,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub storage_id: Option<Uuid>,
}

impl Default for ItemAttributes {
    fn default() -> Self {
        Self {
            name: String::new(),
            quantity: None,
            unit: String::new(),
            min_quantity: None,
            out_of_stock_threshold: None,
            low_stock_alert_enabled: true,
            out_of_stock_alert_enabled: true,
            expiration_date: None,
            notes: None,
            image_url: None,
            storage_id: None,
        }
    }
}

impl ItemAttributes {
    pub fn validate_all(&self) -> Result<(), Vec<ValidationErrorDetail>> {
        let mut errors = FieldErrors::new();
        errors.require_some("storage", &self.storage_id, "must exist");
        errors.require_present("name", &self.name);
        errors.require_present("unit", &self.unit);
        errors.merge(self.validate());
        errors.non_negative("quantity", self.quantity);
        errors.non_negative("min_quantity", self.min_quantity);
        errors.non_negative("out_of_stock_threshold", self.out_of_stock_threshold);
        errors.into_result()
    }
}

/// Item request body (`{"item": {...}}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemParams {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub quantity: Option<Option<Decimal>>,

    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub min_quantity: Option<Option<Decimal>>,

    #[serde(default, deserialize_with = "nullable")]
    pub out_of_stock_threshold: Option<Option<Decimal>>,

    #[serde(default)]
    pub low_stock_alert_enabled: Option<bool>,

    #[serde(default)]
    pub out_of_stock_alert_enabled: Option<bool>,

    #[serde(default, deserialize_with = "nullable")]
    pub expiration_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub storage_id: Option<Option<Uuid>>,
}

impl ItemParams {
    pub fn apply_to(self, attributes: &mut ItemAttributes) {
        assign(&mut attributes.name, self.name.map(|name| name.trim().to_string()));
        assign(&mut attributes.quantity, self.quantity);
        assign(&mut attributes.unit, self.unit.map(|unit| unit.trim().to_string()));
        assign(&mut attributes.min_quantity, self.min_quantity);
        assign(&mut attributes.out_of_stock_threshold, self.out_of_stock_threshold);
        assign(&mut attributes.low_stock_alert_enabled, self.low_stock_alert_enabled);
        assign(&mut attributes.out_of_stock_alert_enabled, self.out_of_stock_alert_enabled);
        assign(&mut attributes.expiration_date, self.expiration_date);
        assign(&mut attributes.notes, self.notes.map(presence));
        assign(&mut attributes.image_url, self.image_url.map(presence));
        assign(&mut attributes.storage_id, self.storage_id);
    }

    pub fn into_attributes(self) -> ItemAttributes {
        let mut attributes = ItemAttributes::default();
        self.apply_to(&mut attributes);
        attributes
    }
}

impl Item {
    pub fn attributes(&self) -> ItemAttributes {
        ItemAttributes {
            name: self.name.clone(),
            quantity: self.quantity,
            unit: self.unit.clone(),
            min_quantity: self.min_quantity,
            out_of_stock_threshold: self.out_of_stock_threshold,
            low_stock_alert_enabled: self.low_stock_alert_enabled,
            out_of_stock_alert_enabled: self.out_of_stock_alert_enabled,
            expiration_date: self.expiration_date,
            notes: self.notes.clone(),
            image_url: self.image_url.clone(),
            storage_id: Some(self.storage_id),
        }
    }

    pub fn stock_levels(&self) -> StockLevels {
        StockLevels {
            quantity: self.quantity,
            min_quantity: self.min_quantity,
            out_of_stock_threshold: self.out_of_stock_threshold,
            low_stock_alert_enabled: self.low_stock_alert_enabled,
            out_of_stock_alert_enabled: self.out_of_stock_alert_enabled,
        }
    }

    /// Validates and returns the storage id, which must belong to the user
    async fn owned_storage(
        pool: &PgPool,
        user_id: Uuid,
        attributes: &ItemAttributes,
    ) -> ModelResult<Uuid> {
        attributes.validate_all()?;

        match attributes.storage_id {
            Some(storage_id) if Storage::exists_owned(pool, user_id, storage_id).await? => {
                Ok(storage_id)
            }
            _ => Err(ModelError::invalid("storage", "must exist")),
        }
    }

    pub async fn create(pool: &PgPool, user_id: Uuid, attributes: ItemAttributes) -> ModelResult<Self> {
        let storage_id = Self::owned_storage(pool, user_id, &attributes).await?;

        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (
                user_id, storage_id, name, quantity, unit, min_quantity, out_of_stock_threshold,
                low_stock_alert_enabled, out_of_stock_alert_enabled, expiration_date, notes,
                image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(user_id)
        .bind(storage_id)
        .bind(attributes.name)
        .bind(attributes.quantity)
        .bind(attributes.unit)
        .bind(attributes.min_quantity)
        .bind(attributes.out_of_stock_threshold)
        .bind(attributes.low_stock_alert_enabled)
        .bind(attributes.out_of_stock_alert_enabled)
        .bind(attributes.expiration_date)
        .bind(attributes.notes)
        .bind(attributes.image_url)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = %user_id, item_id = %item.id, "Item created");
        Ok(item)
    }

    /// Replaces the writable columns of an owned item
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        attributes: ItemAttributes,
    ) -> ModelResult<Option<Self>> {
        let storage_id = Self::owned_storage(pool, user_id, &attributes).await?;

        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET storage_id = $3, name = $4, quantity = $5, unit = $6, min_quantity = $7,
                out_of_stock_threshold = $8, low_stock_alert_enabled = $9,
                out_of_stock_alert_enabled = $10, expiration_date = $11, notes = $12,
                image_url = $13, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(storage_id)
        .bind(attributes.name)
        .bind(attributes.quantity)
        .bind(attributes.unit)
        .bind(attributes.min_quantity)
        .bind(attributes.out_of_stock_threshold)
        .bind(attributes.low_stock_alert_enabled)
        .bind(attributes.out_of_stock_alert_enabled)
        .bind(attributes.expiration_date)
        .bind(attributes.notes)
        .bind(attributes.image_url)
        .fetch_optional(pool)
        .await?;

        Ok(item)
    }

    pub async fn find_owned(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE id = $1 AND user_id = $2",
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// The user's items, optionally restricted to one storage
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        storage_id: Option<Uuid>,
    ) -> Result<Vec<ItemListing>, sqlx::Error> {
        sqlx::query_as::<_, ItemListing>(&format!(
            r#"
            SELECT {}, storages.name AS storage_name
            FROM items
            JOIN storages ON storages.id = items.storage_id
            WHERE items.user_id = $1 AND ($2::uuid IS NULL OR items.storage_id = $2)
            ORDER BY items.name, items.id
            "#,
            ITEM_COLUMNS
        ))
        .bind(user_id)
        .bind(storage_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_listing(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ItemListing>, sqlx::Error> {
        sqlx::query_as::<_, ItemListing>(&format!(
            r#"
            SELECT {}, storages.name AS storage_name
            FROM items
            JOIN storages ON storages.id = items.storage_id
            WHERE items.id = $1 AND items.user_id = $2
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Items currently at or below their minimum quantity
    pub async fn low_stock(pool: &PgPool, user_id: Uuid) -> Result<Vec<ItemListing>, sqlx::Error> {
        let items = Self::list_by_user(pool, user_id, None).await?;
        Ok(items
            .into_iter()
            .filter(|listing| listing.item.stock_levels().is_low_stock())
            .collect())
    }

    /// Items currently at or below their out-of-stock threshold
    pub async fn out_of_stock(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ItemListing>, sqlx::Error> {
        let items = Self::list_by_user(pool, user_id, None).await?;
        Ok(items
            .into_iter()
            .filter(|listing| listing.item.stock_levels().is_out_of_stock())
            .collect())
    }

    pub async fn delete_owned(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!(user_id = %user_id, item_id = %id, "Item deleted");
        }
        Ok(result.rows_affected() > 0)
    }

    /// Clears the image; `None` when there was none to clear
    pub async fn clear_image(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET image_url = NULL, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND image_url IS NOT NULL
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn valid() -> ItemAttributes {
        ItemAttributes {
            name: "Olive Oil".to_string(),
            unit: "bottle".to_string(),
            storage_id: Some(Uuid::new_v4()),
            ..Default::default()
        }
    }

    #[test]
    fn test_alerts_enabled_by_default() {
        let attributes = ItemAttributes::default();
        assert!(attributes.low_stock_alert_enabled);
        assert!(attributes.out_of_stock_alert_enabled);
    }

    #[test]
    fn test_valid_item() {
        assert!(valid().validate_all().is_ok());
    }

    #[test]
    fn test_missing_fields() {
        let messages: Vec<String> = ItemAttributes::default()
            .validate_all()
            .unwrap_err()
            .into_iter()
            .map(|detail| detail.message)
            .collect();

        assert_eq!(
            messages,
            vec!["Storage must exist", "Name can't be blank", "Unit can't be blank"]
        );
    }

    #[test]
    fn test_negative_quantities_rejected() {
        let attributes = ItemAttributes {
            quantity: Some(dec("-1")),
            min_quantity: Some(dec("-0.5")),
            out_of_stock_threshold: Some(dec("0")),
            ..valid()
        };

        let messages: Vec<String> = attributes
            .validate_all()
            .unwrap_err()
            .into_iter()
            .map(|detail| detail.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Quantity must be greater than or equal to 0",
                "Min quantity must be greater than or equal to 0",
            ]
        );
    }

    #[test]
    fn test_params_accept_numbers_and_strings() {
        let params: ItemParams = serde_json::from_value(serde_json::json!({
            "name": "Rice",
            "unit": "kg",
            "quantity": "2.5",
            "min_quantity": 1,
            "expiration_date": "2026-12-31",
            "low_stock_alert_enabled": false
        }))
        .unwrap();

        let attributes = params.into_attributes();
        assert_eq!(attributes.quantity, Some(dec("2.5")));
        assert_eq!(attributes.min_quantity, Some(dec("1")));
        assert_eq!(
            attributes.expiration_date,
            NaiveDate::from_ymd_opt(2026, 12, 31)
        );
        assert!(!attributes.low_stock_alert_enabled);
        assert!(attributes.out_of_stock_alert_enabled);
    }

    #[test]
    fn test_params_clear_quantity() {
        let mut attributes = ItemAttributes {
            quantity: Some(dec("3")),
            ..valid()
        };

        let params: ItemParams =
            serde_json::from_value(serde_json::json!({ "quantity": null })).unwrap();
        params.apply_to(&mut attributes);

        assert_eq!(attributes.quantity, None);
        assert_eq!(attributes.name, "Olive Oil");
    }

    #[test]
    fn test_stock_levels_from_row() {
        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            storage_id: Uuid::new_v4(),
            name: "Salt".to_string(),
            quantity: Some(dec("1")),
            unit: "jar".to_string(),
            min_quantity: Some(dec("2")),
            out_of_stock_threshold: Some(dec("0")),
            low_stock_alert_enabled: true,
            out_of_stock_alert_enabled: true,
            expiration_date: None,
            notes: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        };

        let status = item.stock_levels().status();
        assert!(status.low_stock);
        assert!(!status.out_of_stock);
        assert_eq!(item.attributes().storage_id, Some(item.storage_id));
    }
}
