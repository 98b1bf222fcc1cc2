//! Database models
//!
//! Each model is a plain struct deriving `sqlx::FromRow` with inherent async
//! functions for its queries. Every query on user-owned data takes the owning
//! `user_id` explicitly and filters on it, so a row belonging to someone else
//! is indistinguishable from a missing one.
//!
//! Writes go through an `*Attributes` struct holding the full writable state
//! of a row. Creating starts from the defaults, updating starts from the
//! stored row; request parameters (`*Params`) are applied on top and the
//! result is validated as a whole before it reaches the database.
//!
//! # Models
//!
//! - `user`: accounts, profile fields and sign-in tracking
//! - `subscription`: one plan per user
//! - `space`: rooms
//! - `storage`: nested containers inside spaces
//! - `item`: stocked goods inside storages
//! - `purchase_session` / `purchase_item`: shopping trips and their lines
//! - `revoked_token`: JWT denylist
//!
//! # Example
//!
//! ```no_run
//! use pantry_shared::models::space::{Space, SpaceAttributes};
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let attributes = SpaceAttributes {
//!     name: "Kitchen".to_string(),
//!     space_type: "kitchen".to_string(),
//!     ..Default::default()
//! };
//! let space = Space::create(&pool, user_id, attributes).await?;
//!
//! assert!(Space::find_owned(&pool, user_id, space.id).await?.is_some());
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Deserializer};

use crate::validation::{ValidationErrorDetail, BASE};

pub mod item;
pub mod purchase_item;
pub mod purchase_session;
pub mod revoked_token;
pub mod space;
pub mod storage;
pub mod subscription;
pub mod user;

/// Unique constraint on `users.email`
const USERS_EMAIL_UNIQUE: &str = "users_email_key";

/// Unique constraint on `(purchase_session_id, item_id)`
const PURCHASE_ITEMS_UNIQUE: &str = "purchase_items_session_item_unique";

/// SQLSTATE `numeric_value_out_of_range`
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Error returned by model writes
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The attributes were rejected; each detail is a full message
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<ValidationErrorDetail>),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    /// Single-field validation failure
    pub fn invalid(field: &str, message: &str) -> Self {
        ModelError::Validation(vec![ValidationErrorDetail::new(field, message)])
    }
}

impl From<Vec<ValidationErrorDetail>> for ModelError {
    fn from(details: Vec<ValidationErrorDetail>) -> Self {
        ModelError::Validation(details)
    }
}

/// Constraint violations that a client can fix become validation errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                match db_err.constraint() {
                    Some(USERS_EMAIL_UNIQUE) => {
                        return ModelError::invalid("email", "has already been taken")
                    }
                    Some(PURCHASE_ITEMS_UNIQUE) => {
                        return ModelError::invalid("item", "has already been taken")
                    }
                    _ => {}
                }
            }
            if db_err.is_foreign_key_violation() {
                return ModelError::invalid(BASE, "Referenced record does not exist");
            }
            if db_err.is_check_violation() {
                return check_violation(db_err.constraint());
            }
            if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
                return ModelError::invalid(BASE, "A numeric value is out of range");
            }
        }
        ModelError::Database(err)
    }
}

/// Maps a failed `CHECK` constraint to the message of the matching model rule
fn check_violation(constraint: Option<&str>) -> ModelError {
    const NON_NEGATIVE: &str = "must be greater than or equal to 0";

    let (field, message) = match constraint {
        Some("users_gender_check") => ("gender", "is not included in the list"),
        Some("subscriptions_plan_check") => ("plan", "is not included in the list"),
        Some("spaces_space_type_check") => ("space_type", "is not included in the list"),
        Some("storages_not_own_parent") => (
            "parent",
            "cannot be the storage itself or one of its descendants",
        ),
        Some("purchase_items_quantity_check") => ("quantity", "must be greater than 0"),
        Some("subscriptions_pantry_limit_check") => ("pantry_limit", NON_NEGATIVE),
        Some("items_quantity_check") => ("quantity", NON_NEGATIVE),
        Some("items_min_quantity_check") => ("min_quantity", NON_NEGATIVE),
        Some("items_out_of_stock_threshold_check") => ("out_of_stock_threshold", NON_NEGATIVE),
        Some("purchase_sessions_total_amount_check") => ("total_amount", NON_NEGATIVE),
        Some("purchase_items_unit_price_check") => ("unit_price", NON_NEGATIVE),
        Some("purchase_items_total_price_check") => ("total_price", NON_NEGATIVE),
        _ => (BASE, "Record is invalid"),
    };
    ModelError::invalid(field, message)
}

/// Deserializes a field that distinguishes "absent" from "null"
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: a missing key stays `None`, `null` becomes
/// `Some(None)`, and a value becomes `Some(Some(value))`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Replaces `target` when the parameter was sent
pub(crate) fn assign<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Trims a string and turns blanks into `None`
pub(crate) fn presence(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
