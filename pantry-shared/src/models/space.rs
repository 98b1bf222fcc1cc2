//! Space model
//!
//! A space is a room (kitchen, garage, ...). Storages may be placed in a
//! space; deleting the space deletes those storages and, through them,
//! their items.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE spaces (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     name VARCHAR(100) NOT NULL,
//!     space_type VARCHAR(30) NOT NULL,
//!     description VARCHAR(500),
//!     image_url TEXT,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{assign, nullable, presence, ModelResult};
use crate::validation::{FieldErrors, ValidationErrorDetail};

/// Accepted values for `space_type`
pub const SPACE_TYPES: [&str; 13] = [
    "bedroom",
    "kitchen",
    "bathroom",
    "living_room",
    "dining_room",
    "garage",
    "basement",
    "attic",
    "office",
    "closet",
    "outdoor",
    "storage_unit",
    "other",
];

const SPACE_COLUMNS: &str =
    "spaces.id, spaces.user_id, spaces.name, spaces.space_type, spaces.description, \
     spaces.image_url, spaces.created_at, spaces.updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Space {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub space_type: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A space with the number of storages placed in it
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpaceListing {
    #[sqlx(flatten)]
    pub space: Space,
    pub storages_count: i64,
}

/// Storage entry shown on a space's detail page
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StorageSummary {
    pub id: Uuid,
    pub name: String,
    pub items_count: i64,
}

/// Writable state of a space
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct SpaceAttributes {
    #[validate(length(max = 100, message = "is too long (maximum is 100 characters)"))]
    pub name: String,

    pub space_type: String,

    #[validate(length(max = 500, message = "is too long (maximum is 500 characters)"))]
    pub description: Option<String>,

    pub image_url: Option<String>,
}

impl SpaceAttributes {
    pub fn validate_all(&self) -> Result<(), Vec<ValidationErrorDetail>> {
        let mut errors = FieldErrors::new();
        errors.require_present("name", &self.name);
        errors.merge(self.validate());

        if self.space_type.trim().is_empty() {
            errors.add("space_type", "can't be blank");
        } else {
            errors.inclusion("space_type", Some(&self.space_type), &SPACE_TYPES);
        }

        errors.into_result()
    }
}

/// Space request body (`{"space": {...}}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpaceParams {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub space_type: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
}

impl SpaceParams {
    pub fn apply_to(self, attributes: &mut SpaceAttributes) {
        assign(&mut attributes.name, self.name.map(|name| name.trim().to_string()));
        assign(&mut attributes.space_type, self.space_type.map(|t| t.trim().to_string()));
        assign(&mut attributes.description, self.description.map(presence));
        assign(&mut attributes.image_url, self.image_url.map(presence));
    }

    pub fn into_attributes(self) -> SpaceAttributes {
        let mut attributes = SpaceAttributes::default();
        self.apply_to(&mut attributes);
        attributes
    }
}

impl Space {
    pub fn attributes(&self) -> SpaceAttributes {
        SpaceAttributes {
            name: self.name.clone(),
            space_type: self.space_type.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
        }
    }

    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        attributes: SpaceAttributes,
    ) -> ModelResult<Self> {
        attributes.validate_all()?;

        let space = sqlx::query_as::<_, Space>(&format!(
            r#"
            INSERT INTO spaces (user_id, name, space_type, description, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SPACE_COLUMNS
        ))
        .bind(user_id)
        .bind(attributes.name)
        .bind(attributes.space_type)
        .bind(attributes.description)
        .bind(attributes.image_url)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = %user_id, space_id = %space.id, "Space created");
        Ok(space)
    }

    /// Replaces the writable columns of an owned space
    ///
    /// Returns `None` if the space does not exist or belongs to someone else.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        attributes: SpaceAttributes,
    ) -> ModelResult<Option<Self>> {
        attributes.validate_all()?;

        let space = sqlx::query_as::<_, Space>(&format!(
            r#"
            UPDATE spaces
            SET name = $3, space_type = $4, description = $5, image_url = $6, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            SPACE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(attributes.name)
        .bind(attributes.space_type)
        .bind(attributes.description)
        .bind(attributes.image_url)
        .fetch_optional(pool)
        .await?;

        Ok(space)
    }

    pub async fn find_owned(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Space>(&format!(
            "SELECT {} FROM spaces WHERE id = $1 AND user_id = $2",
            SPACE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// All spaces of a user, oldest first, with storage counts
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<SpaceListing>, sqlx::Error> {
        sqlx::query_as::<_, SpaceListing>(&format!(
            r#"
            SELECT {},
                   (SELECT COUNT(*) FROM storages WHERE storages.space_id = spaces.id) AS storages_count
            FROM spaces
            WHERE spaces.user_id = $1
            ORDER BY spaces.created_at, spaces.id
            "#,
            SPACE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Storage count for a single space
    pub async fn storages_count(pool: &PgPool, space_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM storages WHERE space_id = $1")
            .bind(space_id)
            .fetch_one(pool)
            .await
    }

    /// Storages placed directly in the space, with their item counts
    pub async fn storages(
        pool: &PgPool,
        user_id: Uuid,
        space_id: Uuid,
    ) -> Result<Vec<StorageSummary>, sqlx::Error> {
        sqlx::query_as::<_, StorageSummary>(
            r#"
            SELECT storages.id, storages.name,
                   (SELECT COUNT(*) FROM items WHERE items.storage_id = storages.id) AS items_count
            FROM storages
            WHERE storages.space_id = $1 AND storages.user_id = $2
            ORDER BY storages.name, storages.id
            "#,
        )
        .bind(space_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Deletes an owned space and everything placed in it
    pub async fn delete_owned(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM spaces WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!(user_id = %user_id, space_id = %id, "Space deleted");
        }
        Ok(result.rows_affected() > 0)
    }

    /// Clears the image; `None` when there was none to clear
    pub async fn clear_image(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Space>(&format!(
            r#"
            UPDATE spaces
            SET image_url = NULL, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND image_url IS NOT NULL
            RETURNING {}
            "#,
            SPACE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
