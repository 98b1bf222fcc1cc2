//! Storage model
//!
//! Storages are containers (shelves, boxes, fridges) forming a tree through
//! `parent_id`. A storage may sit in a space; items sit in storages.
//! Deleting a storage deletes its whole subtree and every item in it.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE storages (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     parent_id UUID REFERENCES storages(id) ON DELETE CASCADE,
//!     space_id UUID REFERENCES spaces(id) ON DELETE CASCADE,
//!     name VARCHAR(100) NOT NULL,
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

use super::{assign, nullable, presence, ModelError, ModelResult};
use crate::inventory::{SpaceRef, StorageNode, StorageTree};
use crate::validation::{FieldErrors, ValidationErrorDetail};

const STORAGE_COLUMNS: &str =
    "storages.id, storages.user_id, storages.parent_id, storages.space_id, storages.name, \
     storages.description, storages.image_url, storages.created_at, storages.updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Storage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub space_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A storage with its space name and direct child/item counts
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageListing {
    #[sqlx(flatten)]
    pub storage: Storage,
    pub space_name: Option<String>,
    pub children_count: i64,
    pub items_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct TreeRow {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
    space_id: Option<Uuid>,
    space_name: Option<String>,
}

impl From<TreeRow> for StorageNode {
    fn from(row: TreeRow) -> Self {
        let space = match (row.space_id, row.space_name) {
            (Some(id), Some(name)) => Some(SpaceRef { id, name }),
            _ => None,
        };

        StorageNode {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
            space,
        }
    }
}

/// Writable state of a storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct StorageAttributes {
    #[validate(length(max = 100, message = "is too long (maximum is 100 characters)"))]
    pub name: String,

    #[validate(length(max = 500, message = "is too long (maximum is 500 characters)"))]
    pub description: Option<String>,

    pub parent_id: Option<Uuid>,
    pub space_id: Option<Uuid>,
    pub image_url: Option<String>,
}

impl StorageAttributes {
    /// Checks the rules that need no database access
    pub fn validate_all(&self) -> Result<(), Vec<ValidationErrorDetail>> {
        let mut errors = FieldErrors::new();
        errors.require_present("name", &self.name);
        errors.merge(self.validate());
        errors.into_result()
    }
}

/// Storage request body (`{"storage": {...}}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageParams {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "nullable")]
    pub space_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
}

impl StorageParams {
    pub fn apply_to(self, attributes: &mut StorageAttributes) {
        assign(&mut attributes.name, self.name.map(|name| name.trim().to_string()));
        assign(&mut attributes.description, self.description.map(presence));
        assign(&mut attributes.parent_id, self.parent_id);
        assign(&mut attributes.space_id, self.space_id);
        assign(&mut attributes.image_url, self.image_url.map(presence));
    }

    pub fn into_attributes(self) -> StorageAttributes {
        let mut attributes = StorageAttributes::default();
        self.apply_to(&mut attributes);
        attributes
    }
}

impl Storage {
    pub fn attributes(&self) -> StorageAttributes {
        StorageAttributes {
            name: self.name.clone(),
            description: self.description.clone(),
            parent_id: self.parent_id,
            space_id: self.space_id,
            image_url: self.image_url.clone(),
        }
    }

    /// Verifies that the parent and space belong to the user
    ///
    /// For an existing storage (`id` set) the parent must also lie outside
    /// its subtree.
    async fn check_references(
        pool: &PgPool,
        user_id: Uuid,
        id: Option<Uuid>,
        attributes: &StorageAttributes,
    ) -> ModelResult<()> {
        let mut errors = FieldErrors::new();

        if let Some(parent_id) = attributes.parent_id {
            if !Self::exists_owned(pool, user_id, parent_id).await? {
                errors.add("parent", "must exist");
            } else if let Some(id) = id {
                let tree = Self::tree(pool, user_id).await?;
                if tree.is_descendant(parent_id, id) {
                    errors.add("parent", "cannot be the storage itself or one of its descendants");
                }
            }
        }

        if let Some(space_id) = attributes.space_id {
            let owned: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM spaces WHERE id = $1 AND user_id = $2)",
            )
            .bind(space_id)
            .bind(user_id)
            .fetch_one(pool)
            .await?;

            if !owned {
                errors.add("space", "must exist");
            }
        }

        errors.into_result().map_err(ModelError::from)
    }

    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        attributes: StorageAttributes,
    ) -> ModelResult<Self> {
        attributes.validate_all()?;
        Self::check_references(pool, user_id, None, &attributes).await?;

        let storage = sqlx::query_as::<_, Storage>(&format!(
            r#"
            INSERT INTO storages (user_id, parent_id, space_id, name, description, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            STORAGE_COLUMNS
        ))
        .bind(user_id)
        .bind(attributes.parent_id)
        .bind(attributes.space_id)
        .bind(attributes.name)
        .bind(attributes.description)
        .bind(attributes.image_url)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = %user_id, storage_id = %storage.id, "Storage created");
        Ok(storage)
    }

    /// Replaces the writable columns of an owned storage
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        attributes: StorageAttributes,
    ) -> ModelResult<Option<Self>> {
        attributes.validate_all()?;
        Self::check_references(pool, user_id, Some(id), &attributes).await?;

        let storage = sqlx::query_as::<_, Storage>(&format!(
            r#"
            UPDATE storages
            SET parent_id = $3, space_id = $4, name = $5, description = $6, image_url = $7,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            STORAGE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(attributes.parent_id)
        .bind(attributes.space_id)
        .bind(attributes.name)
        .bind(attributes.description)
        .bind(attributes.image_url)
        .fetch_optional(pool)
        .await?;

        Ok(storage)
    }

    pub async fn exists_owned(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM storages WHERE id = $1 AND user_id = $2)")
            .bind(id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_owned(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Storage>(&format!(
            "SELECT {} FROM storages WHERE id = $1 AND user_id = $2",
            STORAGE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    fn listing_query(filter: &str) -> String {
        format!(
            r#"
            SELECT {},
                   spaces.name AS space_name,
                   (SELECT COUNT(*) FROM storages children
                     WHERE children.parent_id = storages.id) AS children_count,
                   (SELECT COUNT(*) FROM items WHERE items.storage_id = storages.id) AS items_count
            FROM storages
            LEFT JOIN spaces ON spaces.id = storages.space_id
            WHERE storages.user_id = $1 {}
            ORDER BY storages.name, storages.id
            "#,
            STORAGE_COLUMNS, filter
        )
    }

    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<StorageListing>, sqlx::Error> {
        sqlx::query_as::<_, StorageListing>(&Self::listing_query(""))
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_listing(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<StorageListing>, sqlx::Error> {
        sqlx::query_as::<_, StorageListing>(&Self::listing_query("AND storages.id = $2"))
            .bind(user_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads every storage of the user into an arena for location lookups
    pub async fn tree(pool: &PgPool, user_id: Uuid) -> Result<StorageTree, sqlx::Error> {
        let rows = sqlx::query_as::<_, TreeRow>(
            r#"
            SELECT storages.id, storages.name, storages.parent_id, storages.space_id,
                   spaces.name AS space_name
            FROM storages
            LEFT JOIN spaces ON spaces.id = storages.space_id
            WHERE storages.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(StorageTree::new(rows.into_iter().map(StorageNode::from)))
    }

    /// Deletes an owned storage with its subtree and items
    pub async fn delete_owned(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM storages WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!(user_id = %user_id, storage_id = %id, "Storage deleted");
        }
        Ok(result.rows_affected() > 0)
    }

    /// Clears the image; `None` when there was none to clear
    pub async fn clear_image(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Storage>(&format!(
            r#"
            UPDATE storages
            SET image_url = NULL, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND image_url IS NOT NULL
            RETURNING {}
            "#,
            STORAGE_COLUMNS
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

    #[test]
    fn test_blank_name_rejected() {
        let errors = StorageAttributes::default().validate_all().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Name can't be blank");
    }

    #[test]
    fn test_long_description_rejected() {
        let attributes = StorageAttributes {
            name: "Shelf".to_string(),
            description: Some("d".repeat(501)),
            ..Default::default()
        };

        let errors = attributes.validate_all().unwrap_err();
        assert_eq!(
            errors[0].message,
            "Description is too long (maximum is 500 characters)"
        );
    }

    #[test]
    fn test_params_detach_from_parent() {
        let parent = Uuid::new_v4();
        let space = Uuid::new_v4();
        let mut attributes = StorageAttributes {
            name: "Box".to_string(),
            parent_id: Some(parent),
            space_id: Some(space),
            ..Default::default()
        };

        let params: StorageParams =
            serde_json::from_value(serde_json::json!({ "parent_id": null })).unwrap();
        params.apply_to(&mut attributes);

        assert_eq!(attributes.parent_id, None);
        assert_eq!(attributes.space_id, Some(space));
        assert_eq!(attributes.name, "Box");
    }

    #[test]
    fn test_tree_row_without_space() {
        let node = StorageNode::from(TreeRow {
            id: Uuid::new_v4(),
            name: "Drawer".to_string(),
            parent_id: None,
            space_id: None,
            space_name: None,
        });
        assert!(node.space.is_none());

        let space_id = Uuid::new_v4();
        let node = StorageNode::from(TreeRow {
            id: Uuid::new_v4(),
            name: "Pantry".to_string(),
            parent_id: None,
            space_id: Some(space_id),
            space_name: Some("Kitchen".to_string()),
        });
        assert_eq!(
            node.space,
            Some(SpaceRef {
                id: space_id,
                name: "Kitchen".to_string()
            })
        );
    }
}
