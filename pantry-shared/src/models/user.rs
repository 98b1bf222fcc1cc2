//! User model and database operations
//!
//! A user owns every space, storage, item, purchase session and the
//! subscription; deleting the user cascades to all of them.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     email CITEXT NOT NULL UNIQUE,
//!     password_hash VARCHAR(255) NOT NULL,
//!     first_name VARCHAR(50),
//!     middle_name VARCHAR(50),
//!     last_name VARCHAR(50),
//!     gender VARCHAR(20),
//!     profile_image_url TEXT,
//!     sign_in_count INTEGER NOT NULL DEFAULT 0,
//!     current_sign_in_at TIMESTAMPTZ,
//!     last_sign_in_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pantry_shared::models::user::{CreateUser, User};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let (user, subscription) = User::register(
//!     &pool,
//!     CreateUser {
//!         email: "user@example.com".to_string(),
//!         password_hash: "$argon2id$...".to_string(),
//!     },
//! )
//! .await?;
//! assert_eq!(subscription.user_id, user.id);
//!
//! let found = User::find_by_email(&pool, "USER@example.com").await?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

use super::subscription::{Subscription, SubscriptionPlan};
use super::{assign, nullable, presence, ModelResult};
use crate::auth::password::validate_password_length;
use crate::validation::{FieldErrors, ValidationErrorDetail};

/// Accepted values for `gender`
pub const GENDERS: [&str; 4] = ["male", "female", "other", "prefer_not_to_say"];

const USER_COLUMNS: &str = "id, email, password_hash, first_name, middle_name, last_name, gender, \
     profile_image_url, sign_in_count, current_sign_in_at, last_sign_in_at, created_at, updated_at";

/// User account
///
/// Passwords are stored as Argon2id hashes and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Email address, unique and case-insensitive (CITEXT)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub profile_image_url: Option<String>,

    /// Number of successful logins
    pub sign_in_count: i32,
    pub current_sign_in_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
}

/// Sign-up request body (`{"user": {...}}`)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Registration {
    #[serde(default)]
    #[validate(email(message = "is invalid"))]
    pub email: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub password_confirmation: Option<String>,
}

impl Registration {
    /// Checks email, password length and confirmation
    ///
    /// Blank fields are reported once as "can't be blank" rather than also
    /// failing the format rules.
    pub fn validate_all(&self) -> Result<(), Vec<ValidationErrorDetail>> {
        let mut errors = FieldErrors::new();
        let email = self.email.as_deref().unwrap_or_default();
        let password = self.password.as_deref().unwrap_or_default();

        if email.trim().is_empty() {
            errors.add("email", "can't be blank");
        } else {
            errors.merge(self.validate());
        }

        if password.is_empty() {
            errors.add("password", "can't be blank");
        } else if let Err(message) = validate_password_length(password) {
            errors.add("password", message);
        }

        if let Some(confirmation) = &self.password_confirmation {
            if confirmation != password {
                errors.add("password_confirmation", "doesn't match Password");
            }
        }

        errors.into_result()
    }
}

/// Editable profile fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ProfileAttributes {
    #[validate(length(max = 50, message = "is too long (maximum is 50 characters)"))]
    pub first_name: Option<String>,

    #[validate(length(max = 50, message = "is too long (maximum is 50 characters)"))]
    pub middle_name: Option<String>,

    #[validate(length(max = 50, message = "is too long (maximum is 50 characters)"))]
    pub last_name: Option<String>,

    pub gender: Option<String>,
    pub profile_image_url: Option<String>,
}

impl ProfileAttributes {
    pub fn validate_all(&self) -> Result<(), Vec<ValidationErrorDetail>> {
        let mut errors = FieldErrors::new();
        errors.merge(self.validate());
        errors.inclusion("gender", self.gender.as_deref(), &GENDERS);
        errors.into_result()
    }
}

/// Profile update body (`{"profile": {...}}`); `null` clears a field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileParams {
    #[serde(default, deserialize_with = "nullable")]
    pub first_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub middle_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub last_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub gender: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub profile_image_url: Option<Option<String>>,
}

impl ProfileParams {
    /// Applies the sent fields; blank strings are stored as absent
    pub fn apply_to(self, attributes: &mut ProfileAttributes) {
        assign(&mut attributes.first_name, self.first_name.map(presence));
        assign(&mut attributes.middle_name, self.middle_name.map(presence));
        assign(&mut attributes.last_name, self.last_name.map(presence));
        assign(&mut attributes.gender, self.gender.map(presence));
        assign(&mut attributes.profile_image_url, self.profile_image_url.map(presence));
    }
}

impl User {
    /// Present name parts joined by spaces, or the email when there are none
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }

    pub fn profile(&self) -> ProfileAttributes {
        ProfileAttributes {
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            profile_image_url: self.profile_image_url.clone(),
        }
    }

    /// Inserts a user row
    ///
    /// Prefer [`User::register`], which also creates the subscription.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> ModelResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(data.email.trim())
        .bind(data.password_hash)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Creates a user together with the default free subscription
    ///
    /// Both rows are written in one transaction.
    ///
    /// # Errors
    ///
    /// `ModelError::Validation` with "Email has already been taken" when the
    /// email is in use.
    pub async fn register(pool: &PgPool, data: CreateUser) -> ModelResult<(Self, Subscription)> {
        let mut tx = pool.begin().await?;

        let user = Self::create(&mut *tx, data).await?;
        let subscription = Subscription::create(&mut *tx, user.id, SubscriptionPlan::Free).await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok((user, subscription))
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email, ignoring case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1::citext",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await
    }

    /// Validates and stores new profile fields
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        profile: ProfileAttributes,
    ) -> ModelResult<Option<Self>> {
        profile.validate_all()?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = $2, middle_name = $3, last_name = $4, gender = $5,
                profile_image_url = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(profile.first_name)
        .bind(profile.middle_name)
        .bind(profile.last_name)
        .bind(profile.gender)
        .bind(profile.profile_image_url)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Clears the profile image
    ///
    /// Returns `None` when the user has no image to clear.
    pub async fn clear_profile_image(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET profile_image_url = NULL, updated_at = NOW()
            WHERE id = $1 AND profile_image_url IS NOT NULL
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Records a successful login
    ///
    /// The previous `current_sign_in_at` becomes `last_sign_in_at`.
    pub async fn record_sign_in(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET sign_in_count = sign_in_count + 1,
                last_sign_in_at = COALESCE(current_sign_in_at, NOW()),
                current_sign_in_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user and, through cascades, everything they own
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
