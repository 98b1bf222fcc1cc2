//! JWT denylist
//!
//! Logging out stores the token's `jti` until the moment the token would have
//! expired on its own. Authentication rejects any token whose `jti` is
//! listed. Expired rows carry no information and can be purged.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RevokedToken {
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RevokedToken {
    /// Adds a token to the denylist
    ///
    /// Revoking the same token twice is a no-op; returns whether a row was
    /// inserted.
    pub async fn revoke(
        pool: &PgPool,
        jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_revoked(pool: &PgPool, jti: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)")
            .bind(jti)
            .fetch_one(pool)
            .await
    }

    /// Deletes entries whose tokens have expired anyway
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(purged = result.rows_affected(), "Purged expired revoked tokens");
        }
        Ok(result.rows_affected())
    }
}
