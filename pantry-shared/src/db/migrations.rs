//! Embedded schema migrations
//!
//! The SQL files under the workspace `migrations/` directory are compiled
//! into the binary with `sqlx::migrate!` and applied at startup unless
//! `RUN_MIGRATIONS=false`.
//!
//! ```no_run
//! use pantry_shared::db::migrations::{get_migration_status, run_migrations};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! run_migrations(&pool).await?;
//!
//! let status = get_migration_status(&pool).await?;
//! assert!(status.is_up_to_date);
//! # Ok(())
//! # }
//! ```

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPool;
use tracing::{debug, error, info};

static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Migration status information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Number of migrations bundled with this build
    pub known_migrations: usize,

    /// Latest applied migration version (timestamp)
    pub latest_version: Option<i64>,

    /// Every bundled migration has been applied
    pub is_up_to_date: bool,
}

/// Runs all pending migrations
///
/// Each migration runs in its own transaction; a failure rolls that
/// migration back and stops.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(known = MIGRATOR.iter().count(), "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Migration failed");
        e
    })?;

    info!("Database migrations completed");
    Ok(())
}

/// Compares the applied migrations against the bundled ones
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let known_migrations = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .count();

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            known_migrations,
            latest_version: None,
            is_up_to_date: known_migrations == 0,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    let applied_migrations = usize::try_from(count).unwrap_or_default();
    Ok(MigrationStatus {
        applied_migrations,
        known_migrations,
        latest_version,
        is_up_to_date: applied_migrations >= known_migrations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_migrations_are_ordered() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();

        assert_eq!(versions.len(), 4);
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_bundled_migrations_create_core_tables() {
        let sql: String = MIGRATOR.iter().map(|m| m.sql.as_ref()).collect();

        let tables = [
            "users",
            "subscriptions",
            "revoked_tokens",
            "spaces",
            "storages",
            "items",
            "purchase_sessions",
            "purchase_items",
        ];
        for table in tables {
            assert!(
                sql.contains(&format!("CREATE TABLE {}", table)),
                "missing table {}",
                table
            );
        }
    }
}
