//! Database schema versioning
//!
//! Version 1 is the schema built by
//! [`create_schema`](crate::db::init::create_schema). A database at version 0
//! has just been created from it and is stamped as the baseline. Later schema
//! changes go in as `migrate_vN` steps that bring a version `N - 1` database
//! forward, together with a bump of [`CURRENT_SCHEMA_VERSION`].

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Recorded schema version; 0 when nothing has been stamped yet
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
    )
    .fetch_one(pool)
    .await?;
    if !has_table {
        return Ok(0);
    }

    let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Bring the recorded version up to [`CURRENT_SCHEMA_VERSION`]
///
/// Expects [`create_schema`](crate::db::init::create_schema) to have run.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let version = get_schema_version(pool).await?;

    if version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema v{} is newer than this build (v{}); continuing",
            version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    if version == 0 {
        set_schema_version(pool, CURRENT_SCHEMA_VERSION).await?;
        info!("Stamped new database at schema v{}", CURRENT_SCHEMA_VERSION);
        return Ok(());
    }

    info!("Database schema is up to date (v{})", version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_schema_version_zero_without_table() {
        let pool = memory_pool().await;
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_new_schema_is_stamped_once() {
        let pool = memory_pool().await;
        create_schema(&pool).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_newer_database_is_left_alone() {
        let pool = memory_pool().await;
        create_schema(&pool).await.unwrap();
        set_schema_version(&pool, CURRENT_SCHEMA_VERSION + 1).await.unwrap();

        run_migrations(&pool).await.unwrap();

        assert_eq!(
            get_schema_version(&pool).await.unwrap(),
            CURRENT_SCHEMA_VERSION + 1
        );
    }
}
