//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied in filename order on connect. sqlx records each one in
//! `_sqlx_migrations`, so reconnecting to an up-to-date file is a no-op.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   customers, staff, services, sale_units, settings
//! ```
//!
//! Applied files are checksummed. Schema changes go in a new numbered file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applied vs. embedded migration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Applies every pending migration.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;
    if before.is_current() {
        debug!(applied = before.applied, "Schema up to date");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;

    info!(
        from = before.applied,
        to = before.embedded,
        "Schema migrated"
    );
    Ok(())
}

/// Reads how many migrations have been applied. A database that was never
/// migrated reports zero.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let tracked: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    let applied: i64 = match tracked {
        Some(_) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(pool)
                .await?
        }
        None => 0,
    };

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: applied.max(0) as usize,
    })
}
