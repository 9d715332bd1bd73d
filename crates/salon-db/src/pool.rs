//! # Connection Pool
//!
//! Opens the salon's SQLite file and hands out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig { path, pool size, timeouts }                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new ── WAL journal, NORMAL sync, foreign keys, busy timeout  │
//! │       │        └─ embedded migrations (unless disabled)                 │
//! │       ▼                                                                 │
//! │  SqlitePool ─┬─► customers()   staff()   services()                     │
//! │              └─► sale_units()  settings()                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A checkout batch holds one connection for its transaction while history
//! and catalog reads use the others. With WAL, readers never wait on that
//! writer. A second writer waits up to `busy_timeout` and then surfaces a
//! "database is locked" error, which the checkout retry loop treats as
//! transient.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationStatus};
use crate::repository::customer::CustomerRepository;
use crate::repository::sale_unit::SaleUnitRepository;
use crate::repository::service::ServiceRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::staff::StaffRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Pool settings.
///
/// ```rust,ignore
/// let config = DbConfig::new(data_dir.join("salon.db")).max_connections(4);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first connect. `:memory:` for a private
    /// in-memory database.
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long to wait for a free pooled connection.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Isolated in-memory database for tests.
    ///
    /// Each SQLite connection would see its own empty memory database, so
    /// the pool is pinned to one connection.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Skips embedded migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(IN_MEMORY)
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the salon database.
///
/// Clones share one pool. Repositories are cheap views over a pool clone,
/// created per call.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("salon.db")).await?;
/// let regulars = db.customers().search("mee", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and, unless disabled, brings the schema up to date.
    ///
    /// ## Errors
    /// * `DbError::ConnectionFailed` - the file cannot be opened or created
    /// * `DbError::MigrationFailed` - a migration did not apply
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening salon database"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(in_memory = config.is_in_memory(), "Pool connected");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Already applied ones are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub async fn migration_status(&self) -> DbResult<MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }

    /// Raw pool for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn staff(&self) -> StaffRepository {
        StaffRepository::new(self.pool.clone())
    }

    pub fn services(&self) -> ServiceRepository {
        ServiceRepository::new(self.pool.clone())
    }

    pub fn sale_units(&self) -> SaleUnitRepository {
        SaleUnitRepository::new(self.pool.clone())
    }

    /// Key/value settings (admin passphrase hash, last authorization).
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Closes every pooled connection. Later calls on any clone fail.
    pub async fn close(&self) {
        info!("Closing salon database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_healthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_migrations_create_salon_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(names, vec!["customers", "sale_units", "services", "settings", "staff"]);
    }

    #[tokio::test]
    async fn test_closed_database_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let path = std::env::temp_dir().join(format!("salon-pool-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();

        assert!(path.exists());
        db.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/salon.db")
            .max_connections(8)
            .busy_timeout(Duration::from_millis(250))
            .run_migrations(false);

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
