//! # Database Errors
//!
//! ```text
//!   sqlx::Error ──► DbError ──► CheckoutError / ServiceError (salon-service)
//!                      │
//!                      └─ is_transient(): Busy, PoolExhausted
//!                         (the checkout write loop retries only these)
//! ```

use thiserror::Error;

/// SQLite primary result codes that mean "try again later".
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with this id. Returned by updates and deletes that hit
    /// nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Duplicate primary key or settings key.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK rejected the row (negative price, unknown payment mode).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Another connection holds the write lock.
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when running the same statement again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Busy(_) | DbError::PoolExhausted)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => classify(
                db_err.code().as_deref(),
                db_err.message(),
            ),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

/// Maps a SQLite error code and message onto a variant.
///
/// Extended codes keep the primary code in their low byte
/// (`SQLITE_BUSY_SNAPSHOT` is 517 = 5 | 2 << 8).
fn classify(code: Option<&str>, msg: &str) -> DbError {
    let primary = code
        .and_then(|c| c.parse::<i32>().ok())
        .map(|c| (c & 0xff).to_string());

    if matches!(primary.as_deref(), Some(SQLITE_BUSY) | Some(SQLITE_LOCKED)) {
        return DbError::Busy(msg.to_string());
    }

    if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
        DbError::duplicate(target, "unknown")
    } else if msg.contains("FOREIGN KEY constraint failed") {
        DbError::ForeignKeyViolation {
            message: msg.to_string(),
        }
    } else if msg.contains("CHECK constraint failed") {
        DbError::ConstraintViolation(msg.to_string())
    } else {
        DbError::QueryFailed(msg.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
