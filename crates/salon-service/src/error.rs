//! # Service Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Service Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────────┐  ┌─────────────────────┐ │
//! │  │  Configuration  │  │     Checkout        │  │   Deletion auth     │ │
//! │  │                 │  │                     │  │                     │ │
//! │  │  Io / Parse     │  │  Validation         │  │  NotConfigured      │ │
//! │  │  Serialize      │  │  DiscountRange      │  │  PassphraseRequired │ │
//! │  │  Invalid        │  │  WriteFailed        │  │  InvalidPassphrase  │ │
//! │  │                 │  │  PartiallyPersisted │  │  Store              │ │
//! │  └─────────────────┘  └─────────────────────┘  └─────────────────────┘ │
//! │                                                                         │
//! │              all of the above roll up into ServiceError                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use salon_core::{CoreError, DiscountRangeError, ValidationError};
use salon_db::DbError;

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Checkout
// =============================================================================

/// Why a checkout did not complete.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A precondition failed. Nothing was written.
    #[error("Cannot complete sale: {0}")]
    Validation(#[from] ValidationError),

    /// An out-of-range discount reached the engine. Nothing was written.
    #[error("Cannot complete sale: {0}")]
    DiscountRange(#[from] DiscountRangeError),

    /// The cart could not be priced for another reason. Nothing was written.
    #[error("Cannot complete sale: {0}")]
    Pricing(CoreError),

    /// The store rejected the sale before any row landed.
    #[error("Sale was not saved: {source}")]
    WriteFailed {
        #[source]
        source: DbError,
    },

    /// Some rows were written before a row failed.
    ///
    /// `written_ids` are the rows that did land, in write order;
    /// `failed_index` is the 0-based position of the row that failed.
    #[error(
        "Sale partially saved: {written} of {total_rows} rows written, row {failed_index} failed: {source}",
        written = .written_ids.len()
    )]
    PartiallyPersisted {
        written_ids: Vec<String>,
        failed_index: usize,
        total_rows: usize,
        #[source]
        source: DbError,
    },
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => CheckoutError::Validation(e),
            CoreError::DiscountRange(e) => CheckoutError::DiscountRange(e),
            other => CheckoutError::Pricing(other),
        }
    }
}

impl CheckoutError {
    /// True when no row of the sale reached the store.
    pub fn nothing_written(&self) -> bool {
        !matches!(self, CheckoutError::PartiallyPersisted { .. })
    }
}

// =============================================================================
// Deletion Authorization
// =============================================================================

/// Re-authentication failures. When one of these is returned no rows
/// have been touched.
#[derive(Debug, Error)]
pub enum DeletionAuthError {
    /// No admin passphrase has been set yet.
    #[error("Admin passphrase is not configured")]
    NotConfigured,

    /// The cooldown has expired and no passphrase was supplied.
    #[error("Admin passphrase required")]
    PassphraseRequired,

    /// The supplied passphrase did not match.
    #[error("Incorrect admin passphrase")]
    InvalidPassphrase,

    /// The stored hash or timestamp could not be used.
    #[error("Stored credential is unreadable: {0}")]
    CorruptCredential(String),

    /// The settings store failed.
    #[error("Authorization store failed: {0}")]
    Store(#[from] DbError),
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read or write config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No config path available")]
    NoPath,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Service Error
// =============================================================================

/// Top-level error for the orchestration layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Auth(#[from] DeletionAuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}
