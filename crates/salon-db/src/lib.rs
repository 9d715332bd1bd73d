//! # salon-db: SQLite Storage for Salon POS
//!
//! Owns the salon's single SQLite file: catalog tables, one row per sold
//! service unit, and a small key/value settings table. Everything above
//! this crate talks to it through [`Database`] and its repositories.
//!
//! ```text
//!   salon-service (checkout, deletion, history, reports)
//!        │
//!        ▼
//!   Database ──────────┬─ customers()   CustomerRepository
//!   (SqlitePool, WAL)  ├─ staff()       StaffRepository
//!        │             ├─ services()    ServiceRepository
//!        │             ├─ sale_units()  SaleUnitRepository  (batch insert, delete by ids)
//!        │             └─ settings()    SettingsRepository  (admin passphrase, cooldown)
//!        ▼
//!   salon.db  ◄── migrations/sqlite/*.sql (embedded, applied on connect)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use salon_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("salon.db")).await?;
//! let services = db.services().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::sale_unit::SaleUnitRepository;
pub use repository::service::ServiceRepository;
pub use repository::settings::SettingsRepository;
pub use repository::staff::StaffRepository;
