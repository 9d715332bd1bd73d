//! # salon-service: Orchestration Layer for Salon POS
//!
//! Connects the pure pricing engine in `salon-core` to SQLite storage in
//! `salon-db`.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         salon-service                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 SalonApp (session handle)                        │  │
//! │  │   config · database · cart · catalog · queries · auth            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │     ┌──────────────┬──────────┼───────────┬──────────────────┐         │
//! │     ▼              ▼          ▼           ▼                  ▼          │
//! │  ┌────────┐  ┌──────────┐ ┌────────┐ ┌──────────┐   ┌──────────────┐   │
//! │  │checkout│  │ deletion │ │ auth   │ │ catalog  │   │   queries    │   │
//! │  │UnitOf- │  │ logical  │ │argon2 +│ │ validated│   │ history, CSV │   │
//! │  │Work +  │  │ sale by  │ │cooldown│ │ CRUD     │   │ reports,     │   │
//! │  │retry   │  │ row ids  │ │        │ │          │   │ receipts     │   │
//! │  └───┬────┘  └────┬─────┘ └───┬────┘ └────┬─────┘   └──────┬───────┘   │
//! │      └────────────┴───────────┴───────────┴────────────────┘            │
//! │                               │                                         │
//! │             store traits: SaleUnitStore · CatalogStore · KeyValueStore  │
//! └───────────────────────────────┼─────────────────────────────────────────┘
//!                                 ▼
//!                          salon_db::Database
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use salon_service::{init_tracing, SalonApp, SalonConfig};
//!
//! init_tracing();
//! let app = SalonApp::open(SalonConfig::load(None)?).await?;
//!
//! app.with_cart(|cart| cart.add_service(&haircut, 1)).await?;
//! let summary = app.checkout().await?;
//! println!("{}", app.receipt(&summary));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod app;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod deletion;
pub mod error;
pub mod queries;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use app::SalonApp;
pub use auth::{AuthorizationPolicy, PassphrasePolicy};
pub use catalog::CatalogService;
pub use checkout::{checkout, CheckoutOptions, RetryPolicy, UnitOfWork};
pub use config::SalonConfig;
pub use deletion::delete_logical_sale;
pub use error::{CheckoutError, ConfigError, DeletionAuthError, ServiceError, ServiceResult};
pub use queries::{render_receipt, HistoryQuery, HistoryView, ReportBundle, SalesQueries};
pub use store::{CatalogStore, KeyValueStore, SaleUnitStore};

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=salon_service=trace` - Trace this crate only
/// - Default: `info,salon=debug,sqlx=warn`
///
/// Call once at startup. A second call panics inside `tracing_subscriber`,
/// so front ends that may re-enter should use [`try_init_tracing`].
pub fn init_tracing() {
    tracing_subscriber::fmt().with_env_filter(default_filter()).init();
}

/// Like [`init_tracing`], but returns `false` when a subscriber is already set.
pub fn try_init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .try_init()
        .is_ok()
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,salon=debug,sqlx=warn"))
}
