//! # Application Handle
//!
//! Wires configuration, storage and the services into one value a front
//! end can hold for the lifetime of the session.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. SalonConfig::load(path)      defaults → salon.toml → SALON_* env   │
//! │  2. create data directory        platform data dir unless configured    │
//! │  3. Database::new(db_config)     WAL, foreign keys, migrations          │
//! │  4. services                     catalog · queries · passphrase policy  │
//! │  5. cart                         one in-progress sale behind a Mutex    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use salon_core::history::SaleKey;
use salon_core::{Cart, CompletedSaleSummary};
use salon_db::Database;

use crate::auth::PassphrasePolicy;
use crate::catalog::CatalogService;
use crate::checkout::checkout;
use crate::config::SalonConfig;
use crate::deletion::delete_logical_sale;
use crate::error::{CheckoutError, ConfigError, ServiceError, ServiceResult};
use crate::queries::{render_receipt, SalesQueries};

pub struct SalonApp {
    config: SalonConfig,
    db: Database,
    catalog: CatalogService,
    queries: SalesQueries,
    auth: PassphrasePolicy<Database>,
    cart: Mutex<Cart>,
}

impl SalonApp {
    /// Connects to the configured database and builds the services.
    pub async fn open(config: SalonConfig) -> ServiceResult<Self> {
        let db_path = config.database_path();
        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(ConfigError::from)?;
        }

        info!(path = %db_path.display(), store = %config.store.name, "Opening salon database");
        let db = Database::new(config.db_config()).await?;
        Ok(Self::with_database(config, db))
    }

    /// Builds the services over an already connected database.
    pub fn with_database(config: SalonConfig, db: Database) -> Self {
        SalonApp {
            catalog: CatalogService::new(db.clone()),
            queries: SalesQueries::new(db.clone()),
            auth: PassphrasePolicy::new(db.clone(), config.cooldown()),
            cart: Mutex::new(Cart::new()),
            config,
            db,
        }
    }

    pub fn config(&self) -> &SalonConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn queries(&self) -> &SalesQueries {
        &self.queries
    }

    pub fn auth(&self) -> &PassphrasePolicy<Database> {
        &self.auth
    }

    /// Runs `f` against the in-progress cart.
    pub async fn with_cart<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        let mut cart = self.cart.lock().await;
        f(&mut cart)
    }

    /// Finalizes the in-progress cart with the configured retry policy.
    pub async fn checkout(&self) -> Result<CompletedSaleSummary, CheckoutError> {
        let mut cart = self.cart.lock().await;
        checkout(&self.db, &mut cart, Utc::now(), self.config.checkout_options()).await
    }

    /// Deletes the logical sale identified by `key`.
    pub async fn delete_sale(&self, key: &SaleKey, passphrase: Option<&str>) -> ServiceResult<u64> {
        let sale = self
            .queries
            .find_sale(key)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", format!("{} / {}", key.date.to_rfc3339(), key.customer_id)))?;

        delete_logical_sale(&self.db, &self.auth, &sale, passphrase, Utc::now()).await
    }

    pub fn receipt(&self, summary: &CompletedSaleSummary) -> String {
        render_receipt(summary, &self.config)
    }
}
