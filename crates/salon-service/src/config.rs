//! # Salon Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SALON_STORE_NAME="Glow Studio"                                     │
//! │     SALON_DB_PATH=/srv/salon/salon.db                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/salon-pos/salon.toml (Linux)                             │
//! │     ~/Library/Application Support/com.salon.pos/salon.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! name = "Glow Studio"
//! address_lines = ["12 MG Road", "Bengaluru"]
//! phone = "080 4000 1234"
//!
//! [currency]
//! symbol = "₹"
//! decimals = 2
//!
//! [database]
//! path = "/srv/salon/salon.db"
//! max_connections = 5
//!
//! [auth]
//! cooldown_secs = 300
//!
//! [checkout]
//! prefer_atomic_batch = true
//! max_retries = 3
//! initial_backoff_ms = 100
//! max_backoff_ms = 2000
//!
//! [receipt]
//! width = 42
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use salon_core::auth::Cooldown;
use salon_core::receipt::{ReceiptRenderer, StoreInfo, DEFAULT_RECEIPT_WIDTH, MIN_RECEIPT_WIDTH};
use salon_core::{DEFAULT_AUTH_COOLDOWN_SECS, MAX_AUTH_COOLDOWN_SECS};
use salon_db::DbConfig;

use crate::checkout::{CheckoutOptions, RetryPolicy};
use crate::error::ConfigError;

const CONFIG_FILE_NAME: &str = "salon.toml";
const DATABASE_FILE_NAME: &str = "salon.db";

// =============================================================================
// Sections
// =============================================================================

/// Printed at the top of every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default)]
    pub address_lines: Vec<String>,

    #[serde(default)]
    pub phone: Option<String>,
}

fn default_store_name() -> String {
    "Salon".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            address_lines: Vec::new(),
            phone: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    #[serde(default = "default_currency_symbol")]
    pub symbol: String,

    /// Digits after the decimal point. Amounts are stored in hundredths,
    /// so only 2 is accepted.
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_decimals() -> u8 {
    2
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            symbol: default_currency_symbol(),
            decimals: default_decimals(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. `None` uses the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Seconds a correct passphrase stays valid for further deletions.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: i64,
}

fn default_cooldown_secs() -> i64 {
    DEFAULT_AUTH_COOLDOWN_SECS
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Write all unit rows in one transaction when the store supports it.
    #[serde(default = "default_true")]
    pub prefer_atomic_batch: bool,

    /// Retries per row (or per batch) on transient store errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_true() -> bool {
    true
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    100
}
fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        CheckoutSettings {
            prefer_atomic_batch: true,
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSettings {
    #[serde(default = "default_receipt_width")]
    pub width: usize,
}

fn default_receipt_width() -> usize {
    DEFAULT_RECEIPT_WIDTH
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        ReceiptSettings {
            width: default_receipt_width(),
        }
    }
}

// =============================================================================
// SalonConfig
// =============================================================================

/// Complete front desk configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalonConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub currency: CurrencySettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub checkout: CheckoutSettings,

    #[serde(default)]
    pub receipt: ReceiptSettings,
}

impl SalonConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (salon.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading salon config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load salon config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML file without applying environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Salon config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name must not be empty".into()));
        }

        if self.currency.symbol.is_empty() {
            return Err(ConfigError::Invalid("currency.symbol must not be empty".into()));
        }

        if self.currency.decimals != 2 {
            return Err(ConfigError::Invalid(format!(
                "currency.decimals must be 2, got {}",
                self.currency.decimals
            )));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if !(0..=MAX_AUTH_COOLDOWN_SECS).contains(&self.auth.cooldown_secs) {
            return Err(ConfigError::Invalid(format!(
                "auth.cooldown_secs must be between 0 and {}",
                MAX_AUTH_COOLDOWN_SECS
            )));
        }

        if self.checkout.initial_backoff_ms > self.checkout.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "checkout.initial_backoff_ms must not exceed checkout.max_backoff_ms".into(),
            ));
        }

        if self.receipt.width < MIN_RECEIPT_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "receipt.width must be at least {}",
                MIN_RECEIPT_WIDTH
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("SALON_STORE_NAME") {
            debug!(store_name = %name, "Overriding store name from environment");
            self.store.name = name;
        }

        if let Some(path) = lookup("SALON_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(symbol) = lookup("SALON_CURRENCY_SYMBOL") {
            self.currency.symbol = symbol;
        }

        if let Some(secs) = lookup("SALON_AUTH_COOLDOWN_SECS") {
            match secs.parse::<i64>() {
                Ok(s) => self.auth.cooldown_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric SALON_AUTH_COOLDOWN_SECS"),
            }
        }

        if let Some(retries) = lookup("SALON_WRITE_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(r) => self.checkout.max_retries = r,
                Err(_) => warn!(value = %retries, "Ignoring non-numeric SALON_WRITE_MAX_RETRIES"),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "salon", "pos")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Resolved database file: configured path, else the platform data dir,
    /// else the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path()).max_connections(self.database.max_connections)
    }

    pub fn cooldown(&self) -> Cooldown {
        Cooldown::from_secs(self.auth.cooldown_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.checkout.max_retries,
            initial_backoff: Duration::from_millis(self.checkout.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.checkout.max_backoff_ms),
        }
    }

    pub fn checkout_options(&self) -> CheckoutOptions {
        CheckoutOptions {
            retry: self.retry_policy(),
            prefer_atomic: self.checkout.prefer_atomic_batch,
        }
    }

    pub fn store_info(&self) -> StoreInfo {
        StoreInfo {
            name: self.store.name.clone(),
            address_lines: self.store.address_lines.clone(),
            phone: self.store.phone.clone(),
        }
    }

    pub fn receipt_renderer(&self) -> ReceiptRenderer {
        ReceiptRenderer::new(self.receipt.width, self.currency.symbol.clone())
    }
}
