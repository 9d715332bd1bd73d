//! # Data-Access Capabilities
//!
//! The orchestration code never talks to SQLite directly. It is written
//! against three small traits, implemented for [`Database`] here and by an
//! in-memory fake in tests.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout / deletion / auth                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleUnitStore     write(row) · write_batch(rows) · delete_rows(ids)   │
//! │  CatalogStore      service_catalog() · staff_roster() · customer(id)   │
//! │  KeyValueStore     get(key) · set(key, value) · remove(key)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  salon_db::Database (SQLite)      MemoryStore (tests)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use salon_core::{Customer, NewSaleUnit, Service, Staff};
use salon_db::{Database, DbError, DbResult};

/// Where sale unit rows are written and deleted.
#[async_trait]
pub trait SaleUnitStore: Send + Sync {
    /// Writes one row and returns its id.
    async fn write(&self, row: &NewSaleUnit) -> DbResult<String>;

    /// Whether [`write_batch`](Self::write_batch) is all-or-nothing.
    fn supports_atomic_batch(&self) -> bool {
        false
    }

    /// Writes all rows atomically. Only called when
    /// [`supports_atomic_batch`](Self::supports_atomic_batch) is true.
    async fn write_batch(&self, rows: &[NewSaleUnit]) -> DbResult<Vec<String>> {
        let _ = rows;
        Err(DbError::Internal("atomic batch writes are not supported".into()))
    }

    /// Deletes the rows as one operation. Returns how many were removed.
    async fn delete_rows(&self, ids: &[String]) -> DbResult<u64>;
}

/// Read-only catalog lookups used to build a cart.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn service_catalog(&self) -> DbResult<Vec<Service>>;
    async fn staff_roster(&self) -> DbResult<Vec<Staff>>;
    async fn customer(&self, id: &str) -> DbResult<Option<Customer>>;
}

/// Small persistent key/value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> DbResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> DbResult<()>;
    async fn remove(&self, key: &str) -> DbResult<()>;
}

// =============================================================================
// SQLite implementations
// =============================================================================

#[async_trait]
impl SaleUnitStore for Database {
    async fn write(&self, row: &NewSaleUnit) -> DbResult<String> {
        self.sale_units().insert(row).await
    }

    fn supports_atomic_batch(&self) -> bool {
        true
    }

    async fn write_batch(&self, rows: &[NewSaleUnit]) -> DbResult<Vec<String>> {
        self.sale_units().insert_batch(rows).await
    }

    async fn delete_rows(&self, ids: &[String]) -> DbResult<u64> {
        self.sale_units().delete_rows(ids).await
    }
}

#[async_trait]
impl CatalogStore for Database {
    async fn service_catalog(&self) -> DbResult<Vec<Service>> {
        self.services().list().await
    }

    async fn staff_roster(&self) -> DbResult<Vec<Staff>> {
        self.staff().list().await
    }

    async fn customer(&self, id: &str) -> DbResult<Option<Customer>> {
        self.customers().get_by_id(id).await
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        self.settings().get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.settings().set(key, value).await
    }

    async fn remove(&self, key: &str) -> DbResult<()> {
        self.settings().delete(key).await.map(|_| ())
    }
}

// =============================================================================
// In-memory fake
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use salon_core::{Money, PaymentMode};
    use salon_db::DbConfig;

    fn row(cents: i64) -> NewSaleUnit {
        NewSaleUnit {
            customer_id: "cus-1".into(),
            staff_id: "stf-1".into(),
            service_id: "svc-a".into(),
            unit_final_price: Money::from_cents(cents),
            discount_amount: Money::zero(),
            payment_mode: PaymentMode::Cash,
            date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_database_is_an_atomic_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store: &dyn SaleUnitStore = &db;

        assert!(store.supports_atomic_batch());
        let ids = store.write_batch(&[row(100), row(200)]).await.unwrap();
        assert_eq!(store.delete_rows(&ids).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_database_key_value_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv: &dyn KeyValueStore = &db;

        kv.set("k", "v").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));
        kv.remove("k").await.unwrap();
        kv.remove("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_database_catalog_lookups() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        db.services()
            .insert(&Service { id: "svc-a".into(), name: "Haircut".into(), price_cents: 10_000, created_at: now })
            .await
            .unwrap();
        db.customers()
            .insert(&Customer { id: "cus-1".into(), name: "Meera".into(), contact: None, created_at: now })
            .await
            .unwrap();

        let catalog: &dyn CatalogStore = &db;
        assert_eq!(catalog.service_catalog().await.unwrap().len(), 1);
        assert!(catalog.staff_roster().await.unwrap().is_empty());
        assert_eq!(catalog.customer("cus-1").await.unwrap().unwrap().name, "Meera");
    }

    #[tokio::test]
    async fn test_default_store_has_no_batch() {
        let store = memory::MemoryStore::new();
        assert!(!store.supports_atomic_batch());
    }
}
