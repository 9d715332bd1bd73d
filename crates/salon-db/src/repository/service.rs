//! # Service Repository
//!
//! Database operations for the service catalog.
//!
//! Prices are stored in minor units. Editing a price here never touches an
//! in-progress cart (the cart copies the price when a service is added) or
//! past sale units (they carry their own final price).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use salon_core::Service;

/// Repository for service catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.services();
/// let catalog = repo.list().await?;
/// let hits = repo.search("hair", 10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    /// Creates a new ServiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// Lists the catalog, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT id, name, price_cents, created_at FROM services ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = services.len(), "Loaded service catalog");
        Ok(services)
    }

    /// Searches services by name (case-insensitive substring).
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Service>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching services");

        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, name, price_cents, created_at
            FROM services
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY name COLLATE NOCASE
            LIMIT ?2
            "#,
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Gets a service by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(
            "SELECT id, name, price_cents, created_at FROM services WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    /// Inserts a new service.
    ///
    /// ## Returns
    /// * `Err(DbError::ConstraintViolation)` - negative price
    pub async fn insert(&self, service: &Service) -> DbResult<Service> {
        debug!(id = %service.id, price_cents = service.price_cents, "Inserting service");

        sqlx::query(
            r#"
            INSERT INTO services (id, name, price_cents, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(service.price_cents)
        .bind(service.created_at)
        .execute(&self.pool)
        .await?;

        Ok(service.clone())
    }

    /// Updates name and price.
    pub async fn update(&self, service: &Service) -> DbResult<()> {
        debug!(id = %service.id, "Updating service");

        let result = sqlx::query("UPDATE services SET name = ?2, price_cents = ?3 WHERE id = ?1")
            .bind(&service.id)
            .bind(&service.name)
            .bind(service.price_cents)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", &service.id));
        }

        Ok(())
    }

    /// Deletes a service. Past sale units fall back to "Unknown Service".
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting service");

        let result = sqlx::query("DELETE FROM services WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use chrono::Utc;

    fn service(name: &str, price_cents: i64) -> Service {
        Service {
            id: generate_id(),
            name: name.to_string(),
            price_cents,
            created_at: Utc::now(),
        }
    }

    async fn repo() -> ServiceRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().services()
    }

    #[tokio::test]
    async fn test_catalog_crud() {
        let repo = repo().await;
        let mut haircut = service("Haircut", 10_000);
        repo.insert(&haircut).await.unwrap();
        repo.insert(&service("Facial", 80_000)).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Facial", "Haircut"]);

        haircut.price_cents = 12_000;
        repo.update(&haircut).await.unwrap();
        assert_eq!(repo.get_by_id(&haircut.id).await.unwrap().unwrap().price_cents, 12_000);

        repo.delete(&haircut.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let repo = repo().await;
        repo.insert(&service("Haircut", 10_000)).await.unwrap();
        repo.insert(&service("Hair Spa", 60_000)).await.unwrap();
        repo.insert(&service("Manicure", 40_000)).await.unwrap();

        assert_eq!(repo.search("hair", 10).await.unwrap().len(), 2);
        assert_eq!(repo.search("hair", 1).await.unwrap().len(), 1);
        assert_eq!(repo.search("cure", 10).await.unwrap()[0].name, "Manicure");
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let repo = repo().await;
        let err = repo.insert(&service("Broken", -1)).await.unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }
}
