//! # Customer Repository
//!
//! Database operations for customers.
//!
//! ## Key Operations
//! - CRUD operations
//! - Substring search on name and contact (front desk lookup)

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use salon_core::Customer;

/// Repository for customer database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CustomerRepository::new(pool);
///
/// let hits = repo.search("98450", 20).await?;
/// let customer = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Searches customers by name or contact.
    ///
    /// Matching is a case-insensitive substring match. An empty query
    /// lists customers alphabetically.
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial)
    /// * `limit` - Maximum results to return
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching customers");

        if query.is_empty() {
            return self.list_limited(limit).await;
        }

        let pattern = like_pattern(query);

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, contact, created_at
            FROM customers
            WHERE name LIKE ?1 ESCAPE '\'
               OR contact LIKE ?1 ESCAPE '\'
            ORDER BY name COLLATE NOCASE
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = customers.len(), "Search returned customers");
        Ok(customers)
    }

    async fn list_limited(&self, limit: u32) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, contact, created_at
            FROM customers
            ORDER BY name COLLATE NOCASE
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Lists every customer, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT id, name, contact, created_at FROM customers ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Gets a customer by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Customer))` - Customer found
    /// * `Ok(None)` - Customer not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, contact, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Inserts a new customer (id generated beforehand).
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, contact, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.contact)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer.clone())
    }

    /// Updates name and contact of an existing customer.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Customer doesn't exist
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query("UPDATE customers SET name = ?2, contact = ?3 WHERE id = ?1")
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(&customer.contact)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Deletes a customer.
    ///
    /// Past sale units keep the id and show up as "Unknown Customer".
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Counts customers (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use chrono::Utc;

    fn customer(name: &str, contact: Option<&str>) -> Customer {
        Customer {
            id: generate_id(),
            name: name.to_string(),
            contact: contact.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    async fn repo() -> CustomerRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().customers()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let meera = customer("Meera", Some("98450 11111"));
        repo.insert(&meera).await.unwrap();

        let fetched = repo.get_by_id(&meera.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Meera");
        assert_eq!(fetched.contact.as_deref(), Some("98450 11111"));
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_name_and_contact() {
        let repo = repo().await;
        repo.insert(&customer("Meera Nair", Some("98450 11111"))).await.unwrap();
        repo.insert(&customer("Ravi", Some("ravi@example.com"))).await.unwrap();
        repo.insert(&customer("Ameer", None)).await.unwrap();

        let by_name = repo.search("MEER", 20).await.unwrap();
        let names: Vec<&str> = by_name.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ameer", "Meera Nair"]);

        let by_contact = repo.search("example.com", 20).await.unwrap();
        assert_eq!(by_contact.len(), 1);
        assert_eq!(by_contact[0].name, "Ravi");

        assert_eq!(repo.search("", 2).await.unwrap().len(), 2);
        assert!(repo.search("100%", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = repo().await;
        let mut c = customer("Meera", None);
        repo.insert(&c).await.unwrap();

        c.contact = Some("meera@example.com".into());
        repo.update(&c).await.unwrap();
        assert_eq!(
            repo.get_by_id(&c.id).await.unwrap().unwrap().contact.as_deref(),
            Some("meera@example.com")
        );

        repo.delete(&c.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(matches!(repo.delete(&c.id).await, Err(DbError::NotFound { .. })));
    }
}
