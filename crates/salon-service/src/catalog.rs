//! # Catalog Management
//!
//! Validated create/update/delete for customers, staff and services.
//! Inputs are trimmed and checked with the core validators before they
//! reach the repositories.

use chrono::Utc;
use tracing::info;

use salon_core::validation::{validate_contact, validate_name, validate_price_cents, validate_search_query};
use salon_core::{Customer, Service, Staff};
use salon_db::repository::generate_id;
use salon_db::{Database, DbError};

use crate::error::{ServiceError, ServiceResult};

/// Default cap for customer search results.
pub const SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        CatalogService { db }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn create_customer(&self, name: &str, contact: Option<&str>) -> ServiceResult<Customer> {
        validate_name("name", name)?;
        let customer = Customer {
            id: generate_id(),
            name: name.trim().to_string(),
            contact: validate_contact(contact)?,
            created_at: Utc::now(),
        };

        let customer = self.db.customers().insert(&customer).await?;
        info!(id = %customer.id, name = %customer.name, "Customer created");
        Ok(customer)
    }

    pub async fn update_customer(&self, id: &str, name: &str, contact: Option<&str>) -> ServiceResult<Customer> {
        validate_name("name", name)?;
        let mut customer = self.require_customer(id).await?;
        customer.name = name.trim().to_string();
        customer.contact = validate_contact(contact)?;

        self.db.customers().update(&customer).await?;
        info!(id = %customer.id, "Customer updated");
        Ok(customer)
    }

    pub async fn delete_customer(&self, id: &str) -> ServiceResult<()> {
        self.db.customers().delete(id).await.map_err(not_found_to_service)?;
        info!(id = %id, "Customer deleted");
        Ok(())
    }

    pub async fn customer(&self, id: &str) -> ServiceResult<Option<Customer>> {
        Ok(self.db.customers().get_by_id(id).await?)
    }

    pub async fn customers(&self) -> ServiceResult<Vec<Customer>> {
        Ok(self.db.customers().list().await?)
    }

    /// Case-insensitive match on name or contact. An empty query lists
    /// the first customers by name.
    pub async fn search_customers(&self, query: &str) -> ServiceResult<Vec<Customer>> {
        let query = validate_search_query(query)?;
        Ok(self.db.customers().search(&query, SEARCH_LIMIT).await?)
    }

    async fn require_customer(&self, id: &str) -> ServiceResult<Customer> {
        self.db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    // =========================================================================
    // Staff
    // =========================================================================

    pub async fn create_staff(&self, name: &str) -> ServiceResult<Staff> {
        validate_name("name", name)?;
        let staff = Staff {
            id: generate_id(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        let staff = self.db.staff().insert(&staff).await?;
        info!(id = %staff.id, name = %staff.name, "Staff created");
        Ok(staff)
    }

    pub async fn rename_staff(&self, id: &str, name: &str) -> ServiceResult<Staff> {
        validate_name("name", name)?;
        let mut staff = self
            .db
            .staff()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Staff", id))?;
        staff.name = name.trim().to_string();

        self.db.staff().update(&staff).await?;
        info!(id = %staff.id, "Staff renamed");
        Ok(staff)
    }

    pub async fn delete_staff(&self, id: &str) -> ServiceResult<()> {
        self.db.staff().delete(id).await.map_err(not_found_to_service)?;
        info!(id = %id, "Staff deleted");
        Ok(())
    }

    pub async fn staff(&self) -> ServiceResult<Vec<Staff>> {
        Ok(self.db.staff().list().await?)
    }

    // =========================================================================
    // Services
    // =========================================================================

    pub async fn create_service(&self, name: &str, price_cents: i64) -> ServiceResult<Service> {
        validate_name("name", name)?;
        validate_price_cents(price_cents)?;
        let service = Service {
            id: generate_id(),
            name: name.trim().to_string(),
            price_cents,
            created_at: Utc::now(),
        };

        let service = self.db.services().insert(&service).await?;
        info!(id = %service.id, name = %service.name, price_cents, "Service created");
        Ok(service)
    }

    /// Changes name and price. Carts already holding the service keep the
    /// price they were built with.
    pub async fn update_service(&self, id: &str, name: &str, price_cents: i64) -> ServiceResult<Service> {
        validate_name("name", name)?;
        validate_price_cents(price_cents)?;
        let mut service = self
            .db
            .services()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service", id))?;
        service.name = name.trim().to_string();
        service.price_cents = price_cents;

        self.db.services().update(&service).await?;
        info!(id = %service.id, price_cents, "Service updated");
        Ok(service)
    }

    pub async fn delete_service(&self, id: &str) -> ServiceResult<()> {
        self.db.services().delete(id).await.map_err(not_found_to_service)?;
        info!(id = %id, "Service deleted");
        Ok(())
    }

    pub async fn services(&self) -> ServiceResult<Vec<Service>> {
        Ok(self.db.services().list().await?)
    }

    pub async fn search_services(&self, query: &str) -> ServiceResult<Vec<Service>> {
        let query = validate_search_query(query)?;
        Ok(self.db.services().search(&query, SEARCH_LIMIT).await?)
    }
}

fn not_found_to_service(err: DbError) -> ServiceError {
    match err {
        DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
        other => other.into(),
    }
}
