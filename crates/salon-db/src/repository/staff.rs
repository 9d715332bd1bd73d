//! # Staff Repository
//!
//! Database operations for the staff roster.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use salon_core::Staff;

/// Repository for staff database operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Lists the whole roster, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT id, name, created_at FROM staff ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = staff.len(), "Loaded staff roster");
        Ok(staff)
    }

    /// Gets a staff member by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>("SELECT id, name, created_at FROM staff WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(staff)
    }

    /// Inserts a new staff member.
    pub async fn insert(&self, staff: &Staff) -> DbResult<Staff> {
        debug!(id = %staff.id, "Inserting staff");

        sqlx::query("INSERT INTO staff (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&staff.id)
            .bind(&staff.name)
            .bind(staff.created_at)
            .execute(&self.pool)
            .await?;

        Ok(staff.clone())
    }

    /// Renames a staff member.
    pub async fn update(&self, staff: &Staff) -> DbResult<()> {
        debug!(id = %staff.id, "Updating staff");

        let result = sqlx::query("UPDATE staff SET name = ?2 WHERE id = ?1")
            .bind(&staff.id)
            .bind(&staff.name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", &staff.id));
        }

        Ok(())
    }

    /// Deletes a staff member. Past sale units fall back to "Unknown Staff".
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting staff");

        let result = sqlx::query("DELETE FROM staff WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
