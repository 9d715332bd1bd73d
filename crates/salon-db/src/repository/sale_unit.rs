//! # Sale Unit Repository
//!
//! Per-unit sale rows: the only thing a checkout writes.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sale Unit Writes                                   │
//! │                                                                         │
//! │  SettlementPlan.rows (N rows, same date + customer_id)                 │
//! │       │                                                                 │
//! │       ├── insert_batch(rows) ─► BEGIN; INSERT × N; COMMIT              │
//! │       │                         (all rows or none)                      │
//! │       │                                                                 │
//! │       └── insert(row) × N ──► one statement per row                    │
//! │                               (caller tracks partial progress)          │
//! │                                                                         │
//! │  Deleting a logical sale:                                              │
//! │       delete_rows(ids) ──► BEGIN; DELETE ... WHERE id IN (...); COMMIT │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Path
//! History and reports read [`SaleUnitRecord`]s: each row LEFT JOINed with
//! customer, staff and service names. A deleted catalog entry yields a
//! `NULL` name, never a dropped row.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use salon_core::reports::DateWindow;
use salon_core::{NewSaleUnit, SaleUnit, SaleUnitRecord};

const RECORD_SELECT: &str = r#"
    SELECT
        u.id,
        u.customer_id,
        c.name AS customer_name,
        u.staff_id,
        s.name AS staff_name,
        u.service_id,
        v.name AS service_name,
        u.unit_final_price_cents,
        u.discount_amount_cents,
        u.payment_mode,
        u.date
    FROM sale_units u
    LEFT JOIN customers c ON c.id = u.customer_id
    LEFT JOIN staff s ON s.id = u.staff_id
    LEFT JOIN services v ON v.id = u.service_id
"#;

/// Repository for sale unit rows.
#[derive(Debug, Clone)]
pub struct SaleUnitRepository {
    pool: SqlitePool,
}

impl SaleUnitRepository {
    /// Creates a new SaleUnitRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleUnitRepository { pool }
    }

    /// Writes a single unit row and returns its generated id.
    pub async fn insert(&self, row: &NewSaleUnit) -> DbResult<String> {
        let id = generate_id();
        let now = Utc::now();

        debug!(
            id = %id,
            service_id = %row.service_id,
            unit_final_price = row.unit_final_price.cents(),
            "Inserting sale unit"
        );

        insert_row(&self.pool, &id, row, now).await?;
        Ok(id)
    }

    /// Writes every row inside one transaction.
    ///
    /// Either all rows are committed and their ids returned in input order,
    /// or nothing is written.
    pub async fn insert_batch(&self, rows: &[NewSaleUnit]) -> DbResult<Vec<String>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = generate_id();
            // Dropping `tx` on error rolls the batch back
            insert_row(&mut *tx, &id, row, now).await?;
            ids.push(id);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(rows = ids.len(), "Sale unit batch committed");
        Ok(ids)
    }

    /// Deletes the given rows in one transaction.
    ///
    /// Returns the number of rows actually removed. Ids that no longer
    /// exist are skipped silently.
    pub async fn delete_rows(&self, ids: &[String]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM sale_units WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        let result = builder.build().execute(&mut *tx).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(requested = ids.len(), deleted = result.rows_affected(), "Sale units deleted");
        Ok(result.rows_affected())
    }

    /// Gets a raw unit row by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleUnit>> {
        let unit = sqlx::query_as::<_, SaleUnit>(
            r#"
            SELECT id, customer_id, staff_id, service_id,
                   unit_final_price_cents, discount_amount_cents,
                   payment_mode, date, created_at
            FROM sale_units
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Lists joined records, newest first, optionally restricted to an
    /// inclusive date window.
    pub async fn list_records(&self, window: Option<&DateWindow>) -> DbResult<Vec<SaleUnitRecord>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(RECORD_SELECT);
        if let Some(window) = window {
            builder
                .push(" WHERE u.date >= ")
                .push_bind(window.start)
                .push(" AND u.date <= ")
                .push_bind(window.end);
        }
        builder.push(" ORDER BY u.date DESC, u.created_at, u.id");

        let records = builder
            .build_query_as::<SaleUnitRecord>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), windowed = window.is_some(), "Loaded sale unit records");
        Ok(records)
    }

    /// Lists the rows of one logical sale.
    pub async fn list_for_sale(
        &self,
        date: DateTime<Utc>,
        customer_id: &str,
    ) -> DbResult<Vec<SaleUnitRecord>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(RECORD_SELECT);
        builder
            .push(" WHERE u.date = ")
            .push_bind(date)
            .push(" AND u.customer_id = ")
            .push_bind(customer_id)
            .push(" ORDER BY u.created_at, u.id");

        let records = builder
            .build_query_as::<SaleUnitRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Counts unit rows.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_units")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn insert_row<'e, E>(
    executor: E,
    id: &str,
    row: &NewSaleUnit,
    created_at: DateTime<Utc>,
) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO sale_units (
            id, customer_id, staff_id, service_id,
            unit_final_price_cents, discount_amount_cents,
            payment_mode, date, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(id)
    .bind(&row.customer_id)
    .bind(&row.staff_id)
    .bind(&row.service_id)
    .bind(row.unit_final_price.cents())
    .bind(row.discount_amount.cents())
    .bind(row.payment_mode)
    .bind(row.date)
    .bind(created_at)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use salon_core::{Customer, Money, PaymentMode, Service, Staff};

    fn unit(customer: &str, service: &str, cents: i64, date: DateTime<Utc>) -> NewSaleUnit {
        NewSaleUnit {
            customer_id: customer.to_string(),
            staff_id: "stf-1".to_string(),
            service_id: service.to_string(),
            unit_final_price: Money::from_cents(cents),
            discount_amount: Money::zero(),
            payment_mode: PaymentMode::Upi,
            date,
        }
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        db.customers()
            .insert(&Customer { id: "cus-1".into(), name: "Meera".into(), contact: None, created_at: now })
            .await
            .unwrap();
        db.staff()
            .insert(&Staff { id: "stf-1".into(), name: "Asha".into(), created_at: now })
            .await
            .unwrap();
        db.services()
            .insert(&Service { id: "svc-a".into(), name: "Haircut".into(), price_cents: 10_000, created_at: now })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = seeded().await;
        let repo = db.sale_units();
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();

        let id = repo.insert(&unit("cus-1", "svc-a", 9_183, date)).await.unwrap();
        let stored = repo.get_by_id(&id).await.unwrap().unwrap();

        assert_eq!(stored.unit_final_price_cents, 9_183);
        assert_eq!(stored.payment_mode, PaymentMode::Upi);
        assert_eq!(stored.date, date);
    }

    #[tokio::test]
    async fn test_batch_is_atomic() {
        let db = seeded().await;
        let repo = db.sale_units();
        let date = Utc::now();

        let ids = repo
            .insert_batch(&[unit("cus-1", "svc-a", 100, date), unit("cus-1", "svc-a", 200, date)])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);

        // Second row violates the CHECK constraint: nothing from this batch lands
        let err = repo
            .insert_batch(&[unit("cus-1", "svc-a", 300, date), unit("cus-1", "svc-a", -1, date)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_records_fall_back_when_catalog_deleted() {
        let db = seeded().await;
        let repo = db.sale_units();
        repo.insert(&unit("cus-1", "svc-a", 100, Utc::now())).await.unwrap();
        repo.insert(&unit("cus-gone", "svc-a", 100, Utc::now())).await.unwrap();

        db.services().delete("svc-a").await.unwrap();

        let records = repo.list_records(None).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.service_label() == "Unknown Service"));
        assert!(records.iter().any(|r| r.customer_label() == "Unknown Customer"));
        assert!(records.iter().all(|r| r.staff_label() == "Asha"));
    }

    #[tokio::test]
    async fn test_list_records_window() {
        let db = seeded().await;
        let repo = db.sale_units();
        let day = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();

        repo.insert(&unit("cus-1", "svc-a", 100, day - Duration::days(1))).await.unwrap();
        repo.insert(&unit("cus-1", "svc-a", 200, day)).await.unwrap();
        repo.insert(&unit("cus-1", "svc-a", 300, day + Duration::hours(23))).await.unwrap();
        repo.insert(&unit("cus-1", "svc-a", 400, day + Duration::days(1))).await.unwrap();

        let window = DateWindow {
            start: day,
            end: day + Duration::days(1) - Duration::milliseconds(1),
        };
        let records = repo.list_records(Some(&window)).await.unwrap();
        let totals: Vec<i64> = records.iter().map(|r| r.unit_final_price_cents).collect();

        assert_eq!(totals, vec![300, 200]);
    }

    #[tokio::test]
    async fn test_list_for_sale_and_delete_rows() {
        let db = seeded().await;
        let repo = db.sale_units();
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();

        let ids = repo
            .insert_batch(&[unit("cus-1", "svc-a", 100, date), unit("cus-1", "svc-a", 200, date)])
            .await
            .unwrap();
        repo.insert(&unit("cus-1", "svc-a", 999, date + Duration::seconds(1))).await.unwrap();

        let sale = repo.list_for_sale(date, "cus-1").await.unwrap();
        assert_eq!(sale.len(), 2);

        assert_eq!(repo.delete_rows(&ids).await.unwrap(), 2);
        assert_eq!(repo.delete_rows(&ids).await.unwrap(), 0);
        assert_eq!(repo.delete_rows(&[]).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
