//! # Checkout
//!
//! Turns a ready cart into persisted unit rows.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Checkout                                       │
//! │                                                                         │
//! │  Cart ──► plan_settlement(cart, now)   (pure; fails before any write)  │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │           UnitOfWork::commit(plan)                                      │
//! │                 │                                                       │
//! │     store.supports_atomic_batch() && prefer_atomic?                     │
//! │          │ yes                               │ no                       │
//! │          ▼                                   ▼                          │
//! │   write_batch(rows)                   write(row) for each row           │
//! │   retried as a whole                  each row retried on its own       │
//! │   all-or-nothing                      failure after k rows ──►          │
//! │                                       PartiallyPersisted{k ids, index}  │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │     CompletedSaleSummary (row ids attached), cart.reset()              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Retries only happen for transient store errors (locked/busy database,
//! pool timeout). Constraint failures are reported immediately.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use salon_core::settlement::{plan_settlement, SettlementPlan};
use salon_core::{Cart, CompletedSaleSummary};
use salon_db::{DbError, DbResult};

use crate::error::CheckoutError;
use crate::store::SaleUnitStore;

// =============================================================================
// Retry Policy
// =============================================================================

/// Exponential backoff bounds for store writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. 0 disables retrying.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        RetryPolicy {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None, // Bounded by max_retries instead
            ..Default::default()
        }
    }

    /// Runs `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> DbResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        let mut backoff = self.create_backoff();
        let mut attempt: u32 = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff.next_backoff().unwrap_or(self.max_backoff);
                    warn!(
                        what = %what,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient write failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// Writes one settlement plan to a store.
///
/// ## Usage
/// ```rust,ignore
/// let plan = plan_settlement(&cart, Utc::now())?;
/// let summary = UnitOfWork::new(&db, config.retry_policy()).commit(plan).await?;
/// ```
pub struct UnitOfWork<'a, S: SaleUnitStore + ?Sized> {
    store: &'a S,
    retry: RetryPolicy,
    prefer_atomic: bool,
}

impl<'a, S: SaleUnitStore + ?Sized> UnitOfWork<'a, S> {
    pub fn new(store: &'a S, retry: RetryPolicy) -> Self {
        UnitOfWork {
            store,
            retry,
            prefer_atomic: true,
        }
    }

    /// Disables the atomic batch path even when the store offers one.
    pub fn prefer_atomic(mut self, prefer: bool) -> Self {
        self.prefer_atomic = prefer;
        self
    }

    /// Persists every row of the plan and returns the completed summary.
    pub async fn commit(&self, plan: SettlementPlan) -> Result<CompletedSaleSummary, CheckoutError> {
        let total_rows = plan.rows.len();
        let atomic = self.prefer_atomic && self.store.supports_atomic_batch();

        info!(
            rows = total_rows,
            grand_total = plan.grand_total().cents(),
            atomic,
            "Committing sale"
        );

        let row_ids = if atomic {
            self.write_atomic(&plan).await?
        } else {
            self.write_sequential(&plan).await?
        };

        info!(rows = row_ids.len(), "Sale committed");
        Ok(plan.complete(row_ids))
    }

    async fn write_atomic(&self, plan: &SettlementPlan) -> Result<Vec<String>, CheckoutError> {
        self.retry
            .run("sale batch", || self.store.write_batch(&plan.rows))
            .await
            .map_err(|source| {
                error!(error = %source, "Atomic sale write failed, nothing persisted");
                CheckoutError::WriteFailed { source }
            })
    }

    async fn write_sequential(&self, plan: &SettlementPlan) -> Result<Vec<String>, CheckoutError> {
        let total_rows = plan.rows.len();
        let mut written = Vec::with_capacity(total_rows);

        for (index, row) in plan.rows.iter().enumerate() {
            match self.retry.run("sale unit", || self.store.write(row)).await {
                Ok(id) => {
                    debug!(index, id = %id, service_id = %row.service_id, "Sale unit written");
                    written.push(id);
                }
                Err(source) => return Err(partial_failure(written, index, total_rows, source)),
            }
        }

        Ok(written)
    }
}

fn partial_failure(
    written_ids: Vec<String>,
    failed_index: usize,
    total_rows: usize,
    source: DbError,
) -> CheckoutError {
    if written_ids.is_empty() {
        error!(error = %source, "Sale write failed, nothing persisted");
        return CheckoutError::WriteFailed { source };
    }

    error!(
        written = written_ids.len(),
        failed_index,
        total_rows,
        error = %source,
        "Sale partially persisted"
    );
    CheckoutError::PartiallyPersisted {
        written_ids,
        failed_index,
        total_rows,
        source,
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Checkout options taken from [`crate::config::CheckoutSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutOptions {
    pub retry: RetryPolicy,
    pub prefer_atomic: bool,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        CheckoutOptions {
            retry: RetryPolicy::default(),
            prefer_atomic: true,
        }
    }
}

/// Finalizes the cart.
///
/// On success the cart is reset for the next sale and the summary (with
/// the written row ids) is returned. On any error the cart is left as it
/// was so the desk can fix the problem or inspect a partial write.
pub async fn checkout<S: SaleUnitStore + ?Sized>(
    store: &S,
    cart: &mut Cart,
    now: DateTime<Utc>,
    options: CheckoutOptions,
) -> Result<CompletedSaleSummary, CheckoutError> {
    debug!(lines = cart.line_count(), units = cart.total_quantity(), "Checkout requested");

    let plan = plan_settlement(cart, now).map_err(|e| {
        warn!(error = %e, "Checkout rejected before writing");
        CheckoutError::from(e)
    })?;

    let summary = UnitOfWork::new(store, options.retry)
        .prefer_atomic(options.prefer_atomic)
        .commit(plan)
        .await?;

    cart.reset();
    Ok(summary)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use salon_core::{Customer, Discount, Money, Percent, Service, Staff, ValidationError};
    use salon_db::{Database, DbConfig};

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    fn options(max_retries: u32, prefer_atomic: bool) -> CheckoutOptions {
        CheckoutOptions {
            retry: fast_retry(max_retries),
            prefer_atomic,
        }
    }

    /// Haircut 100.00 × 2, Head Massage 50.00 × 1 at 10% off, overall 20.00 off.
    fn scenario_cart() -> Cart {
        let now = Utc::now();
        let haircut = Service { id: "svc-a".into(), name: "Haircut".into(), price_cents: 10_000, created_at: now };
        let massage = Service { id: "svc-b".into(), name: "Head Massage".into(), price_cents: 5_000, created_at: now };
        let asha = Staff { id: "stf-1".into(), name: "Asha".into(), created_at: now };

        let mut cart = Cart::new();
        cart.select_customer(Customer { id: "cus-1".into(), name: "Meera".into(), contact: None, created_at: now });
        cart.add_service(&haircut, 2).unwrap();
        cart.add_service(&massage, 1).unwrap();
        cart.assign_staff("svc-a", &asha).unwrap();
        cart.assign_staff("svc-b", &asha).unwrap();
        cart.set_line_discount("svc-b", Discount::Percentage(Percent::from_bps(1_000))).unwrap();
        cart.set_overall_discount(Discount::Amount(Money::from_cents(2_000)));
        cart
    }

    #[tokio::test]
    async fn test_sequential_checkout_persists_displayed_total() {
        let store = MemoryStore::new();
        let mut cart = scenario_cart();
        let preview = cart.price().unwrap().grand_total;

        let summary = checkout(&store, &mut cart, Utc::now(), options(0, true)).await.unwrap();

        let rows = store.rows().await;
        let persisted: Money = rows.iter().map(|(_, r)| r.unit_final_price).sum();
        assert_eq!(rows.len(), 3);
        assert_eq!(persisted, preview);
        assert_eq!(summary.grand_total.cents(), 22_500);
        assert_eq!(summary.row_ids.len(), 3);
        assert!(cart.is_empty());
        assert_eq!(cart.overall_discount, Discount::NONE);
    }

    #[tokio::test]
    async fn test_rows_share_date_and_customer() {
        let store = MemoryStore::new();
        let mut cart = scenario_cart();
        let now = Utc::now();

        checkout(&store, &mut cart, now, options(0, true)).await.unwrap();

        let rows = store.rows().await;
        assert!(rows.iter().all(|(_, r)| r.date == now && r.customer_id == "cus-1"));
    }

    #[tokio::test]
    async fn test_atomic_checkout_uses_one_batch() {
        let store = MemoryStore::atomic();
        let mut cart = scenario_cart();

        let summary = checkout(&store, &mut cart, Utc::now(), options(0, true)).await.unwrap();

        assert_eq!(store.write_calls().await, 1);
        assert_eq!(summary.row_ids.len(), 3);
    }

    #[tokio::test]
    async fn test_atomic_store_can_be_declined() {
        let store = MemoryStore::atomic();
        let mut cart = scenario_cart();

        checkout(&store, &mut cart, Utc::now(), options(0, false)).await.unwrap();

        assert_eq!(store.write_calls().await, 3);
    }

    #[tokio::test]
    async fn test_precondition_failures_write_nothing() {
        let store = MemoryStore::new();

        let mut empty = Cart::new();
        let err = checkout(&store, &mut empty, Utc::now(), options(0, true)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(ValidationError::EmptyCart)));

        let mut no_customer = scenario_cart();
        no_customer.clear_customer();
        let err = checkout(&store, &mut no_customer, Utc::now(), options(0, true)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(ValidationError::MissingCustomer)));
        assert!(!no_customer.is_empty());

        let mut no_staff = scenario_cart();
        no_staff.lines[1].staff_id = None;
        let err = checkout(&store, &mut no_staff, Utc::now(), options(0, true)).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::MissingStaff { line: 2, .. })
        ));

        assert_eq!(store.write_calls().await, 0);
        assert!(store.rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let store = MemoryStore::new();
        store.fail_transiently(2).await;
        let mut cart = scenario_cart();

        let summary = checkout(&store, &mut cart, Utc::now(), options(3, true)).await.unwrap();

        assert_eq!(summary.row_ids.len(), 3);
        assert_eq!(store.write_calls().await, 5);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let store = MemoryStore::new();
        store.fail_transiently(10).await;
        let mut cart = scenario_cart();

        let err = checkout(&store, &mut cart, Utc::now(), options(2, true)).await.unwrap_err();

        assert!(matches!(err, CheckoutError::WriteFailed { .. }));
        assert!(err.nothing_written());
        assert_eq!(store.write_calls().await, 3);
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_reports_written_rows() {
        let store = MemoryStore::new();
        store.fail_row(2).await;
        let mut cart = scenario_cart();

        let err = checkout(&store, &mut cart, Utc::now(), options(3, true)).await.unwrap_err();

        match err {
            CheckoutError::PartiallyPersisted {
                written_ids,
                failed_index,
                total_rows,
                ..
            } => {
                assert_eq!(written_ids.len(), 2);
                assert_eq!(failed_index, 2);
                assert_eq!(total_rows, 3);
                let stored: Vec<String> = store.rows().await.into_iter().map(|(id, _)| id).collect();
                assert_eq!(stored, written_ids);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
        // Permanent errors are not retried
        assert_eq!(store.write_calls().await, 3);
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_atomic_failure_writes_nothing() {
        let store = MemoryStore::atomic();
        store.fail_row(1).await;
        let mut cart = scenario_cart();

        let err = checkout(&store, &mut cart, Utc::now(), options(3, true)).await.unwrap_err();

        assert!(matches!(err, CheckoutError::WriteFailed { .. }));
        assert!(store.rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_against_sqlite() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut cart = scenario_cart();

        let summary = checkout(&db, &mut cart, Utc::now(), CheckoutOptions::default()).await.unwrap();

        let records = db.sale_units().list_records(None).await.unwrap();
        let total: i64 = records.iter().map(|r| r.unit_final_price_cents).sum();
        assert_eq!(records.len(), 3);
        assert_eq!(total, summary.grand_total.cents());
    }
}
