//! # Logical Sale Deletion
//!
//! A logical sale is every unit row sharing `(date, customer_id)`. It is
//! removed as one operation over its row ids, and only after the admin
//! authorization check passes.
//!
//! ```text
//!   cooldown active? ── yes ──────────────────────────────┐
//!        │ no                                             ▼
//!   passphrase given? ── no ──► PassphraseRequired   delete_rows(ids)
//!        │ yes                                            ▲
//!   verify(passphrase) ── ok (window reopens) ────────────┘
//!        └── err ──► InvalidPassphrase / NotConfigured   (no rows touched)
//! ```

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use salon_core::history::LogicalSale;

use crate::auth::AuthorizationPolicy;
use crate::error::{DeletionAuthError, ServiceResult};
use crate::store::SaleUnitStore;

/// Deletes every row of `sale`. Returns how many rows were removed.
pub async fn delete_logical_sale<S, A>(
    store: &S,
    auth: &A,
    sale: &LogicalSale,
    passphrase: Option<&str>,
    now: DateTime<Utc>,
) -> ServiceResult<u64>
where
    S: SaleUnitStore + ?Sized,
    A: AuthorizationPolicy + ?Sized,
{
    if !auth.is_authorized(now).await? {
        let passphrase = passphrase.ok_or(DeletionAuthError::PassphraseRequired)?;
        auth.verify(passphrase, now).await?;
    }

    let ids = sale.row_ids();
    let removed = store.delete_rows(&ids).await?;

    if removed as usize != ids.len() {
        warn!(
            expected = ids.len(),
            removed,
            customer_id = %sale.key.customer_id,
            "Some rows of the sale were already gone"
        );
    }
    info!(
        customer_id = %sale.key.customer_id,
        date = %sale.key.date.to_rfc3339(),
        removed,
        "Sale deleted"
    );

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PassphrasePolicy;
    use crate::error::ServiceError;
    use crate::store::memory::MemoryStore;
    use chrono::{Duration, TimeZone};
    use salon_core::auth::Cooldown;
    use salon_core::history::group_sales;
    use salon_core::{Money, NewSaleUnit, PaymentMode, SaleUnitRecord};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn unit(customer_id: &str, cents: i64) -> NewSaleUnit {
        NewSaleUnit {
            customer_id: customer_id.into(),
            staff_id: "stf-1".into(),
            service_id: "svc-a".into(),
            unit_final_price: Money::from_cents(cents),
            discount_amount: Money::zero(),
            payment_mode: PaymentMode::Cash,
            date: t(-3_600),
        }
    }

    fn record(id: &str, row: &NewSaleUnit) -> SaleUnitRecord {
        SaleUnitRecord {
            id: id.into(),
            customer_id: row.customer_id.clone(),
            customer_name: Some("Meera".into()),
            staff_id: row.staff_id.clone(),
            staff_name: Some("Asha".into()),
            service_id: row.service_id.clone(),
            service_name: Some("Haircut".into()),
            unit_final_price_cents: row.unit_final_price.cents(),
            discount_amount_cents: row.discount_amount.cents(),
            payment_mode: row.payment_mode,
            date: row.date,
        }
    }

    /// Two-unit sale for cus-1 plus an unrelated row for cus-2.
    async fn seeded() -> (MemoryStore, LogicalSale, PassphrasePolicy<MemoryStore>) {
        let store = MemoryStore::new();
        let mut records = Vec::new();
        for row in [unit("cus-1", 10_000), unit("cus-1", 10_000)] {
            let id = store.insert_row(row.clone()).await;
            records.push(record(&id, &row));
        }
        store.insert_row(unit("cus-2", 5_000)).await;

        let sale = group_sales(records).remove(0);
        let policy = PassphrasePolicy::new(MemoryStore::new(), Cooldown::from_secs(300));
        policy.set_passphrase("open sesame").await.unwrap();
        (store, sale, policy)
    }

    #[tokio::test]
    async fn test_passphrase_deletes_whole_group() {
        let (store, sale, policy) = seeded().await;

        let removed = delete_logical_sale(&store, &policy, &sale, Some("open sesame"), t(0))
            .await
            .unwrap();

        assert_eq!(removed, 2);
        let left = store.rows().await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].1.customer_id, "cus-2");
    }

    #[tokio::test]
    async fn test_missing_passphrase_touches_nothing() {
        let (store, sale, policy) = seeded().await;

        let err = delete_logical_sale(&store, &policy, &sale, None, t(0)).await.unwrap_err();

        assert!(matches!(err, ServiceError::Auth(DeletionAuthError::PassphraseRequired)));
        assert_eq!(store.rows().await.len(), 3);
    }

    #[tokio::test]
    async fn test_wrong_passphrase_touches_nothing() {
        let (store, sale, policy) = seeded().await;

        let err = delete_logical_sale(&store, &policy, &sale, Some("nope nope"), t(0))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Auth(DeletionAuthError::InvalidPassphrase)));
        assert_eq!(store.rows().await.len(), 3);
    }

    #[tokio::test]
    async fn test_cooldown_skips_prompt() {
        let (store, sale, policy) = seeded().await;
        policy.record_authorization(t(0)).await.unwrap();

        let removed = delete_logical_sale(&store, &policy, &sale, None, t(120)).await.unwrap();
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn test_expired_cooldown_prompts_again() {
        let (store, sale, policy) = seeded().await;
        policy.record_authorization(t(0)).await.unwrap();

        let err = delete_logical_sale(&store, &policy, &sale, None, t(300)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(DeletionAuthError::PassphraseRequired)));
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let (store, sale, policy) = seeded().await;
        store.fail_deletes().await;

        let err = delete_logical_sale(&store, &policy, &sale, Some("open sesame"), t(0))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Database(_)));
        assert_eq!(store.rows().await.len(), 3);
    }
}
