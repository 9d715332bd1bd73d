//! # Sales Queries
//!
//! Read side of the POS: history, CSV export, reports and receipts. Rows
//! are loaded from SQLite and handed to the pure aggregations in
//! `salon_core::history` and `salon_core::reports`.
//!
//! ```text
//!   sale_units ──► list_records(window?) ──► group_sales ──► filter ──► sort ──► HistoryView
//!                                     │                                           │
//!                                     │                                           └─► CSV
//!                                     └─► daily_revenue · staff_performance ·
//!                                         payment_breakdown · best_selling_services
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use salon_core::history::{
    export_file_name, group_sales, sort_sales, total_revenue, history_csv, HistoryFilter, HistorySort,
    LogicalSale, SaleKey, SortOrder,
};
use salon_core::receipt::Receipt;
use salon_core::reports::{
    best_selling_services, daily_revenue, payment_breakdown, staff_performance, DateRange, DateWindow,
    PaymentBreakdown, RankBy, SalesReport, ServiceSales, StaffPerformance,
};
use salon_core::{CompletedSaleSummary, CoreError, Money};
use salon_db::Database;

use crate::config::SalonConfig;
use crate::error::ServiceResult;

// =============================================================================
// History
// =============================================================================

/// What the history screen asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub filter: HistoryFilter,
    #[serde(default)]
    pub sort: HistorySort,
    #[serde(default)]
    pub order: SortOrder,
}

/// Filtered, sorted logical sales plus their combined revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    pub sales: Vec<LogicalSale>,
    pub total_revenue: Money,
}

/// All four report aggregations over one resolved window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportBundle {
    pub range: DateRange,
    pub window: DateWindow,
    pub sales: SalesReport,
    pub staff: Vec<StaffPerformance>,
    pub payments: Vec<PaymentBreakdown>,
    pub services: Vec<ServiceSales>,
}

#[derive(Debug, Clone)]
pub struct SalesQueries {
    db: Database,
}

impl SalesQueries {
    pub fn new(db: Database) -> Self {
        SalesQueries { db }
    }

    pub async fn history(&self, query: &HistoryQuery) -> ServiceResult<HistoryView> {
        let records = self.db.sale_units().list_records(None).await?;
        let mut sales = query.filter.apply(group_sales(records));
        sort_sales(&mut sales, query.sort, query.order);

        debug!(sales = sales.len(), sort = ?query.sort, order = ?query.order, "History loaded");
        Ok(HistoryView {
            total_revenue: total_revenue(&sales),
            sales,
        })
    }

    /// Loads one logical sale by its key, `None` when no rows remain.
    pub async fn find_sale(&self, key: &SaleKey) -> ServiceResult<Option<LogicalSale>> {
        let records = self
            .db
            .sale_units()
            .list_for_sale(key.date, &key.customer_id)
            .await?;

        Ok(group_sales(records).into_iter().next())
    }

    /// Writes the filtered history as CSV into `dir` and returns the path.
    pub async fn export_history(
        &self,
        query: &HistoryQuery,
        dir: &Path,
        now: DateTime<Utc>,
    ) -> ServiceResult<PathBuf> {
        let view = self.history(query).await?;
        let path = dir.join(export_file_name(now.date_naive()));

        let contents = history_csv(&view.sales)?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| CoreError::Export(format!("{}: {e}", path.display())))?;

        info!(path = %path.display(), sales = view.sales.len(), "History exported");
        Ok(path)
    }

    pub async fn reports(&self, range: DateRange, rank_by: RankBy, now: DateTime<Utc>) -> ServiceResult<ReportBundle> {
        let window = range.resolve(now)?;
        let records = self.db.sale_units().list_records(Some(&window)).await?;

        debug!(range = range.label(), rows = records.len(), "Building reports");
        Ok(ReportBundle {
            range,
            window,
            sales: daily_revenue(&records),
            staff: staff_performance(&records, rank_by),
            payments: payment_breakdown(&records),
            services: best_selling_services(&records, rank_by),
        })
    }
}

// =============================================================================
// Receipts
// =============================================================================

/// Renders the plain-text receipt for a completed sale with the store
/// header, currency and width from `config`.
pub fn render_receipt(summary: &CompletedSaleSummary, config: &SalonConfig) -> String {
    let receipt = Receipt::from_summary(summary, &config.store_info());
    config.receipt_renderer().render(&receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{checkout, CheckoutOptions};
    use crate::error::ServiceError;
    use chrono::TimeZone;
    use salon_core::{Cart, Customer, Discount, PaymentMode, Service, Staff};
    use salon_db::DbConfig;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    struct Fixture {
        db: Database,
        queries: SalesQueries,
    }

    /// Meera: 2 × Haircut on the 8th (card). Ravi: 1 × Hair Spa on the 9th.
    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = at(1, 9);
        let haircut = Service { id: "svc-a".into(), name: "Haircut".into(), price_cents: 10_000, created_at: now };
        let spa = Service { id: "svc-b".into(), name: "Hair Spa".into(), price_cents: 30_000, created_at: now };
        let asha = Staff { id: "stf-1".into(), name: "Asha".into(), created_at: now };
        let meera = Customer { id: "cus-1".into(), name: "Meera".into(), contact: None, created_at: now };
        let ravi = Customer { id: "cus-2".into(), name: "Ravi".into(), contact: None, created_at: now };
        for s in [&haircut, &spa] {
            db.services().insert(s).await.unwrap();
        }
        db.staff().insert(&asha).await.unwrap();
        db.customers().insert(&meera).await.unwrap();
        db.customers().insert(&ravi).await.unwrap();

        let mut cart = Cart::new();
        cart.select_customer(meera);
        cart.set_payment_mode(PaymentMode::Card);
        cart.add_service(&haircut, 2).unwrap();
        cart.assign_staff("svc-a", &asha).unwrap();
        checkout(&db, &mut cart, at(8, 10), CheckoutOptions::default()).await.unwrap();

        cart.select_customer(ravi);
        cart.add_service(&spa, 1).unwrap();
        cart.assign_staff("svc-b", &asha).unwrap();
        checkout(&db, &mut cart, at(9, 15), CheckoutOptions::default()).await.unwrap();

        Fixture {
            queries: SalesQueries::new(db.clone()),
            db,
        }
    }

    #[tokio::test]
    async fn test_history_groups_and_sorts() {
        let f = fixture().await;

        let view = f.queries.history(&HistoryQuery::default()).await.unwrap();
        assert_eq!(view.sales.len(), 2);
        assert_eq!(view.sales[0].customer_name, "Ravi");
        assert_eq!(view.total_revenue.cents(), 50_000);

        let by_total_asc = HistoryQuery {
            sort: HistorySort::Total,
            order: SortOrder::Asc,
            ..Default::default()
        };
        let view = f.queries.history(&by_total_asc).await.unwrap();
        assert_eq!(view.sales[0].total.cents(), 20_000);
    }

    #[tokio::test]
    async fn test_history_filter_narrows_revenue() {
        let f = fixture().await;
        let query = HistoryQuery {
            filter: HistoryFilter {
                search: Some("spa".into()),
                date: None,
            },
            ..Default::default()
        };

        let view = f.queries.history(&query).await.unwrap();
        assert_eq!(view.sales.len(), 1);
        assert_eq!(view.total_revenue.cents(), 30_000);
    }

    #[tokio::test]
    async fn test_find_sale_by_key() {
        let f = fixture().await;
        let key = SaleKey {
            date: at(8, 10),
            customer_id: "cus-1".into(),
        };

        let sale = f.queries.find_sale(&key).await.unwrap().unwrap();
        assert_eq!(sale.unit_count(), 2);
        assert_eq!(sale.payment_mode, PaymentMode::Card);

        f.db.sale_units().delete_rows(&sale.row_ids()).await.unwrap();
        assert!(f.queries.find_sale(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reports_respect_window() {
        let f = fixture().await;
        let range = DateRange::Custom {
            start: at(9, 0).date_naive(),
            end: at(9, 0).date_naive(),
        };

        let bundle = f.queries.reports(range, RankBy::Revenue, at(20, 0)).await.unwrap();

        assert_eq!(bundle.sales.total_units, 1);
        assert_eq!(bundle.sales.total_revenue.cents(), 30_000);
        assert_eq!(bundle.services[0].service_name, "Hair Spa");
        assert_eq!(bundle.payments[0].payment_mode, PaymentMode::Cash);
        assert_eq!(bundle.staff[0].units_sold, 1);
    }

    #[tokio::test]
    async fn test_reports_reject_inverted_range() {
        let f = fixture().await;
        let range = DateRange::Custom {
            start: at(9, 0).date_naive(),
            end: at(8, 0).date_naive(),
        };

        assert!(f.queries.reports(range, RankBy::Sales, at(20, 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_export_writes_one_row_per_unit() {
        let f = fixture().await;
        let dir = std::env::temp_dir().join(format!("salon-export-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = f
            .queries
            .export_history(&HistoryQuery::default(), &dir, at(9, 18))
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(path.ends_with("sales-history-2024-03-09.csv"));
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("Date,Time,Customer,Service,Staff,Payment,Discount,Total"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_export_matches_history_and_reports_bad_dir() {
        let f = fixture().await;
        let dir = std::env::temp_dir().join(format!("salon-export-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let query = HistoryQuery::default();

        let path = f.queries.export_history(&query, &dir, at(9, 18)).await.unwrap();
        let view = f.queries.history(&query).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), history_csv(&view.sales).unwrap());
        std::fs::remove_dir_all(&dir).unwrap();

        let err = f
            .queries
            .export_history(&query, &dir.join("missing"), at(9, 18))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Export(_))));
    }

    #[tokio::test]
    async fn test_receipt_uses_configured_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = at(9, 12);
        let mut cart = Cart::new();
        cart.select_customer(Customer { id: "cus-1".into(), name: "Meera".into(), contact: None, created_at: now });
        cart.add_service(
            &Service { id: "svc-a".into(), name: "Haircut".into(), price_cents: 10_000, created_at: now },
            1,
        )
        .unwrap();
        cart.assign_staff("svc-a", &Staff { id: "stf-1".into(), name: "Asha".into(), created_at: now })
            .unwrap();
        cart.set_overall_discount(Discount::Amount(Money::from_cents(1_000)));
        let summary = checkout(&db, &mut cart, now, CheckoutOptions::default()).await.unwrap();

        let mut config = SalonConfig::default();
        config.store.name = "Glow Studio".into();

        let first = render_receipt(&summary, &config);
        assert!(first.contains("Glow Studio"));
        assert!(first.contains("90.00"));
        assert_eq!(first, render_receipt(&summary, &config));
    }
}
