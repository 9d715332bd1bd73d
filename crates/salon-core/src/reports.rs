//! # Reports
//!
//! Aggregations over stored unit rows: daily revenue, staff performance,
//! payment-method breakdown and best-selling services.
//!
//! ```text
//! DateRange::resolve(now) ──► DateWindow ──► (repository query) ──► SaleUnitRecord[]
//!                                                                       │
//!            ┌──────────────────┬──────────────────┬───────────────────┤
//!            ▼                  ▼                  ▼                   ▼
//!     daily_revenue()   staff_performance()  payment_breakdown()  best_selling_services()
//! ```
//!
//! Every unit row counts as one sale of its service. Days are UTC days.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMode, Percent, SaleUnitRecord};

// =============================================================================
// Date Ranges
// =============================================================================

/// Report period presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Last7Days,
    ThisMonth,
    /// From the first day of the month three months back.
    Last3Months,
    /// Both days inclusive.
    Custom {
        #[ts(as = "String")]
        start: NaiveDate,
        #[ts(as = "String")]
        end: NaiveDate,
    },
}

impl DateRange {
    pub fn label(&self) -> &'static str {
        match self {
            DateRange::Today => "Today",
            DateRange::Last7Days => "Last 7 Days",
            DateRange::ThisMonth => "This Month",
            DateRange::Last3Months => "Last 3 Months",
            DateRange::Custom { .. } => "Custom Range",
        }
    }

    /// Turns the preset into concrete bounds relative to `now`.
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use salon_core::reports::DateRange;
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 5, 20, 15, 0, 0).unwrap();
    /// let window = DateRange::Last3Months.resolve(now).unwrap();
    /// assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    /// assert_eq!(window.end, now);
    /// ```
    pub fn resolve(&self, now: DateTime<Utc>) -> CoreResult<DateWindow> {
        let today = now.date_naive();

        let window = match *self {
            DateRange::Today => DateWindow {
                start: start_of_day(today),
                end: end_of_day(today),
            },
            DateRange::Last7Days => DateWindow {
                start: now - Duration::days(7),
                end: now,
            },
            DateRange::ThisMonth => DateWindow {
                start: start_of_day(first_of_month(today.year(), today.month() as i32)),
                end: now,
            },
            DateRange::Last3Months => DateWindow {
                start: start_of_day(first_of_month(today.year(), today.month() as i32 - 3)),
                end: now,
            },
            DateRange::Custom { start, end } => {
                if end < start {
                    return Err(ValidationError::InvalidFormat {
                        field: "date range".to_string(),
                        reason: "end date is before start date".to_string(),
                    }
                    .into());
                }
                DateWindow {
                    start: start_of_day(start),
                    end: end_of_day(end),
                }
            }
        };

        Ok(window)
    }
}

/// Inclusive time bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateWindow {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_day(day) + Duration::days(1) - Duration::milliseconds(1)
}

/// First day of `month` (1-based, may be ≤ 0 to step into earlier years).
fn first_of_month(year: i32, month: i32) -> NaiveDate {
    let index = year * 12 + (month - 1);
    let (y, m) = (index.div_euclid(12), index.rem_euclid(12) as u32 + 1);
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(NaiveDate::MIN)
}

/// `total / count` rounded half-up; zero when `count` is zero.
fn average(total: Money, count: i64) -> Money {
    if count <= 0 {
        return Money::zero();
    }
    Money::from_cents((total.cents() * 2 + count).div_euclid(count * 2))
}

// =============================================================================
// Daily Revenue
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyRevenue {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub units: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    /// Days with at least one sale, oldest first.
    pub days: Vec<DailyRevenue>,
    pub total_revenue: Money,
    pub total_units: i64,
    /// Revenue per day that had sales.
    pub average_daily: Money,
}

pub fn daily_revenue(records: &[SaleUnitRecord]) -> SalesReport {
    let mut by_day: BTreeMap<NaiveDate, (i64, Money)> = BTreeMap::new();
    for record in records {
        let entry = by_day.entry(record.date.date_naive()).or_default();
        entry.0 += 1;
        entry.1 += record.total();
    }

    let days: Vec<DailyRevenue> = by_day
        .into_iter()
        .map(|(date, (units, revenue))| DailyRevenue { date, units, revenue })
        .collect();
    let total_revenue: Money = days.iter().map(|d| d.revenue).sum();
    let total_units = days.iter().map(|d| d.units).sum();

    SalesReport {
        average_daily: average(total_revenue, days.len() as i64),
        days,
        total_revenue,
        total_units,
    }
}

// =============================================================================
// Staff Performance
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RankBy {
    /// Number of units sold.
    Sales,
    #[default]
    Revenue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StaffPerformance {
    pub staff_id: String,
    pub staff_name: String,
    pub units_sold: i64,
    pub revenue: Money,
    pub average_per_unit: Money,
}

/// Per-staff totals, best first under `rank_by`.
pub fn staff_performance(records: &[SaleUnitRecord], rank_by: RankBy) -> Vec<StaffPerformance> {
    let mut by_staff: BTreeMap<&str, StaffPerformance> = BTreeMap::new();
    for record in records {
        let entry = by_staff
            .entry(record.staff_id.as_str())
            .or_insert_with(|| StaffPerformance {
                staff_id: record.staff_id.clone(),
                staff_name: record.staff_label().to_string(),
                units_sold: 0,
                revenue: Money::zero(),
                average_per_unit: Money::zero(),
            });
        entry.units_sold += 1;
        entry.revenue += record.total();
    }

    let mut rows: Vec<StaffPerformance> = by_staff
        .into_values()
        .map(|mut s| {
            s.average_per_unit = average(s.revenue, s.units_sold);
            s
        })
        .collect();

    rows.sort_by(|a, b| rank(rank_by, (a.units_sold, a.revenue), (b.units_sold, b.revenue)));
    rows
}

fn rank(by: RankBy, a: (i64, Money), b: (i64, Money)) -> std::cmp::Ordering {
    match by {
        RankBy::Sales => b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)),
        RankBy::Revenue => b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)),
    }
}

// =============================================================================
// Payment Breakdown
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentBreakdown {
    pub payment_mode: PaymentMode,
    pub count: i64,
    pub revenue: Money,
    /// Share of total revenue.
    pub share: Percent,
}

/// Revenue per payment mode, highest revenue first. Modes with no sales
/// are left out.
pub fn payment_breakdown(records: &[SaleUnitRecord]) -> Vec<PaymentBreakdown> {
    let mut by_mode: BTreeMap<PaymentMode, (i64, Money)> = BTreeMap::new();
    for record in records {
        let entry = by_mode.entry(record.payment_mode).or_default();
        entry.0 += 1;
        entry.1 += record.total();
    }

    let total: Money = by_mode.values().map(|(_, revenue)| *revenue).sum();

    let mut rows: Vec<PaymentBreakdown> = by_mode
        .into_iter()
        .map(|(payment_mode, (count, revenue))| PaymentBreakdown {
            payment_mode,
            count,
            revenue,
            share: share_of(revenue, total),
        })
        .collect();

    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.payment_mode.cmp(&b.payment_mode)));
    rows
}

fn share_of(part: Money, total: Money) -> Percent {
    if !total.is_positive() {
        return Percent::zero();
    }
    let bps = (part.cents() as i128 * 10_000 * 2 + total.cents() as i128) / (total.cents() as i128 * 2);
    Percent::from_bps(bps.clamp(0, 10_000) as u32)
}

// =============================================================================
// Best-Selling Services
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceSales {
    pub service_id: String,
    pub service_name: String,
    pub units_sold: i64,
    pub revenue: Money,
}

/// Per-service totals, best first under `rank_by`.
pub fn best_selling_services(records: &[SaleUnitRecord], rank_by: RankBy) -> Vec<ServiceSales> {
    let mut by_service: BTreeMap<&str, ServiceSales> = BTreeMap::new();
    for record in records {
        let entry = by_service
            .entry(record.service_id.as_str())
            .or_insert_with(|| ServiceSales {
                service_id: record.service_id.clone(),
                service_name: record.service_label().to_string(),
                units_sold: 0,
                revenue: Money::zero(),
            });
        entry.units_sold += 1;
        entry.revenue += record.total();
    }

    let mut rows: Vec<ServiceSales> = by_service.into_values().collect();
    rows.sort_by(|a, b| rank(rank_by, (a.units_sold, a.revenue), (b.units_sold, b.revenue)));
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, staff: &str, service: &str, mode: PaymentMode, cents: i64) -> SaleUnitRecord {
        SaleUnitRecord {
            id: format!("{day}-{staff}-{service}-{cents}"),
            customer_id: "c1".into(),
            customer_name: Some("Meera".into()),
            staff_id: staff.into(),
            staff_name: Some(staff.to_uppercase()),
            service_id: service.into(),
            service_name: Some(service.to_uppercase()),
            unit_final_price_cents: cents,
            discount_amount_cents: 0,
            payment_mode: mode,
            date: Utc.with_ymd_and_hms(2024, 5, day, 11, 0, 0).unwrap(),
        }
    }

    fn sample() -> Vec<SaleUnitRecord> {
        vec![
            record(1, "asha", "haircut", PaymentMode::Cash, 10_000),
            record(1, "asha", "haircut", PaymentMode::Cash, 10_000),
            record(1, "john", "facial", PaymentMode::Upi, 25_000),
            record(3, "john", "massage", PaymentMode::Card, 5_000),
            record(3, "asha", "massage", PaymentMode::Upi, 5_000),
        ]
    }

    #[test]
    fn test_ranges() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();

        let today = DateRange::Today.resolve(now).unwrap();
        assert_eq!(today.start, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
        assert!(today.contains(Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap()));
        assert!(!today.contains(Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap()));

        let week = DateRange::Last7Days.resolve(now).unwrap();
        assert_eq!(week.start, Utc.with_ymd_and_hms(2024, 1, 8, 9, 30, 0).unwrap());

        let month = DateRange::ThisMonth.resolve(now).unwrap();
        assert_eq!(month.start.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        // Crosses the year boundary
        let quarter = DateRange::Last3Months.resolve(now).unwrap();
        assert_eq!(quarter.start.date_naive(), NaiveDate::from_ymd_opt(2023, 10, 1).unwrap());
    }

    #[test]
    fn test_custom_range() {
        let now = Utc::now();
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();

        let window = DateRange::Custom { start, end }.resolve(now).unwrap();
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 5, 3, 23, 0, 0).unwrap()));

        assert!(DateRange::Custom { start: end, end: start }.resolve(now).is_err());
    }

    #[test]
    fn test_daily_revenue() {
        let report = daily_revenue(&sample());
        assert_eq!(report.days.len(), 2);
        assert_eq!(report.days[0].revenue.cents(), 45_000);
        assert_eq!(report.days[0].units, 3);
        assert_eq!(report.total_revenue.cents(), 55_000);
        assert_eq!(report.total_units, 5);
        assert_eq!(report.average_daily.cents(), 27_500);

        assert_eq!(daily_revenue(&[]), SalesReport::default());
    }

    #[test]
    fn test_staff_performance_ranking() {
        let by_revenue = staff_performance(&sample(), RankBy::Revenue);
        assert_eq!(by_revenue[0].staff_id, "john");
        assert_eq!(by_revenue[0].revenue.cents(), 30_000);
        assert_eq!(by_revenue[0].average_per_unit.cents(), 15_000);

        let by_sales = staff_performance(&sample(), RankBy::Sales);
        assert_eq!(by_sales[0].staff_id, "asha");
        assert_eq!(by_sales[0].units_sold, 3);
        assert_eq!(by_sales[0].staff_name, "ASHA");
    }

    #[test]
    fn test_payment_breakdown() {
        let rows = payment_breakdown(&sample());
        assert_eq!(rows[0].payment_mode, PaymentMode::Upi);
        assert_eq!(rows[0].revenue.cents(), 30_000);
        assert_eq!(rows[0].count, 2);

        let shares: u32 = rows.iter().map(|r| r.share.bps()).sum();
        assert!((9_999..=10_001).contains(&shares));
        assert_eq!(rows.len(), 3);
        assert!(payment_breakdown(&[]).is_empty());
    }

    #[test]
    fn test_best_selling_services() {
        let by_count = best_selling_services(&sample(), RankBy::Sales);
        // haircut and massage both sold twice; haircut has more revenue
        assert_eq!(by_count[0].service_id, "haircut");
        assert_eq!(by_count[1].service_id, "massage");

        let by_revenue = best_selling_services(&sample(), RankBy::Revenue);
        assert_eq!(by_revenue[0].service_id, "facial");
    }

    #[test]
    fn test_average_rounds_half_up() {
        assert_eq!(average(Money::from_cents(10), 4).cents(), 3);
        assert_eq!(average(Money::from_cents(10), 3).cents(), 3);
        assert_eq!(average(Money::from_cents(10), 0), Money::zero());
    }
}
