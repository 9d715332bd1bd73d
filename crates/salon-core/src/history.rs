//! # Sales History
//!
//! Regroups stored unit rows into logical sales, then filters, sorts and
//! exports them.
//!
//! ## Grouping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale_units (one row per unit)                                          │
//! │    r1  2024-03-09T14:05:00Z  cust-1  Haircut    ₹91.83                  │
//! │    r2  2024-03-09T14:05:00Z  cust-1  Haircut    ₹91.84                  │
//! │    r3  2024-03-09T14:05:00Z  cust-1  Massage    ₹41.33                  │
//! │    r4  2024-03-09T16:40:12Z  cust-2  Facial     ₹60.00                  │
//! │                       │                                                 │
//! │                       ▼  group_sales()  key = (date, customer_id)       │
//! │                                                                         │
//! │  LogicalSale #1  cust-1  rows [r1, r2, r3]  total ₹225.00               │
//! │  LogicalSale #2  cust-2  rows [r4]          total ₹60.00                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dates are compared and displayed in UTC.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMode, SaleUnitRecord};

/// Column headers of the history export.
pub const CSV_HEADER: [&str; 8] = [
    "Date", "Time", "Customer", "Service", "Staff", "Payment", "Discount", "Total",
];

// =============================================================================
// Logical Sale
// =============================================================================

/// Identity of a logical sale.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleKey {
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub customer_id: String,
}

/// Units of one service by one staff member within a logical sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryLine {
    pub service_id: String,
    pub service_name: String,
    pub staff_id: String,
    pub staff_name: String,
    pub quantity: i64,
    pub total: Money,
    pub discount: Money,
}

/// All unit rows of one checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LogicalSale {
    pub key: SaleKey,
    pub customer_name: String,
    pub payment_mode: PaymentMode,
    pub lines: Vec<HistoryLine>,
    pub total: Money,
    pub discount_total: Money,

    /// The unit rows, in the order they were read.
    pub units: Vec<SaleUnitRecord>,
}

impl LogicalSale {
    pub fn date(&self) -> DateTime<Utc> {
        self.key.date
    }

    /// Ids of every unit row in the sale; deleting the sale deletes these.
    pub fn row_ids(&self) -> Vec<String> {
        self.units.iter().map(|u| u.id.clone()).collect()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    fn matches_text(&self, needle: &str) -> bool {
        self.customer_name.to_lowercase().contains(needle)
            || self.lines.iter().any(|l| {
                l.service_name.to_lowercase().contains(needle)
                    || l.staff_name.to_lowercase().contains(needle)
            })
    }
}

/// Groups unit rows by `(date, customer_id)`.
///
/// Returned newest first. Within a sale, lines keep first-seen order.
pub fn group_sales(records: impl IntoIterator<Item = SaleUnitRecord>) -> Vec<LogicalSale> {
    let mut groups: BTreeMap<SaleKey, Vec<SaleUnitRecord>> = BTreeMap::new();
    for record in records {
        let key = SaleKey {
            date: record.date,
            customer_id: record.customer_id.clone(),
        };
        groups.entry(key).or_default().push(record);
    }

    groups
        .into_iter()
        .rev()
        .map(|(key, units)| build_sale(key, units))
        .collect()
}

fn build_sale(key: SaleKey, units: Vec<SaleUnitRecord>) -> LogicalSale {
    let mut lines: Vec<HistoryLine> = Vec::new();
    for unit in &units {
        match lines
            .iter_mut()
            .find(|l| l.service_id == unit.service_id && l.staff_id == unit.staff_id)
        {
            Some(line) => {
                line.quantity += 1;
                line.total += unit.total();
                line.discount += unit.discount();
            }
            None => lines.push(HistoryLine {
                service_id: unit.service_id.clone(),
                service_name: unit.service_label().to_string(),
                staff_id: unit.staff_id.clone(),
                staff_name: unit.staff_label().to_string(),
                quantity: 1,
                total: unit.total(),
                discount: unit.discount(),
            }),
        }
    }

    let customer_name = units
        .first()
        .map(|u| u.customer_label().to_string())
        .unwrap_or_else(|| SaleUnitRecord::UNKNOWN_CUSTOMER.to_string());
    let payment_mode = units.first().map(|u| u.payment_mode).unwrap_or_default();

    LogicalSale {
        key,
        customer_name,
        payment_mode,
        total: units.iter().map(SaleUnitRecord::total).sum(),
        discount_total: units.iter().map(SaleUnitRecord::discount).sum(),
        lines,
        units,
    }
}

// =============================================================================
// Filter & Sort
// =============================================================================

/// History view filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryFilter {
    /// Case-insensitive match on customer, service or staff name.
    pub search: Option<String>,

    /// Calendar day (UTC) of the sale.
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
}

impl HistoryFilter {
    pub fn matches(&self, sale: &LogicalSale) -> bool {
        if let Some(day) = self.date {
            if sale.date().date_naive() != day {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => sale.matches_text(&text.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply(&self, sales: Vec<LogicalSale>) -> Vec<LogicalSale> {
        sales.into_iter().filter(|s| self.matches(s)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum HistorySort {
    #[default]
    Date,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sorts in place. Ties fall back to date, then customer id.
pub fn sort_sales(sales: &mut [LogicalSale], by: HistorySort, order: SortOrder) {
    sales.sort_by(|a, b| {
        let ord = match by {
            HistorySort::Date => a.key.cmp(&b.key),
            HistorySort::Total => a.total.cmp(&b.total).then_with(|| a.key.cmp(&b.key)),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

/// Revenue of the given sales.
pub fn total_revenue(sales: &[LogicalSale]) -> Money {
    sales.iter().map(|s| s.total).sum()
}

// =============================================================================
// CSV Export
// =============================================================================

/// Writes one CSV row per unit row of the given sales.
///
/// Amounts are plain decimals without a currency symbol so spreadsheets
/// read them as numbers.
pub fn write_history_csv(sales: &[LogicalSale], writer: impl Write) -> CoreResult<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(CSV_HEADER)
        .map_err(|e| CoreError::Export(e.to_string()))?;

    for sale in sales {
        for unit in &sale.units {
            csv.write_record([
                unit.date.format("%Y-%m-%d").to_string(),
                unit.date.format("%H:%M:%S").to_string(),
                unit.customer_label().to_string(),
                unit.service_label().to_string(),
                unit.staff_label().to_string(),
                unit.payment_mode.label().to_string(),
                unit.discount().to_string(),
                unit.total().to_string(),
            ])
            .map_err(|e| CoreError::Export(e.to_string()))?;
        }
    }

    csv.flush().map_err(|e| CoreError::Export(e.to_string()))?;
    Ok(())
}

/// [`write_history_csv`] into a string.
pub fn history_csv(sales: &[LogicalSale]) -> CoreResult<String> {
    let mut buf = Vec::new();
    write_history_csv(sales, &mut buf)?;
    String::from_utf8(buf).map_err(|e| CoreError::Export(e.to_string()))
}

/// Suggested export file name, e.g. `sales-history-2024-03-09.csv`.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("sales-history-{}.csv", today.format("%Y-%m-%d"))
}

// =============================================================================
// Unit Tests
// =============================================================================
