//! # Domain Types
//!
//! Core domain types used throughout Salon POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │     Staff       │   │    Service      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  name           │   │  name           │       │
//! │  │  contact        │   │                 │   │  price_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Percent      │   │  PaymentMode    │   │   SaleUnit      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Cash  Card     │   │  one row per    │       │
//! │  │  1000 = 10%     │   │  Upi   Other    │   │  unit sold      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Row Per Unit
//! A checkout of "Haircut × 2" writes two `SaleUnit` rows. All rows of one
//! checkout share the same `date` and `customer_id`; that pair is what the
//! history view uses to regroup them into one logical sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Percent
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01% = 1/10000, so `Percent::from_bps(1000)` is 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// 100%.
    pub const FULL: Percent = Percent(10_000);

    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from a human-entered value such as `12.5`.
    ///
    /// Negative and non-finite input becomes 0%. No upper clamp is applied
    /// here; range checks belong to the discount that uses it.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return Percent(0);
        }
        Percent((pct * 100.0).round().min(u32::MAX as f64) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Clamps into `[0%, 100%]`.
    #[inline]
    pub const fn clamped(&self) -> Self {
        if self.0 > Self::FULL.0 {
            Self::FULL
        } else {
            *self
        }
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

// =============================================================================
// Catalog Entities
// =============================================================================

/// A salon customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the sale flow and on receipts.
    pub name: String,

    /// Phone number or email, free-form.
    pub contact: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A stylist or other staff member who performs services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A service offered by the salon (haircut, facial, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub name: String,

    /// Catalog price in minor units. Copied into the cart when added, so
    /// later catalog edits never touch an in-progress sale.
    pub price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Service {
    /// Returns the catalog price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

/// How the customer paid. One value per sale, copied onto every unit row.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Card,
    Upi,
    Other,
}

impl PaymentMode {
    /// All modes in display order.
    pub const ALL: [PaymentMode; 4] = [
        PaymentMode::Cash,
        PaymentMode::Card,
        PaymentMode::Upi,
        PaymentMode::Other,
    ];

    /// Storage / wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Card => "card",
            PaymentMode::Upi => "upi",
            PaymentMode::Other => "other",
        }
    }

    /// Label printed on receipts.
    pub const fn label(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Card => "Card",
            PaymentMode::Upi => "UPI",
            PaymentMode::Other => "Other",
        }
    }
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "card" => Ok(PaymentMode::Card),
            "upi" => Ok(PaymentMode::Upi),
            "other" => Ok(PaymentMode::Other),
            _ => Err(ValidationError::NotAllowed {
                field: "payment mode".to_string(),
                allowed: PaymentMode::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Sale Units
// =============================================================================

/// A unit row built by the settlement planner, not yet written.
///
/// The store assigns the row id on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleUnit {
    pub customer_id: String,
    pub staff_id: String,
    pub service_id: String,

    /// Discounted unit price minus this unit's share of the overall discount.
    pub unit_final_price: Money,

    /// Line-level discount per unit plus this unit's overall share.
    /// Audit only; never used to recompute `unit_final_price`.
    pub discount_amount: Money,

    pub payment_mode: PaymentMode,

    /// Checkout timestamp, identical for every unit of the same sale.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

/// A persisted unit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleUnit {
    pub id: String,
    pub customer_id: String,
    pub staff_id: String,
    pub service_id: String,
    pub unit_final_price_cents: i64,
    pub discount_amount_cents: i64,
    pub payment_mode: PaymentMode,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleUnit {
    /// Returns the final unit price as Money.
    #[inline]
    pub fn unit_final_price(&self) -> Money {
        Money::from_cents(self.unit_final_price_cents)
    }

    /// Returns the recorded discount as Money.
    #[inline]
    pub fn discount_amount(&self) -> Money {
        Money::from_cents(self.discount_amount_cents)
    }
}

/// A unit row joined with customer, staff and service names.
///
/// This is the read model behind sales history and reports. Names are
/// optional because the referenced entity may have been deleted since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleUnitRecord {
    pub id: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub staff_id: String,
    pub staff_name: Option<String>,
    pub service_id: String,
    pub service_name: Option<String>,
    pub unit_final_price_cents: i64,
    pub discount_amount_cents: i64,
    pub payment_mode: PaymentMode,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

impl SaleUnitRecord {
    pub const UNKNOWN_CUSTOMER: &'static str = "Unknown Customer";
    pub const UNKNOWN_STAFF: &'static str = "Unknown Staff";
    pub const UNKNOWN_SERVICE: &'static str = "Unknown Service";

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.unit_final_price_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_amount_cents)
    }

    pub fn customer_label(&self) -> &str {
        self.customer_name.as_deref().unwrap_or(Self::UNKNOWN_CUSTOMER)
    }

    pub fn staff_label(&self) -> &str {
        self.staff_name.as_deref().unwrap_or(Self::UNKNOWN_STAFF)
    }

    pub fn service_label(&self) -> &str {
        self.service_name.as_deref().unwrap_or(Self::UNKNOWN_SERVICE)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_from_percentage() {
        assert_eq!(Percent::from_percentage(12.5).bps(), 1250);
        assert_eq!(Percent::from_percentage(-3.0).bps(), 0);
        assert_eq!(Percent::from_percentage(f64::NAN).bps(), 0);
        assert!((Percent::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_percent_clamped() {
        assert_eq!(Percent::from_bps(15_000).clamped(), Percent::FULL);
        assert_eq!(Percent::from_bps(2_500).clamped().bps(), 2_500);
    }

    #[test]
    fn test_percent_display() {
        assert_eq!(Percent::from_bps(1000).to_string(), "10%");
        assert_eq!(Percent::from_bps(1250).to_string(), "12.50%");
    }

    #[test]
    fn test_payment_mode_parse() {
        assert_eq!("UPI".parse::<PaymentMode>().unwrap(), PaymentMode::Upi);
        assert_eq!(" card ".parse::<PaymentMode>().unwrap(), PaymentMode::Card);
        assert!("cheque".parse::<PaymentMode>().is_err());
        assert_eq!(PaymentMode::default(), PaymentMode::Cash);
    }

    #[test]
    fn test_payment_mode_serde() {
        let json = serde_json::to_string(&PaymentMode::Upi).unwrap();
        assert_eq!(json, "\"upi\"");
    }

    #[test]
    fn test_record_labels_fall_back() {
        let record = SaleUnitRecord {
            id: "r1".into(),
            customer_id: "c1".into(),
            customer_name: None,
            staff_id: "s1".into(),
            staff_name: Some("Asha".into()),
            service_id: "v1".into(),
            service_name: None,
            unit_final_price_cents: 100,
            discount_amount_cents: 0,
            payment_mode: PaymentMode::Cash,
            date: Utc::now(),
        };
        assert_eq!(record.customer_label(), "Unknown Customer");
        assert_eq!(record.staff_label(), "Asha");
        assert_eq!(record.service_label(), "Unknown Service");
    }
}
