//! # Settlement Planning
//!
//! Checks the checkout preconditions and expands a priced cart into one
//! [`NewSaleUnit`] row per unit of quantity. Nothing here touches storage;
//! the checkout service in `salon-service` writes the plan.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart ──► plan_settlement(cart, now)                                    │
//! │             │                                                           │
//! │             ├── empty cart?        → ValidationError::EmptyCart         │
//! │             ├── no customer?       → ValidationError::MissingCustomer   │
//! │             ├── line without staff → ValidationError::MissingStaff      │
//! │             │                                                           │
//! │             ▼                                                           │
//! │        price_cart() ──► PricedCart                                      │
//! │             │                                                           │
//! │             ▼                                                           │
//! │        SettlementPlan { rows: Vec<NewSaleUnit>, summary }               │
//! │             │                                                           │
//! │             ▼  (after every row is stored)                              │
//! │        CompletedSaleSummary ──► receipt                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every row of one plan shares the same `date`, `customer_id` and
//! `payment_mode`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::PricedCart;
use crate::types::{NewSaleUnit, PaymentMode};

// =============================================================================
// Summary Types
// =============================================================================

/// One line as it was sold, with the numbers printed on the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SoldLine {
    pub service_id: String,
    pub service_name: String,
    pub staff_id: String,
    pub staff_name: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,

    /// Unit price after the line discount.
    pub discounted_unit_price: Money,

    /// Total line-level discount over all units.
    pub line_discount: Money,

    /// `discounted_unit_price × quantity`
    pub line_total: Money,

    /// This line's part of the overall discount.
    pub overall_share: Money,
}

/// The totals of a completed sale, as persisted.
///
/// Built from the same [`PricedCart`] that produced the unit rows, so the
/// receipt never re-derives a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompletedSaleSummary {
    pub customer_id: String,
    pub customer_name: String,
    pub lines: Vec<SoldLine>,
    pub subtotal: Money,
    pub line_discount_total: Money,
    pub overall_discount: Money,
    pub grand_total: Money,
    pub payment_mode: PaymentMode,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,

    /// Ids of the stored unit rows, in row order. Empty until written.
    pub row_ids: Vec<String>,
}

impl CompletedSaleSummary {
    /// line discounts + overall discount
    pub fn total_discount(&self) -> Money {
        self.line_discount_total + self.overall_discount
    }

    /// Number of units sold.
    pub fn unit_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Settlement Plan
// =============================================================================

/// Rows to write plus the summary they add up to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub rows: Vec<NewSaleUnit>,
    pub priced: PricedCart,
    summary: CompletedSaleSummary,
}

impl SettlementPlan {
    /// Σ `unit_final_price` over the planned rows.
    pub fn rows_total(&self) -> Money {
        self.rows.iter().map(|r| r.unit_final_price).sum()
    }

    pub fn grand_total(&self) -> Money {
        self.priced.grand_total
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.summary.date
    }

    /// Finishes the plan once every row is stored.
    pub fn complete(self, row_ids: Vec<String>) -> CompletedSaleSummary {
        CompletedSaleSummary {
            row_ids,
            ..self.summary
        }
    }
}

/// Validates the checkout preconditions and builds the rows to write.
///
/// ## Errors
/// - `ValidationError::EmptyCart`
/// - `ValidationError::MissingCustomer`
/// - `ValidationError::MissingStaff { line, .. }` with the 1-based line number
/// - `CoreError::DiscountRange` for a discount that bypassed clamping
///
/// On error no row exists yet, so nothing needs undoing.
pub fn plan_settlement(cart: &Cart, date: DateTime<Utc>) -> CoreResult<SettlementPlan> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart.into());
    }

    let customer = cart.customer.as_ref().ok_or(ValidationError::MissingCustomer)?;

    let mut staff_ids = Vec::with_capacity(cart.lines.len());
    for (index, line) in cart.lines.iter().enumerate() {
        let staff_id = line.staff_id.clone().ok_or_else(|| ValidationError::MissingStaff {
            line: index + 1,
            service_name: line.service_name.clone(),
        })?;
        staff_ids.push(staff_id);
    }

    let priced = cart.price()?;

    let mut rows = Vec::with_capacity(priced.unit_count());
    let mut sold = Vec::with_capacity(priced.lines.len());

    for (priced_line, staff_id) in priced.lines.iter().zip(staff_ids) {
        for unit in 0..priced_line.unit_shares.len() {
            rows.push(NewSaleUnit {
                customer_id: customer.id.clone(),
                staff_id: staff_id.clone(),
                service_id: priced_line.line.service_id.clone(),
                unit_final_price: priced_line.unit_final_price(unit),
                discount_amount: priced_line.unit_discount_amount(unit),
                payment_mode: cart.payment_mode,
                date,
            });
        }

        sold.push(SoldLine {
            service_id: priced_line.line.service_id.clone(),
            service_name: priced_line.line.service_name.clone(),
            staff_id,
            staff_name: priced_line.line.staff_name.clone(),
            unit_price: priced_line.line.unit_price,
            quantity: priced_line.line.quantity,
            discounted_unit_price: priced_line.discounted_unit_price,
            line_discount: priced_line.line.line_discount_total(),
            line_total: priced_line.discounted_subtotal,
            overall_share: priced_line.overall_share,
        });
    }

    let summary = CompletedSaleSummary {
        customer_id: customer.id.clone(),
        customer_name: customer.name.clone(),
        lines: sold,
        subtotal: priced.totals.subtotal,
        line_discount_total: priced.totals.line_discount_total,
        overall_discount: priced.overall_discount,
        grand_total: priced.grand_total,
        payment_mode: cart.payment_mode,
        date,
        row_ids: Vec::new(),
    };

    Ok(SettlementPlan {
        rows,
        priced,
        summary,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
