//! # Cart
//!
//! The in-progress sale: selected customer, service lines, overall discount
//! and payment mode.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Front Desk Action           Cart Method              State Change      │
//! │  ─────────────────           ───────────              ────────────      │
//! │                                                                         │
//! │  Pick customer ────────────► select_customer() ─────► customer = Some   │
//! │  Tap service ──────────────► add_service() ─────────► push or qty += n  │
//! │  + / − buttons ────────────► increment()/decrement()  qty 0 → removed   │
//! │  Choose stylist ───────────► assign_staff() ────────► staff_id = Some   │
//! │  Line discount ────────────► set_line_discount() ───► clamped, stored   │
//! │  Overall discount ─────────► set_overall_discount() ► clamped, stored   │
//! │  Complete / abandon ───────► reset() ───────────────► fresh cart        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `service_id` (adding the same service again raises
//!   its quantity)
//! - Quantity is always ≥ 1; a line reduced to 0 is removed
//! - Discounts are clamped into range whenever they are set, and again
//!   whenever a quantity change shrinks the range they were clamped to
//! - At most [`MAX_CART_LINES`] lines and [`MAX_LINE_QUANTITY`] per line

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::{resolve_unit_price, Discount};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{price_cart, CartTotals, PricedCart};
use crate::types::{Customer, PaymentMode, Service, Staff};
use crate::validation::{validate_cart_size, validate_price_cents};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One selected service in the in-progress sale.
///
/// ## Design Notes
/// `service_name` and `unit_price` are a frozen snapshot of the catalog
/// entry at the time it was added. Editing the service afterwards does not
/// change a cart that already holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub service_id: String,
    pub service_name: String,
    pub unit_price: Money,
    pub quantity: i64,

    /// Staff member performing the service. Required before checkout.
    pub staff_id: Option<String>,
    pub staff_name: Option<String>,

    pub line_discount: Option<Discount>,
}

impl CartLine {
    /// Creates an unassigned, undiscounted line.
    pub fn new(
        service_id: impl Into<String>,
        service_name: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        CartLine {
            service_id: service_id.into(),
            service_name: service_name.into(),
            unit_price,
            quantity,
            staff_id: None,
            staff_name: None,
            line_discount: None,
        }
    }

    /// Snapshots a catalog service into a new line.
    pub fn from_service(service: &Service, quantity: i64) -> Self {
        CartLine::new(&service.id, &service.name, service.price(), quantity)
    }

    /// `unit_price × quantity`, before any discount.
    pub fn gross_subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Unit price after this line's own discount.
    pub fn discounted_unit_price(&self) -> Money {
        resolve_unit_price(self.unit_price, self.line_discount.as_ref())
    }

    /// `discounted_unit_price × quantity`
    pub fn discounted_subtotal(&self) -> Money {
        self.discounted_unit_price().multiply_quantity(self.quantity)
    }

    /// Total line-level discount across every unit of the line.
    pub fn line_discount_total(&self) -> Money {
        (self.unit_price - self.discounted_unit_price()).multiply_quantity(self.quantity)
    }

    /// Upper bound for an amount-type discount on this line.
    pub fn max_discount_amount(&self) -> Money {
        self.gross_subtotal()
    }

    /// Checks that the line's price and quantity fit the cart limits and
    /// that its gross subtotal cannot overflow.
    pub fn check_bounds(&self) -> CoreResult<()> {
        check_line_amount(&self.service_id, self.unit_price, self.quantity).map(|_| ())
    }

    /// True once a staff member is assigned.
    pub fn has_staff(&self) -> bool {
        self.staff_id.is_some()
    }

    fn reclamp_discount(&mut self) {
        let max = self.max_discount_amount();
        if let Some(discount) = self.line_discount.as_mut() {
            *discount = discount.clamped(max);
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress sale.
///
/// One cart belongs to one front-desk session; it is never shared between
/// concurrent sales.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub customer: Option<Customer>,
    pub lines: Vec<CartLine>,
    pub overall_discount: Discount,
    pub payment_mode: PaymentMode,
}

impl Cart {
    /// Creates an empty cart with no discount and cash payment.
    pub fn new() -> Self {
        Cart::default()
    }

    // -------------------------------------------------------------------------
    // Customer & Payment
    // -------------------------------------------------------------------------

    pub fn select_customer(&mut self, customer: Customer) {
        self.customer = Some(customer);
    }

    pub fn clear_customer(&mut self) {
        self.customer = None;
    }

    pub fn set_payment_mode(&mut self, mode: PaymentMode) {
        self.payment_mode = mode;
    }

    // -------------------------------------------------------------------------
    // Lines
    // -------------------------------------------------------------------------

    /// Adds a service or raises its quantity if it is already in the cart.
    ///
    /// ## Errors
    /// - `Validation` if `quantity` is not positive
    /// - `QuantityTooLarge` if the resulting quantity exceeds 999
    /// - `Validation` if the service price is above [`MAX_PRICE_CENTS`](crate::MAX_PRICE_CENTS)
    /// - `AmountTooLarge` if the line total overflows
    /// - `CartTooLarge` if a new line would exceed 100 lines
    pub fn add_service(&mut self, service: &Service, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.service_id == service.id) {
            let requested = line.quantity.saturating_add(quantity);
            check_line_amount(&line.service_id, line.unit_price, requested)?;
            line.quantity = requested;
            return Ok(());
        }

        check_line_amount(&service.id, service.price(), quantity)?;

        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_LINES,
        })?;

        self.lines.push(CartLine::from_service(service, quantity));
        Ok(())
    }

    /// Raises a line's quantity by one.
    pub fn increment(&mut self, service_id: &str) -> CoreResult<()> {
        let current = self.line_or_err(service_id)?.quantity;
        self.set_quantity(service_id, current + 1)
    }

    /// Lowers a line's quantity by one, removing the line at zero.
    pub fn decrement(&mut self, service_id: &str) -> CoreResult<()> {
        let current = self.line_or_err(service_id)?.quantity;
        self.set_quantity(service_id, current - 1)
    }

    /// Sets a line's quantity. Zero removes the line.
    ///
    /// Shrinking a line re-clamps its amount discount to the new line total,
    /// and the overall discount to the new post-line subtotal.
    pub fn set_quantity(&mut self, service_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity < 0 {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 0,
                max: MAX_LINE_QUANTITY,
            }
            .into());
        }

        if quantity == 0 {
            return self.remove_line(service_id);
        }

        let line = self.line_mut_or_err(service_id)?;
        check_line_amount(&line.service_id, line.unit_price, quantity)?;
        line.quantity = quantity;
        line.reclamp_discount();
        self.reclamp_overall();
        Ok(())
    }

    /// Removes a line.
    pub fn remove_line(&mut self, service_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.service_id != service_id);

        if self.lines.len() == before {
            return Err(CoreError::LineNotFound(service_id.to_string()));
        }

        self.reclamp_overall();
        Ok(())
    }

    /// Assigns the staff member performing a line's service.
    pub fn assign_staff(&mut self, service_id: &str, staff: &Staff) -> CoreResult<()> {
        let line = self.line_mut_or_err(service_id)?;
        line.staff_id = Some(staff.id.clone());
        line.staff_name = Some(staff.name.clone());
        Ok(())
    }

    /// Sets a line discount, clamped to `[0, 100%]` or `[0, unit_price × quantity]`.
    ///
    /// Returns the value actually stored.
    pub fn set_line_discount(&mut self, service_id: &str, discount: Discount) -> CoreResult<Discount> {
        let line = self.line_mut_or_err(service_id)?;
        let clamped = discount.clamped(line.max_discount_amount());
        line.line_discount = Some(clamped);
        self.reclamp_overall();
        Ok(clamped)
    }

    pub fn clear_line_discount(&mut self, service_id: &str) -> CoreResult<()> {
        self.line_mut_or_err(service_id)?.line_discount = None;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Overall Discount
    // -------------------------------------------------------------------------

    /// Sets the overall discount, clamped against the current post-line
    /// subtotal. Returns the value actually stored.
    pub fn set_overall_discount(&mut self, discount: Discount) -> Discount {
        let max = self.totals().subtotal_after_line_discounts.non_negative();
        self.overall_discount = discount.clamped(max);
        self.overall_discount
    }

    pub fn clear_overall_discount(&mut self) {
        self.overall_discount = Discount::NONE;
    }

    fn reclamp_overall(&mut self) {
        let max = self.totals().subtotal_after_line_discounts.non_negative();
        self.overall_discount = self.overall_discount.clamped(max);
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn line(&self, service_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.service_id == service_id)
    }

    pub fn contains(&self, service_id: &str) -> bool {
        self.line(service_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Subtotal and line discount sums.
    pub fn totals(&self) -> CartTotals {
        CartTotals::from_lines(&self.lines)
    }

    /// Prices the cart exactly as checkout will.
    pub fn price(&self) -> CoreResult<PricedCart> {
        price_cart(&self.lines, &self.overall_discount)
    }

    /// Starts a fresh sale: no customer, no lines, no discount, cash.
    pub fn reset(&mut self) {
        *self = Cart::new();
    }

    fn line_or_err(&self, service_id: &str) -> CoreResult<&CartLine> {
        self.line(service_id)
            .ok_or_else(|| CoreError::LineNotFound(service_id.to_string()))
    }

    fn line_mut_or_err(&mut self, service_id: &str) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.service_id == service_id)
            .ok_or_else(|| CoreError::LineNotFound(service_id.to_string()))
    }
}

/// Bounds one line: price within the catalog cap, quantity within the
/// per-line cap, and `unit_price × quantity` representable.
fn check_line_amount(service_id: &str, unit_price: Money, quantity: i64) -> CoreResult<Money> {
    validate_price_cents(unit_price.cents())?;

    if quantity > MAX_LINE_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_LINE_QUANTITY,
        });
    }

    unit_price
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| CoreError::AmountTooLarge {
            service_id: service_id.to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
