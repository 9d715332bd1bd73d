//! # Pricing Engine
//!
//! Turns a list of cart lines plus an overall discount into exact per-unit
//! prices.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         price_cart()                                    │
//! │                                                                         │
//! │  CartLine[] ──► CartTotals::from_lines()                                │
//! │                   subtotal, line_discount_total, subtotal_after         │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  Discount ───► resolve_overall_discount(subtotal_after)                 │
//! │                   overall ≤ subtotal_after                              │
//! │                          │                                              │
//! │                          ▼                                              │
//! │              allocate_overall_discount(line subtotals, overall)         │
//! │                   one share per line, Σ shares == overall               │
//! │                          │                                              │
//! │                          ▼                                              │
//! │              Money::split_even(share, quantity)                         │
//! │                   one share per unit, Σ == line share                   │
//! │                          │                                              │
//! │                          ▼                                              │
//! │              unit_final = discounted_unit − unit_share  (≥ 0)           │
//! │                                                                         │
//! │  Σ unit_final over every unit == grand_total, to the minor unit        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Remainder Policy
//! The overall discount is split with the largest-remainder method: every
//! line first receives the floor of its exact proportional share, then the
//! leftover minor units go one each to the lines with the largest
//! fractional remainders (earlier line wins a tie). Within a line the share
//! is split evenly across units and the first units absorb the leftover.
//!
//! A line therefore never receives more than its own discounted subtotal,
//! so no unit price can go negative.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartLine;
use crate::discount::Discount;
use crate::error::CoreResult;
use crate::money::Money;

// =============================================================================
// Cart Aggregator
// =============================================================================

/// Cart-level sums before the overall discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    /// Σ unit_price × quantity
    pub subtotal: Money,

    /// Σ (unit_price − discounted_unit_price) × quantity
    pub line_discount_total: Money,

    /// subtotal − line_discount_total
    pub subtotal_after_line_discounts: Money,
}

impl CartTotals {
    /// Sums the lines. An empty slice gives all zeros.
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let subtotal: Money = lines.iter().map(CartLine::gross_subtotal).sum();
        let line_discount_total: Money = lines.iter().map(CartLine::line_discount_total).sum();

        CartTotals {
            subtotal,
            line_discount_total,
            subtotal_after_line_discounts: subtotal - line_discount_total,
        }
    }
}

// =============================================================================
// Overall Discount Resolver
// =============================================================================

/// Resolves the cart-wide discount amount.
///
/// - percentage p → `subtotal_after × p`, rounded half-up
/// - amount a → `min(a, subtotal_after)`
///
/// The result is always within `[0, subtotal_after]`.
///
/// ```rust
/// use salon_core::discount::Discount;
/// use salon_core::money::Money;
/// use salon_core::pricing::resolve_overall_discount;
///
/// let after = Money::from_cents(24_500);
/// let d = Discount::Amount(Money::from_cents(2_000));
/// assert_eq!(resolve_overall_discount(after, &d).cents(), 2_000);
///
/// let d = Discount::Amount(Money::from_cents(99_999));
/// assert_eq!(resolve_overall_discount(after, &d), after);
/// ```
pub fn resolve_overall_discount(subtotal_after: Money, discount: &Discount) -> Money {
    let base = subtotal_after.non_negative();

    let amount = match discount {
        Discount::Percentage(p) => base.percentage_of(p.clamped()),
        Discount::Amount(a) => *a,
    };

    amount.non_negative().min(base)
}

// =============================================================================
// Proportional Allocator
// =============================================================================

/// Distributes `overall` across lines in proportion to `line_subtotals`.
///
/// Returns one share per input line. The shares always sum to exactly
/// `overall` when the weights sum to a positive amount; when they sum to
/// zero every share is zero.
///
/// `overall` is expected to be at most Σ `line_subtotals` (the resolver
/// guarantees it); under that condition no share exceeds its line's
/// subtotal.
///
/// ```rust
/// use salon_core::money::Money;
/// use salon_core::pricing::allocate_overall_discount;
///
/// let lines = [Money::from_cents(20_000), Money::from_cents(4_500)];
/// let shares = allocate_overall_discount(&lines, Money::from_cents(2_000));
///
/// // 2000 × 20000/24500 = 1632.65…  2000 × 4500/24500 = 367.34…
/// assert_eq!(shares, vec![Money::from_cents(1_633), Money::from_cents(367)]);
/// ```
pub fn allocate_overall_discount(line_subtotals: &[Money], overall: Money) -> Vec<Money> {
    let weights: Vec<i128> = line_subtotals
        .iter()
        .map(|m| m.non_negative().cents() as i128)
        .collect();
    let total_weight: i128 = weights.iter().sum();
    let target = overall.non_negative().cents() as i128;

    if total_weight == 0 || target == 0 {
        return vec![Money::zero(); line_subtotals.len()];
    }

    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (index, weight) in weights.iter().enumerate() {
        let exact = target * weight;
        shares.push(exact / total_weight);
        remainders.push((index, exact % total_weight));
    }

    let allocated: i128 = shares.iter().sum();
    let leftover = (target - allocated) as usize;

    // Largest remainder first; stable sort keeps earlier lines ahead on ties
    remainders.sort_by(|a, b| b.1.cmp(&a.1));
    for &(index, _) in remainders.iter().take(leftover) {
        shares[index] += 1;
    }

    shares
        .into_iter()
        .map(|cents| Money::from_cents(cents as i64))
        .collect()
}

// =============================================================================
// Priced Cart
// =============================================================================

/// One cart line with every number the settlement needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub line: CartLine,

    /// Unit price after the line's own discount.
    pub discounted_unit_price: Money,

    /// `discounted_unit_price × quantity`
    pub discounted_subtotal: Money,

    /// This line's part of the overall discount.
    pub overall_share: Money,

    /// Per-unit split of `overall_share`, one entry per unit.
    pub unit_shares: Vec<Money>,
}

impl PricedLine {
    /// Line-level discount on a single unit.
    pub fn unit_line_discount(&self) -> Money {
        self.line.unit_price - self.discounted_unit_price
    }

    /// Final price of unit `index` (0-based).
    pub fn unit_final_price(&self, index: usize) -> Money {
        let share = self.unit_shares.get(index).copied().unwrap_or_default();
        (self.discounted_unit_price - share).non_negative()
    }

    /// Total discount recorded against unit `index`: its line discount plus
    /// its overall share.
    pub fn unit_discount_amount(&self, index: usize) -> Money {
        let share = self.unit_shares.get(index).copied().unwrap_or_default();
        self.unit_line_discount() + share
    }

    /// Final prices for every unit of the line.
    pub fn unit_final_prices(&self) -> Vec<Money> {
        (0..self.unit_shares.len())
            .map(|i| self.unit_final_price(i))
            .collect()
    }

    /// What the line contributes to the grand total.
    pub fn final_total(&self) -> Money {
        self.discounted_subtotal - self.overall_share
    }
}

/// The fully priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub totals: CartTotals,
    pub overall_discount: Money,
    pub grand_total: Money,
}

impl PricedCart {
    /// Number of unit rows the cart expands into.
    pub fn unit_count(&self) -> usize {
        self.lines.iter().map(|l| l.unit_shares.len()).sum()
    }

    /// line discounts + overall discount
    pub fn total_discount(&self) -> Money {
        self.totals.line_discount_total + self.overall_discount
    }
}

/// Prices a cart.
///
/// ## Errors
/// [`CoreError::DiscountRange`](crate::error::CoreError::DiscountRange) if a
/// line or overall discount lies outside its valid range. Values set through
/// [`Cart`](crate::cart::Cart) are always in range. Lines whose price or
/// quantity break [`CartLine::check_bounds`] are rejected the same way.
///
/// ## Example
/// ```rust
/// use salon_core::cart::CartLine;
/// use salon_core::discount::Discount;
/// use salon_core::money::Money;
/// use salon_core::pricing::price_cart;
///
/// let line = CartLine::new("svc-1", "Haircut", Money::from_cents(10_000), 3);
/// let priced = price_cart(&[line], &Discount::Amount(Money::from_cents(100))).unwrap();
///
/// assert_eq!(priced.grand_total.cents(), 29_900);
/// let units = priced.lines[0].unit_final_prices();
/// assert_eq!(units.iter().sum::<Money>(), priced.grand_total);
/// ```
pub fn price_cart(lines: &[CartLine], overall: &Discount) -> CoreResult<PricedCart> {
    for line in lines {
        line.check_bounds()?;
        if let Some(discount) = &line.line_discount {
            discount.check_range(line.gross_subtotal())?;
        }
    }

    let totals = CartTotals::from_lines(lines);
    overall.check_range(totals.subtotal_after_line_discounts.non_negative())?;

    let overall_discount = resolve_overall_discount(totals.subtotal_after_line_discounts, overall);
    let grand_total = (totals.subtotal_after_line_discounts - overall_discount).non_negative();

    let weights: Vec<Money> = lines.iter().map(CartLine::discounted_subtotal).collect();
    let shares = allocate_overall_discount(&weights, overall_discount);

    let priced_lines = lines
        .iter()
        .zip(shares)
        .map(|(line, overall_share)| {
            let quantity = line.quantity.max(0) as usize;
            PricedLine {
                discounted_unit_price: line.discounted_unit_price(),
                discounted_subtotal: line.discounted_subtotal(),
                overall_share,
                unit_shares: overall_share.split_even(quantity),
                line: line.clone(),
            }
        })
        .collect();

    Ok(PricedCart {
        lines: priced_lines,
        totals,
        overall_discount,
        grand_total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
