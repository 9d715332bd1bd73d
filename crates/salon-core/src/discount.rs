//! # Discounts
//!
//! The discount value type shared by cart lines and the whole-cart
//! ("overall") discount, plus the line-item resolver.
//!
//! ## Where Discounts Apply
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service "Hair Spa" ₹500 × 2, line discount 10%                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve_unit_price() ← THIS MODULE                                     │
//! │       │  per unit: 500 - 10% = 450                                      │
//! │       ▼                                                                 │
//! │  line subtotal 450 × 2 = 900                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  overall discount (pricing module) spread back over lines/units        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Range Policy
//! Values are clamped when they are *set* ([`Discount::clamped`]). The
//! resolver never re-clamps; the pricing engine calls
//! [`Discount::check_range`] and refuses anything that slipped through.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::DiscountRangeError;
use crate::money::Money;
use crate::types::Percent;

/// A percentage or fixed-amount discount.
///
/// Serialized as `{ "type": "percentage", "value": 1000 }` or
/// `{ "type": "amount", "value": 2000 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    Percentage(Percent),
    Amount(Money),
}

impl Discount {
    /// The "no discount" value the overall discount resets to.
    pub const NONE: Discount = Discount::Percentage(Percent::zero());

    /// Clamps the value into its valid range.
    ///
    /// Percentages go to `[0, 100%]`, amounts to `[0, max_amount]`.
    ///
    /// ```rust
    /// use salon_core::discount::Discount;
    /// use salon_core::money::Money;
    /// use salon_core::types::Percent;
    ///
    /// let d = Discount::Amount(Money::from_cents(9_000)).clamped(Money::from_cents(5_000));
    /// assert_eq!(d, Discount::Amount(Money::from_cents(5_000)));
    ///
    /// let d = Discount::Percentage(Percent::from_bps(25_000)).clamped(Money::zero());
    /// assert_eq!(d, Discount::Percentage(Percent::FULL));
    /// ```
    pub fn clamped(self, max_amount: Money) -> Self {
        match self {
            Discount::Percentage(p) => Discount::Percentage(p.clamped()),
            Discount::Amount(a) => {
                let ceiling = max_amount.non_negative();
                Discount::Amount(a.non_negative().min(ceiling))
            }
        }
    }

    /// Verifies the value lies within its valid range.
    pub fn check_range(&self, max_amount: Money) -> Result<(), DiscountRangeError> {
        match *self {
            Discount::Percentage(p) if p > Percent::FULL => {
                Err(DiscountRangeError::Percentage { bps: p.bps() })
            }
            Discount::Amount(a) if a.is_negative() => {
                Err(DiscountRangeError::NegativeAmount { amount: a })
            }
            Discount::Amount(a) if a > max_amount => Err(DiscountRangeError::Amount {
                amount: a,
                max: max_amount,
            }),
            _ => Ok(()),
        }
    }

    /// True for 0% and for a zero amount.
    pub fn is_zero(&self) -> bool {
        match self {
            Discount::Percentage(p) => p.is_zero(),
            Discount::Amount(a) => a.is_zero(),
        }
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::NONE
    }
}

/// Resolves the discounted price of one unit.
///
/// - none → `unit_price`
/// - percentage p → `unit_price × (1 − p)`, rounded half-up
/// - amount a → `max(0, unit_price − a)`
///
/// Amount discounts are per unit: "₹50 off" on a line of three takes ₹50 off
/// each of the three.
///
/// ```rust
/// use salon_core::discount::{resolve_unit_price, Discount};
/// use salon_core::money::Money;
/// use salon_core::types::Percent;
///
/// let price = Money::from_cents(5_000);
/// assert_eq!(resolve_unit_price(price, None), price);
/// assert_eq!(
///     resolve_unit_price(price, Some(&Discount::Percentage(Percent::from_bps(1000)))).cents(),
///     4_500
/// );
/// assert_eq!(
///     resolve_unit_price(price, Some(&Discount::Amount(Money::from_cents(7_000)))),
///     Money::zero()
/// );
/// ```
pub fn resolve_unit_price(unit_price: Money, discount: Option<&Discount>) -> Money {
    match discount {
        None => unit_price,
        Some(Discount::Percentage(p)) => unit_price.apply_percentage_discount(*p).non_negative(),
        Some(Discount::Amount(a)) => (unit_price - *a).non_negative(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(bps: u32) -> Discount {
        Discount::Percentage(Percent::from_bps(bps))
    }

    fn amt(cents: i64) -> Discount {
        Discount::Amount(Money::from_cents(cents))
    }

    #[test]
    fn test_resolver_never_negative() {
        let prices = [0, 1, 99, 100, 4_999, 50_000];
        let discounts = [
            pct(0),
            pct(1),
            pct(3_333),
            pct(9_999),
            pct(10_000),
            amt(0),
            amt(1),
            amt(4_999),
            amt(1_000_000),
        ];

        for cents in prices {
            for d in &discounts {
                let price = Money::from_cents(cents);
                let resolved = resolve_unit_price(price, Some(d));
                assert!(!resolved.is_negative(), "{d:?} on {price} went negative");
                assert!(resolved <= price, "{d:?} on {price} raised the price");
            }
        }
    }

    #[test]
    fn test_full_percentage_is_free() {
        assert_eq!(resolve_unit_price(Money::from_cents(12_345), Some(&pct(10_000))), Money::zero());
    }

    #[test]
    fn test_clamp_amount_and_negative() {
        let max = Money::from_cents(10_000);
        assert_eq!(amt(-500).clamped(max), amt(0));
        assert_eq!(amt(20_000).clamped(max), amt(10_000));
        assert_eq!(amt(2_000).clamped(max), amt(2_000));
        // A negative ceiling collapses to zero rather than going negative
        assert_eq!(amt(2_000).clamped(Money::from_cents(-1)), amt(0));
    }

    #[test]
    fn test_check_range() {
        let max = Money::from_cents(10_000);
        assert!(pct(10_000).check_range(max).is_ok());
        assert_eq!(
            pct(10_001).check_range(max),
            Err(DiscountRangeError::Percentage { bps: 10_001 })
        );
        assert!(matches!(
            amt(-1).check_range(max),
            Err(DiscountRangeError::NegativeAmount { .. })
        ));
        assert!(matches!(
            amt(10_001).check_range(max),
            Err(DiscountRangeError::Amount { .. })
        ));
    }

    #[test]
    fn test_clamped_values_always_pass_range_check() {
        let max = Money::from_cents(7_500);
        for d in [pct(0), pct(50_000), amt(-3), amt(7_500), amt(7_501), amt(i64::MAX / 4)] {
            assert!(d.clamped(max).check_range(max).is_ok(), "{d:?}");
        }
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(pct(1000)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "percentage", "value": 1000 }));

        let parsed: Discount = serde_json::from_str(r#"{"type":"amount","value":2000}"#).unwrap();
        assert_eq!(parsed, amt(2000));
    }

    #[test]
    fn test_none_is_zero_percentage() {
        assert!(Discount::NONE.is_zero());
        assert_eq!(Discount::default(), Discount::NONE);
        assert!(!amt(1).is_zero());
    }
}
