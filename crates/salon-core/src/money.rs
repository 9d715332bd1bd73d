//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A ₹20.00 overall discount spread over three haircuts:                  │
//! │    20.00 / 3 = 6.666… (×3 = 19.999…)  → receipt and ledger disagree    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise / cents)                     │
//! │    2000 / 3 = 666 r 2 → 667 + 667 + 666 = 2000                         │
//! │    The remainder is handed out explicitly, never lost                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use salon_core::money::Money;
//!
//! let price = Money::from_cents(49_900); // 499.00
//! let doubled = price * 2;
//! assert_eq!(doubled.cents(), 99_800);
//!
//! let shares = Money::from_cents(2000).split_even(3);
//! assert_eq!(shares, vec![Money::from_cents(667), Money::from_cents(667), Money::from_cents(666)]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percent;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise for INR, cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction is total; callers floor at zero where a
///   negative price would be meaningless
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Floors the value at zero.
    ///
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-40).non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(40).non_negative().cents(), 40);
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Like [`multiply_quantity`](Self::multiply_quantity), `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns `rate` of this amount, rounded half-up to the nearest minor unit.
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ```rust
    /// use salon_core::money::Money;
    /// use salon_core::types::Percent;
    ///
    /// // 10% of 50.00 = 5.00
    /// assert_eq!(Money::from_cents(5000).percentage_of(Percent::from_bps(1000)).cents(), 500);
    /// // 12.5% of 0.99 = 0.12375 → 0.12
    /// assert_eq!(Money::from_cents(99).percentage_of(Percent::from_bps(1250)).cents(), 12);
    /// ```
    pub fn percentage_of(&self, rate: Percent) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ```rust
    /// use salon_core::money::Money;
    /// use salon_core::types::Percent;
    ///
    /// let price = Money::from_cents(10000);
    /// assert_eq!(price.apply_percentage_discount(Percent::from_bps(1000)).cents(), 9000);
    /// ```
    pub fn apply_percentage_discount(&self, rate: Percent) -> Money {
        *self - self.percentage_of(rate)
    }

    /// Splits the amount into `parts` shares that differ by at most one
    /// minor unit and sum back to the original amount.
    ///
    /// The leftover minor units go to the first shares. Returns an empty
    /// vector when `parts` is zero.
    pub fn split_even(&self, parts: usize) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }

        let n = parts as i64;
        let base = self.0.div_euclid(n);
        let leftover = self.0.rem_euclid(n) as usize;

        (0..parts)
            .map(|i| {
                if i < leftover {
                    Money(base + 1)
                } else {
                    Money(base)
                }
            })
            .collect()
    }

    /// Formats the amount with a currency symbol, e.g. `₹1234.50`.
    ///
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(123450).format_with("₹"), "₹1234.50");
    /// assert_eq!(Money::from_cents(-550).format_with("$"), "-$5.50");
    /// ```
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.major().abs(), self.minor())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering without a currency symbol.
///
/// Use [`Money::format_with`] for customer-facing output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
