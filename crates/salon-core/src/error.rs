//! # Error Types
//!
//! Domain-specific error types for salon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  salon-core errors (this file)                                         │
//! │  ├── CoreError           - General domain errors                       │
//! │  ├── ValidationError     - Input / finalize precondition failures      │
//! │  └── DiscountRangeError  - Discount outside its valid range            │
//! │                                                                         │
//! │  salon-db errors (separate crate)                                      │
//! │  └── DbError             - Database operation failures                 │
//! │                                                                         │
//! │  salon-service errors                                                  │
//! │  └── CheckoutError / ServiceError - What the caller sees               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → UI                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart has no line for the given service.
    #[error("Service {0} is not in the cart")]
    LineNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} services")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// `unit_price × quantity` does not fit in a line total.
    #[error("Line total for {service_id} is too large")]
    AmountTooLarge { service_id: String },

    /// A discount outside its valid range reached the pricing engine.
    ///
    /// Discounts are clamped when they are set, so this indicates a value
    /// that bypassed the cart (deserialized, hand-built) and is treated as
    /// an invariant violation rather than silently corrected.
    #[error("Discount out of range: {0}")]
    DiscountRange(#[from] DiscountRangeError),

    /// Sales history could not be exported.
    #[error("Export failed: {0}")]
    Export(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// The finalize preconditions (`EmptyCart`, `MissingCustomer`,
/// `MissingStaff`) live here too: they are reported before any row is
/// written and are fully recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing to sell.
    #[error("Cart is empty")]
    EmptyCart,

    /// No customer selected for the sale.
    #[error("No customer selected")]
    MissingCustomer,

    /// A cart line has no staff member assigned.
    #[error("No staff assigned to line {line} ({service_name})")]
    MissingStaff { line: usize, service_name: String },

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Discount Range Error
// =============================================================================

/// A discount value outside its valid range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountRangeError {
    #[error("percentage {bps} bps exceeds 10000 bps (100%)")]
    Percentage { bps: u32 },

    #[error("amount {amount} is negative")]
    NegativeAmount { amount: Money },

    #[error("amount {amount} exceeds maximum {max}")]
    Amount { amount: Money, max: Money },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_messages() {
        let err = ValidationError::MissingStaff {
            line: 2,
            service_name: "Hair Spa".to_string(),
        };
        assert_eq!(err.to_string(), "No staff assigned to line 2 (Hair Spa)");
        assert_eq!(ValidationError::EmptyCart.to_string(), "Cart is empty");
    }

    #[test]
    fn test_discount_range_message() {
        let err = DiscountRangeError::Amount {
            amount: Money::from_cents(12_000),
            max: Money::from_cents(10_000),
        };
        assert_eq!(err.to_string(), "amount 120.00 exceeds maximum 100.00");
    }

    #[test]
    fn test_conversions_into_core_error() {
        let core_err: CoreError = ValidationError::MissingCustomer.into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let core_err: CoreError = DiscountRangeError::Percentage { bps: 12_000 }.into();
        assert!(matches!(core_err, CoreError::DiscountRange(_)));
    }
}
