//! # Validation
//!
//! Field rules for catalog entries and the cart line limit. The database
//! repeats the important ones as CHECK constraints, and the cart clamps
//! discounts on its own, so these cover what a form submits.
//!
//! ```rust
//! use salon_core::validation::{validate_name, validate_price_cents};
//!
//! assert!(validate_name("name", "  Hair Spa ").is_ok());
//! assert!(validate_name("name", "   ").is_err());
//! assert!(validate_price_cents(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_LINES, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of customer, staff and service names.
pub const MAX_NAME_LEN: usize = 120;

/// Maximum length of a customer contact (phone or email).
pub const MAX_CONTACT_LEN: usize = 100;

/// Minimum length of the admin passphrase.
pub const MIN_PASSPHRASE_LEN: usize = 4;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (customer, staff member or service).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use salon_core::validation::validate_name;
///
/// assert!(validate_name("name", "Priya").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an optional customer contact.
///
/// Empty input is allowed and means "no contact". Returns the trimmed value
/// or `None`.
pub fn validate_contact(contact: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(contact) = contact.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if contact.chars().count() > MAX_CONTACT_LEN {
        return Err(ValidationError::TooLong {
            field: "contact".to_string(),
            max: MAX_CONTACT_LEN,
        });
    }

    Ok(Some(contact.to_string()))
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a new admin passphrase.
pub fn validate_passphrase(passphrase: &str) -> ValidationResult<()> {
    if passphrase.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "passphrase".to_string(),
        });
    }

    if passphrase.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(ValidationError::OutOfRange {
            field: "passphrase length".to_string(),
            min: MIN_PASSPHRASE_LEN as i64,
            max: 256,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a service price in minor units.
///
/// ## Example
/// ```rust
/// use salon_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(50_000).is_ok());
/// assert!(validate_price_cents(0).is_ok());      // complimentary service
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
