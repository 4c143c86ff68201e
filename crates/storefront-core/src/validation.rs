//! # Validation Module
//!
//! Field-level input rules shared by the cart and checkout.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Mobile UI                                                    │
//! │  ├── Basic form checks (empty inputs)                                  │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: storefront-core (Rust)                                       │
//! │  └── THIS MODULE + order::OrderComposer::validate                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Storefront API                                               │
//! │  └── Server-side checks (stock, prices, discount codes)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_phone_number, validate_required};
//!
//! assert!(validate_phone_number("0912345678").is_ok());
//! assert!(validate_required("fullName", "  ").is_err());
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Vietnamese mobile numbers: `84` or `0`, a carrier digit, then 8 digits.
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(84|0)[35789][0-9]{8}$").expect("phone pattern is a valid regex")
});

// =============================================================================
// String Validators
// =============================================================================

/// Checks that a field is present and not blank.
///
/// ## Returns
/// The trimmed value.
pub fn validate_required<'a>(field: &str, value: &'a str) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    Ok(value)
}

/// Same as [`validate_required`] for values that may be absent altogether.
pub fn validate_present<'a>(field: &str, value: Option<&'a str>) -> ValidationResult<&'a str> {
    validate_required(field, value.unwrap_or_default())
}

/// Validates a phone number against the accepted mobile prefixes.
///
/// ## Rules
/// - Starts with `84` or `0`
/// - Followed by one of `3, 5, 7, 8, 9`
/// - Then exactly 8 digits
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_phone_number;
///
/// assert!(validate_phone_number("0912345678").is_ok());
/// assert!(validate_phone_number("84387654321").is_ok());
/// assert!(validate_phone_number("12345").is_err());
/// ```
pub fn validate_phone_number(phone: &str) -> ValidationResult<()> {
    let phone = validate_required("phoneNumber", phone)?;

    if !PHONE_PATTERN.is_match(phone) {
        return Err(ValidationError::InvalidFormat {
            field: "phoneNumber".to_string(),
            reason: "must be a mobile number starting with 0 or 84".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a monetary amount that may be zero but not negative.
///
/// ## Example
/// ```rust
/// use storefront_core::money::Money;
/// use storefront_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("transportFee", Money::zero()).is_ok());
/// assert!(validate_non_negative("transportFee", Money::new(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("fullName", "  Lan  ").unwrap(), "Lan");
        assert!(validate_required("fullName", "").is_err());
        assert!(validate_required("fullName", "   ").is_err());
    }

    #[test]
    fn test_validate_present() {
        assert!(validate_present("color", Some("red")).is_ok());
        assert!(validate_present("color", Some("")).is_err());
        assert_eq!(
            validate_present("color", None).unwrap_err(),
            ValidationError::required("color")
        );
    }

    #[test]
    fn test_validate_phone_number() {
        // Valid numbers
        assert!(validate_phone_number("0912345678").is_ok());
        assert!(validate_phone_number("0312345678").is_ok());
        assert!(validate_phone_number("0512345678").is_ok());
        assert!(validate_phone_number("0712345678").is_ok());
        assert!(validate_phone_number("0812345678").is_ok());
        assert!(validate_phone_number("84912345678").is_ok());
        assert!(validate_phone_number(" 0912345678 ").is_ok());

        // Invalid numbers
        assert!(validate_phone_number("12345").is_err());
        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("0212345678").is_err());
        assert!(validate_phone_number("091234567").is_err());
        assert!(validate_phone_number("09123456789").is_err());
        assert!(validate_phone_number("09123a5678").is_err());
        assert!(validate_phone_number("+84912345678").is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("fee", Money::new(0)).is_ok());
        assert!(validate_non_negative("fee", Money::new(15_000)).is_ok());
        assert!(validate_non_negative("fee", Money::new(-1)).is_err());
    }
}
