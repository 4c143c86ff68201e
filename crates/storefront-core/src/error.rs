//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Cart, pricing and checkout rule violations     │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  storefront-client errors (separate crate)                             │
//! │  ├── ClientError      - Storage, remote cart, order submission         │
//! │  └── UserError        - What the UI shows (code + field + message)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → UserError → UI      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these errors are retried automatically. They all describe input
//! the customer has to correct.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart, pricing and checkout errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Caller-supplied data is malformed (missing product attributes, etc.).
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A rental date range breaks the `end > start` rule or is absent where
    /// a rental price is requested.
    #[error("Invalid rental selection: {reason}")]
    InvalidRentalSelection { reason: String },

    /// A rental checkout contains items without complete rental dates.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (RENTAL) with 2 items
    ///      │
    ///      ▼
    /// item "a1" has no dates, item "b2" ends before it starts
    ///      │
    ///      ▼
    /// IncompleteRentalSelection { item_ids: ["a1", "b2"] }
    ///      │
    ///      ▼
    /// UI highlights both lines and asks for rental dates
    /// ```
    #[error("Rental dates are missing or invalid for items: {}", .item_ids.join(", "))]
    IncompleteRentalSelection { item_ids: Vec<String> },

    /// A guest contact field failed a required/format check.
    #[error("Invalid {field}: {reason}")]
    InvalidCustomerInfo { field: String, reason: String },

    /// Authenticated home delivery without a saved shipping address.
    #[error("A shipping address must be selected for home delivery")]
    MissingShippingAddress,

    /// Store pickup with no branch, an unknown branch, or a branch that is
    /// out of stock for one of the selected products.
    #[error("Pickup branch unavailable: {reason}")]
    BranchUnavailable {
        branch_id: Option<String>,
        reason: String,
    },

    /// Negative price/quantity (or an overflowing total) reached pricing.
    #[error("Invalid line item {item_id}: {reason}")]
    InvalidLineItem { item_id: String, reason: String },

    /// No cart line with the given id.
    #[error("Cart item not found: {0}")]
    ItemNotFound(String),
}

impl CoreError {
    /// Returns the field the error is attached to, when there is one.
    ///
    /// The UI uses this to place the message next to the offending input.
    pub fn field(&self) -> Option<&str> {
        match self {
            CoreError::Validation(e) => Some(e.field()),
            CoreError::InvalidCustomerInfo { field, .. } => Some(field),
            CoreError::MissingShippingAddress => Some("shipmentDetailId"),
            CoreError::BranchUnavailable { .. } => Some("branchId"),
            CoreError::InvalidRentalSelection { .. }
            | CoreError::IncompleteRentalSelection { .. } => Some("rentalSelection"),
            CoreError::InvalidLineItem { .. } | CoreError::ItemNotFound(_) => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller-supplied data doesn't meet requirements.
/// They are raised before any mutation or I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., phone number, date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
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
    fn test_error_messages() {
        let err = CoreError::IncompleteRentalSelection {
            item_ids: vec!["a1".to_string(), "b2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Rental dates are missing or invalid for items: a1, b2"
        );

        let err = CoreError::InvalidCustomerInfo {
            field: "phoneNumber".to_string(),
            reason: "must be a Vietnamese mobile number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid phoneNumber: must be a Vietnamese mobile number"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("color");
        assert_eq!(err.to_string(), "color is required");
        assert_eq!(err.field(), "color");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("size").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.field(), Some("size"));
    }

    #[test]
    fn test_error_fields() {
        assert_eq!(
            CoreError::MissingShippingAddress.field(),
            Some("shipmentDetailId")
        );
        assert_eq!(CoreError::ItemNotFound("x".into()).field(), None);
    }
}
