//! # Error Types
//!
//! Domain-specific error types for tuck-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tuck-core errors (this file)                                          │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Form input validation failures                 │
//! │                                                                         │
//! │  tuck-store errors (separate crate)                                    │
//! │  ├── StoreError       - Document store failures                        │
//! │  └── DeskError        - What the front end sees on submit              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DeskError → Front end             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A stock shortfall found by the ledger is NOT an error: it comes back as a
//! [`StockCheck`](crate::ledger::StockCheck) with `ok == false`. Errors here
//! are for input that cannot be turned into a decision at all.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order id does not resolve in the current snapshot.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Draft already holds the maximum number of lines.
    #[error("An order cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Draft line index is out of bounds.
    #[error("Draft has no line at position {index}")]
    NoSuchLine { index: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any store write so the form can show the message inline.
#[derive(Debug, Error)]
pub enum ValidationError {
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
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OrderNotFound("p1".to_string());
        assert_eq!(err.to_string(), "Order not found: p1");

        let err = CoreError::TooManyLines { max: 100 };
        assert_eq!(err.to_string(), "An order cannot have more than 100 lines");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("customer name");
        assert_eq!(err.to_string(), "customer name is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 999,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 999");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
