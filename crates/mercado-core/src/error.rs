//! # Error Types
//!
//! Domain-specific error types for mercado-core.
//!
//! ## Error Flow
//! ```text
//! ValidationError ──► CoreError ──► DbError (mercado-db) ──► caller/UI
//! ```
//!
//! Errors are enum variants with context fields, never bare strings. Every
//! failure here is scoped to a single user action and recoverable by
//! retrying the action.

use thiserror::Error;

use crate::quick_sale::QuickSaleError;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule violations and domain logic failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The referenced product does not exist (or was deleted).
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// The referenced sale does not exist.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// Not enough stock to complete the operation.
    ///
    /// Carries the available quantity so the caller can surface
    /// "only N in stock" to the user.
    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    /// Input validation failure (wraps [`ValidationError`]).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Quick-sale free-text parsing or resolution failure.
    #[error("quick sale error: {0}")]
    QuickSale(#[from] QuickSaleError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g. malformed date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience alias for Results with [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock: available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
