//! # Validation Module
//!
//! Input validation run before business logic and persistence. The database
//! schema repeats the numeric constraints as CHECK clauses; these functions
//! exist so bad input fails with a typed error instead of a constraint
//! violation.

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_label("name", name, 200)
}

/// Validates a category slug or custom category name.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    validate_label("category", category, 60)
}

/// Validates an expense description.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    validate_label("description", description, 300)
}

/// Validates a supplier name.
pub fn validate_supplier_name(name: &str) -> ValidationResult<()> {
    validate_label("name", name, 120)
}

fn validate_label(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity: at least 1.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a monetary amount in cents: zero or greater.
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a stock or minimum-stock level: zero or greater.
pub fn validate_stock_level(field: &str, level: i64) -> ValidationResult<()> {
    if level < 0 {
        return Err(ValidationError::MustBeNonNegative {
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
    fn test_product_name() {
        assert!(validate_product_name("Leite Integral 1L").is_ok());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"a".repeat(201)).is_err());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_amount_cents() {
        assert!(validate_amount_cents("amount", 0).is_ok());
        assert!(validate_amount_cents("amount", 199).is_ok());
        assert!(validate_amount_cents("amount", -1).is_err());
    }

    #[test]
    fn test_stock_level() {
        assert!(validate_stock_level("stock_quantity", 0).is_ok());
        assert!(validate_stock_level("min_stock", -1).is_err());
    }
}
