//! # Validation Module
//!
//! Input validation utilities for Sante.
//!
//! Validation runs in layers: the API handlers deserialize and call these
//! checks before any business logic, the transactional services re-check the
//! stock-sensitive rules against fresh reads, and the database schema carries
//! NOT NULL / UNIQUE / CHECK constraints as the final backstop.
//!
//! ## Usage
//! ```rust
//! use sante_core::validation::{validate_medication_name, validate_quantity};
//!
//! assert!(validate_medication_name("Paracetamol 500mg").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a medication display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_medication_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates that a referenced id is present and non-empty.
///
/// Used for required references like `medication_id` and `treatment_id`
/// before the database is consulted.
pub fn validate_required_id(field: &str, id: Option<&str>) -> ValidationResult<()> {
    match id {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::Required {
            field: field.to_string(),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item or procurement quantity.
///
/// ## Rules
/// - Must be positive (> 0); any positive amount is acceptable, the stock
///   check against the actual level happens inside the transaction
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (donated stock)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
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
    fn test_validate_medication_name() {
        assert!(validate_medication_name("Paracetamol 500mg").is_ok());
        assert!(validate_medication_name("").is_err());
        assert!(validate_medication_name("   ").is_err());
        assert!(validate_medication_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_required_id() {
        assert!(validate_required_id("medication_id", Some("m-1")).is_ok());
        assert!(validate_required_id("medication_id", Some("")).is_err());
        assert!(validate_required_id("medication_id", Some("   ")).is_err());
        assert!(validate_required_id("medication_id", None).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        // No upper bound: large deliveries are legitimate
        assert!(validate_quantity(100_000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }
}
