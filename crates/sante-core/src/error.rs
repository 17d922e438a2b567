//! # Error Types
//!
//! Domain-specific error types for sante-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sante-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  sante-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  API errors (in apps/api)                                               │
//! │  └── ApiError         - What the dashboard sees (status + message)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → HTTP     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (medication name, id, stock levels)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations raised by the transactional
/// services. They surface to the dashboard as human-readable messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Medication cannot be found.
    ///
    /// ## When This Occurs
    /// - A prescription line item references an unknown medication id
    /// - A procurement targets a medication that was deleted
    #[error("Medication not found: {0}")]
    MedicationNotFound(String),

    /// Prescription cannot be found.
    #[error("Prescription not found: {0}")]
    PrescriptionNotFound(String),

    /// Procurement record cannot be found.
    #[error("Procurement not found: {0}")]
    ProcurementNotFound(String),

    /// Treatment cannot be found.
    #[error("Treatment not found: {0}")]
    TreatmentNotFound(String),

    /// A treatment may carry at most one prescription.
    #[error("A prescription already exists for treatment {treatment_id}")]
    DuplicatePrescription { treatment_id: String },

    /// Requested decrement exceeds the stock on hand.
    ///
    /// ## When This Occurs
    /// - A prescription line item asks for more than the current stock
    /// - Deleting a procurement would drive stock below zero
    ///
    /// Note that within one prescription request the check is incremental:
    /// line item *k* sees the stock left over after items 1..k-1.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Prescription create/update was called with no line items.
    #[error("Line items are required")]
    EmptyLineItems,

    /// Line item quantity below one.
    #[error("Invalid quantity {quantity} for {name}")]
    InvalidQuantity { name: String, quantity: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before business logic runs.
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

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
        let err = CoreError::InsufficientStock {
            name: "Paracetamol 500mg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Paracetamol 500mg: available 3, requested 5"
        );

        let err = CoreError::DuplicatePrescription {
            treatment_id: "t-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "A prescription already exists for treatment t-1"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "medication_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
