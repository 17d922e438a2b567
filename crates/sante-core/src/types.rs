//! # Domain Types
//!
//! Core domain types used throughout Sante.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │   Medication    │   │  Procurement    │   │    Expense      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │        │
//! │  │  name           │   │  medication_id  │   │  motif          │        │
//! │  │  price_cents    │   │  quantity       │   │  total_amount   │        │
//! │  │  stock (>= 0)   │   │  price_cents    │   │  date_of_expense│        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐                          │
//! │  │  Prescription   │──<│  PrescriptionItem   │                          │
//! │  │  treatment_id   │   │  medication_id      │                          │
//! │  │  (UNIQUE)       │   │  quantity (>= 1)    │                          │
//! │  └─────────────────┘   └─────────────────────┘                          │
//! │                                                                         │
//! │  Patient ──< Treatment >── Doctor        Supplier ──< Procurement       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `*Expanded` aggregates at the bottom of this file are read-side views
//! assembled by the repositories; they mirror the relationship expansion the
//! dashboard expects on list/detail endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Medication
// =============================================================================

/// A medication held in stock.
///
/// `stock` is mutated exclusively through the inventory ledger
/// (delta updates inside a transaction) and is `>= 0` after every commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Medication {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the dashboard and in expense motifs.
    pub name: String,

    /// Unit price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Quantity on hand.
    pub stock: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medication {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether stock is exhausted.
    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }
}

// =============================================================================
// Procurement
// =============================================================================

/// A stock delivery (approvisionnement). Immutable after creation; deleting
/// it reverses its stock effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Procurement {
    pub id: String,
    pub medication_id: String,
    pub supplier_id: Option<String>,
    /// Delivered amount.
    pub quantity: i64,
    /// Total cost of the delivery in cents.
    pub price_cents: i64,
    pub delivery_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Procurement {
    /// Returns the total cost as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// A financial expense record. One is derived from every committed
/// procurement; it survives deletion of its owning procurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    /// Owning procurement, when the expense was derived from one.
    pub procurement_id: Option<String>,
    pub total_amount_cents: i64,
    /// Free-text reason, e.g. `Procurement of (10) Paracetamol 500mg`.
    pub motif: String,
    /// Copied from the owning procurement's delivery date.
    pub date_of_expense: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Prescription
// =============================================================================

/// A prescription (ordonnance). At most one per treatment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Prescription {
    pub id: String,
    pub treatment_id: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item nested in a prescription. Not independently addressable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PrescriptionItem {
    pub id: String,
    pub prescription_id: String,
    pub medication_id: String,
    /// Dispensed amount, always >= 1.
    pub quantity: i64,
    /// Optional per-customer price override, in cents.
    pub customer_price_cents: Option<i64>,
    /// Input order within the prescription.
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Reference Entities
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Doctor {
    pub id: String,
    pub full_name: String,
    pub speciality: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A course of care linking a patient to a doctor. Prescriptions hang off
/// treatments, one apiece.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Treatment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub diagnosis: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Read-Side Aggregates
// =============================================================================

/// A prescription together with its line items, as returned by the write
/// operations.
#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionWithItems {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub items: Vec<PrescriptionItem>,
}

/// A line item expanded with its medication (None when the medication has
/// since been deleted).
#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionItemExpanded {
    #[serde(flatten)]
    pub item: PrescriptionItem,
    pub medication: Option<Medication>,
}

/// A treatment expanded with patient and doctor details.
#[derive(Debug, Clone, Serialize)]
pub struct TreatmentExpanded {
    #[serde(flatten)]
    pub treatment: Treatment,
    pub patient: Option<Patient>,
    pub doctor: Option<Doctor>,
}

/// Full prescription view for list/detail endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionExpanded {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub items: Vec<PrescriptionItemExpanded>,
    pub treatment: Option<TreatmentExpanded>,
}

/// Procurement view with medication and supplier expansion.
#[derive(Debug, Clone, Serialize)]
pub struct ProcurementExpanded {
    #[serde(flatten)]
    pub procurement: Procurement,
    pub medication: Option<Medication>,
    pub supplier: Option<Supplier>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn medication(stock: i64) -> Medication {
        Medication {
            id: "m-1".to_string(),
            name: "Paracetamol 500mg".to_string(),
            price_cents: 250,
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_out_of_stock() {
        assert!(medication(0).is_out_of_stock());
        assert!(!medication(3).is_out_of_stock());
    }

    #[test]
    fn test_price_as_money() {
        assert_eq!(medication(0).price().cents(), 250);
    }

    #[test]
    fn test_expanded_serialization_flattens() {
        let m = medication(4);
        let now = Utc::now();
        let view = PrescriptionWithItems {
            prescription: Prescription {
                id: "p-1".to_string(),
                treatment_id: "t-1".to_string(),
                notes: None,
                created_at: now,
                updated_at: now,
            },
            items: vec![PrescriptionItem {
                id: "i-1".to_string(),
                prescription_id: "p-1".to_string(),
                medication_id: m.id.clone(),
                quantity: 2,
                customer_price_cents: None,
                position: 0,
                created_at: now,
            }],
        };

        let json = serde_json::to_value(&view).unwrap();
        // Flattened: prescription fields sit at the top level
        assert_eq!(json["id"], "p-1");
        assert_eq!(json["treatment_id"], "t-1");
        assert_eq!(json["items"][0]["quantity"], 2);
    }
}
