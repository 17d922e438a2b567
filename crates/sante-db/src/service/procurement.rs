//! # Procurement Service
//!
//! Transactional orchestration of stock intake (approvisionnement).
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProcurementService::create                                             │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. read medication          (unknown id → MedicationNotFound)        │
//! │    2. stock += quantity        (ledger delta)                           │
//! │    3. insert procurement row                                            │
//! │    4. insert derived expense   (motif "Procurement of (N) <name>")      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls back all four steps; there is no state where the     │
//! │  stock moved but the expense is missing, or vice versa.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deleting a procurement reverses its stock effect but keeps the expense:
//! the money was spent whether or not the intake record survives.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::expense::ExpenseRepository;
use crate::repository::medication::MedicationRepository;
use crate::repository::procurement::ProcurementRepository;
use crate::service::ServiceResult;
use sante_core::validation::{validate_price_cents, validate_quantity, validate_required_id};
use sante_core::{CoreError, Expense, Procurement, ProcurementExpanded, Supplier};

/// Input for creating a procurement.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProcurement {
    pub medication_id: String,
    pub supplier_id: Option<String>,
    /// Delivered amount, added to stock on commit.
    pub quantity: i64,
    /// Total cost of the delivery in cents.
    pub price_cents: i64,
    pub delivery_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Transactional service for procurement operations.
///
/// ## Usage
/// ```rust,ignore
/// let service = ProcurementService::new(pool);
/// let created = service.create(new_procurement).await?;
/// service.delete(&created.procurement.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProcurementService {
    pool: SqlitePool,
}

impl ProcurementService {
    /// Creates a new ProcurementService.
    pub fn new(pool: SqlitePool) -> Self {
        ProcurementService { pool }
    }

    /// Creates a procurement: stock increment, procurement row and derived
    /// expense, all in one transaction.
    ///
    /// ## Returns
    /// The created procurement with medication and supplier expanded.
    ///
    /// ## Errors
    /// * `CoreError::MedicationNotFound` - Unknown medication id
    /// * `CoreError::Validation` - Missing id, non-positive quantity,
    ///   negative price
    pub async fn create(&self, input: NewProcurement) -> ServiceResult<ProcurementExpanded> {
        validate_required_id("medication_id", Some(&input.medication_id))
            .map_err(CoreError::from)?;
        validate_quantity(input.quantity).map_err(CoreError::from)?;
        validate_price_cents(input.price_cents).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let medication = MedicationRepository::get_tx(&mut tx, &input.medication_id)
            .await?
            .ok_or_else(|| CoreError::MedicationNotFound(input.medication_id.clone()))?;

        debug!(
            medication = %medication.name,
            quantity = input.quantity,
            "Applying procurement stock increment"
        );

        let medication =
            MedicationRepository::adjust_stock(&mut tx, &input.medication_id, input.quantity)
                .await?;

        let now = Utc::now();
        let procurement = Procurement {
            id: Uuid::new_v4().to_string(),
            medication_id: input.medication_id.clone(),
            supplier_id: input.supplier_id.clone(),
            quantity: input.quantity,
            price_cents: input.price_cents,
            delivery_date: input.delivery_date,
            notes: input.notes.clone(),
            created_at: now,
        };
        ProcurementRepository::insert_tx(&mut tx, &procurement).await?;

        // Derived expense: total is the procurement cost, date follows the
        // delivery date rather than the insertion time.
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            procurement_id: Some(procurement.id.clone()),
            total_amount_cents: input.price_cents,
            motif: format!("Procurement of ({}) {}", input.quantity, medication.name),
            date_of_expense: input.delivery_date,
            created_at: now,
        };
        ExpenseRepository::insert_tx(&mut tx, &expense).await?;

        let supplier = match &input.supplier_id {
            Some(supplier_id) => {
                sqlx::query_as::<_, Supplier>(
                    "SELECT id, name, contact, created_at FROM suppliers WHERE id = ?1",
                )
                .bind(supplier_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?
            }
            None => None,
        };

        tx.commit().await.map_err(DbError::from)?;

        info!(
            id = %procurement.id,
            medication = %medication.name,
            quantity = procurement.quantity,
            "Procurement created"
        );

        Ok(ProcurementExpanded {
            procurement,
            medication: Some(medication),
            supplier,
        })
    }

    /// Deletes a procurement and reverses its stock effect.
    ///
    /// ## Behaviour
    /// * The reversal is pre-validated: if subtracting the procured quantity
    ///   would drive stock below zero (the units were dispensed since),
    ///   the whole operation fails with `InsufficientStock` and nothing
    ///   changes.
    /// * If the medication was deleted since, the reversal is skipped
    ///   silently and only the procurement row is removed.
    /// * The derived expense is kept either way.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let procurement = ProcurementRepository::get_tx(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProcurementNotFound(id.to_string()))?;

        match MedicationRepository::get_tx(&mut tx, &procurement.medication_id).await? {
            Some(medication) => {
                if medication.stock < procurement.quantity {
                    return Err(CoreError::InsufficientStock {
                        name: medication.name,
                        available: medication.stock,
                        requested: procurement.quantity,
                    }
                    .into());
                }
                MedicationRepository::adjust_stock(
                    &mut tx,
                    &procurement.medication_id,
                    -procurement.quantity,
                )
                .await?;
            }
            None => {
                // Medication deleted since the intake; nothing to reverse.
                debug!(
                    medication_id = %procurement.medication_id,
                    "Skipping stock reversal for deleted medication"
                );
            }
        }

        ProcurementRepository::delete_tx(&mut tx, id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %id, "Procurement deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
