//! # Prescription Service
//!
//! Transactional orchestration of prescriptions (ordonnances) and their
//! stock effects.
//!
//! ## Incremental Stock Validation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Items: [ {med A, qty 3}, {med A, qty 4} ]      stock of A: 5           │
//! │                                                                         │
//! │  item 1: read stock → 5, 3 <= 5  → decrement → stock 2                  │
//! │  item 2: read stock → 2, 4 >  2  → InsufficientStock → ROLLBACK         │
//! │                                                                         │
//! │  Each line item is validated against the stock left over after the      │
//! │  items before it, because every read runs on the transaction            │
//! │  connection and sees its own uncommitted decrements.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Update replaces the full line item set: restore the old items' stock,
//! delete them, then apply the new items with the same incremental
//! validation. Delete restores and removes. Restores silently skip line
//! items whose medication has been deleted since.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::medication::MedicationRepository;
use crate::repository::prescription::PrescriptionRepository;
use crate::repository::treatment::TreatmentRepository;
use crate::service::ServiceResult;
use sante_core::validation::validate_required_id;
use sante_core::{CoreError, Prescription, PrescriptionItem, PrescriptionWithItems};

/// One requested line item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLineItem {
    pub medication_id: String,
    pub quantity: i64,
    /// Optional per-customer price override, in cents.
    pub customer_price_cents: Option<i64>,
}

/// Input for creating a prescription.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPrescription {
    pub treatment_id: String,
    pub notes: Option<String>,
    pub items: Vec<NewLineItem>,
}

/// Input for updating a prescription. The item list fully replaces the
/// existing one.
#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionUpdate {
    pub notes: Option<String>,
    pub items: Vec<NewLineItem>,
}

/// Transactional service for prescription operations.
///
/// ## Usage
/// ```rust,ignore
/// let service = PrescriptionService::new(pool);
/// let created = service.create(new_prescription).await?;
/// let updated = service.update(&created.prescription.id, update).await?;
/// service.delete(&created.prescription.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PrescriptionService {
    pool: SqlitePool,
}

impl PrescriptionService {
    /// Creates a new PrescriptionService.
    pub fn new(pool: SqlitePool) -> Self {
        PrescriptionService { pool }
    }

    /// Creates a prescription and decrements stock for every line item, in
    /// one transaction.
    ///
    /// ## Errors
    /// * `CoreError::TreatmentNotFound` - Unknown treatment id
    /// * `CoreError::DuplicatePrescription` - The treatment already has one
    /// * `CoreError::EmptyLineItems` - No items supplied
    /// * `CoreError::MedicationNotFound` - A line item references an unknown
    ///   medication
    /// * `CoreError::InsufficientStock` - A line item exceeds the stock left
    ///   over after the items before it
    pub async fn create(&self, input: NewPrescription) -> ServiceResult<PrescriptionWithItems> {
        validate_required_id("treatment_id", Some(&input.treatment_id))
            .map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        TreatmentRepository::get_tx(&mut tx, &input.treatment_id)
            .await?
            .ok_or_else(|| CoreError::TreatmentNotFound(input.treatment_id.clone()))?;

        // Uniqueness is reported before item validation: a request that is
        // both duplicate and malformed surfaces the conflict.
        if PrescriptionRepository::find_by_treatment_tx(&mut tx, &input.treatment_id)
            .await?
            .is_some()
        {
            return Err(CoreError::DuplicatePrescription {
                treatment_id: input.treatment_id,
            }
            .into());
        }

        validate_items_shape(&input.items)?;

        let now = Utc::now();
        let prescription = Prescription {
            id: Uuid::new_v4().to_string(),
            treatment_id: input.treatment_id,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        PrescriptionRepository::insert_tx(&mut tx, &prescription).await?;

        let items = apply_line_items(&mut tx, &prescription.id, &input.items).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            id = %prescription.id,
            treatment_id = %prescription.treatment_id,
            items = items.len(),
            "Prescription created"
        );

        Ok(PrescriptionWithItems {
            prescription,
            items,
        })
    }

    /// Updates a prescription, replacing its line items.
    ///
    /// Restores the stock of the existing items, deletes them, then applies
    /// the new item list with incremental validation. All in one
    /// transaction: a failing new item leaves the prescription exactly as
    /// before.
    pub async fn update(
        &self,
        id: &str,
        input: PrescriptionUpdate,
    ) -> ServiceResult<PrescriptionWithItems> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let prescription = PrescriptionRepository::get_tx(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::PrescriptionNotFound(id.to_string()))?;

        validate_items_shape(&input.items)?;

        restore_line_items(&mut tx, &prescription.id).await?;
        PrescriptionRepository::delete_items_tx(&mut tx, &prescription.id).await?;
        PrescriptionRepository::update_notes_tx(&mut tx, &prescription.id, input.notes.as_deref())
            .await?;

        let items = apply_line_items(&mut tx, &prescription.id, &input.items).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %id, items = items.len(), "Prescription updated");

        Ok(PrescriptionWithItems {
            prescription: Prescription {
                notes: input.notes,
                updated_at: Utc::now(),
                ..prescription
            },
            items,
        })
    }

    /// Deletes a prescription, restoring the stock of its line items.
    ///
    /// Line items whose medication was deleted since are skipped silently.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let prescription = PrescriptionRepository::get_tx(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::PrescriptionNotFound(id.to_string()))?;

        restore_line_items(&mut tx, &prescription.id).await?;
        PrescriptionRepository::delete_tx(&mut tx, &prescription.id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %id, "Prescription deleted");
        Ok(())
    }
}

/// Shape checks that need no database access.
fn validate_items_shape(items: &[NewLineItem]) -> ServiceResult<()> {
    if items.is_empty() {
        return Err(CoreError::EmptyLineItems.into());
    }

    for item in items {
        validate_required_id("medication_id", Some(&item.medication_id))
            .map_err(CoreError::from)?;
    }

    Ok(())
}

/// Validates and applies line items in input order: read stock, check,
/// decrement, insert row. Runs on the transaction connection so item *k*
/// sees the decrements of items 1..k-1.
async fn apply_line_items(
    conn: &mut SqliteConnection,
    prescription_id: &str,
    items: &[NewLineItem],
) -> ServiceResult<Vec<PrescriptionItem>> {
    let mut inserted = Vec::with_capacity(items.len());

    for (position, item) in items.iter().enumerate() {
        let medication = MedicationRepository::get_tx(conn, &item.medication_id)
            .await?
            .ok_or_else(|| CoreError::MedicationNotFound(item.medication_id.clone()))?;

        if item.quantity < 1 {
            return Err(CoreError::InvalidQuantity {
                name: medication.name,
                quantity: item.quantity,
            }
            .into());
        }

        if medication.stock < item.quantity {
            return Err(CoreError::InsufficientStock {
                name: medication.name,
                available: medication.stock,
                requested: item.quantity,
            }
            .into());
        }

        MedicationRepository::adjust_stock(conn, &item.medication_id, -item.quantity).await?;

        let row = PrescriptionItem {
            id: Uuid::new_v4().to_string(),
            prescription_id: prescription_id.to_string(),
            medication_id: item.medication_id.clone(),
            quantity: item.quantity,
            customer_price_cents: item.customer_price_cents,
            position: position as i64,
            created_at: Utc::now(),
        };
        PrescriptionRepository::insert_item_tx(conn, &row).await?;
        inserted.push(row);
    }

    Ok(inserted)
}

/// Restores the stock held by a prescription's current line items.
/// Deleted medications are skipped without error.
async fn restore_line_items(conn: &mut SqliteConnection, prescription_id: &str) -> ServiceResult<()> {
    let items = PrescriptionRepository::items_tx(conn, prescription_id).await?;

    for item in items {
        let restored =
            MedicationRepository::restore_stock(conn, &item.medication_id, item.quantity).await?;
        if !restored {
            debug!(
                medication_id = %item.medication_id,
                quantity = item.quantity,
                "Skipping stock restore for deleted medication"
            );
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::service::ServiceError;
    use sante_core::Medication;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Seeds a patient + treatment and returns the treatment id.
    async fn seed_treatment(db: &Database) -> String {
        let patient = db
            .treatments()
            .insert_patient("Fatima Zahra", None)
            .await
            .unwrap();
        let treatment = db
            .treatments()
            .insert(&patient.id, None, Some("Angina"))
            .await
            .unwrap();
        treatment.id
    }

    async fn seed_medication(db: &Database, name: &str, stock: i64) -> Medication {
        db.medications().insert(name, 250, stock).await.unwrap()
    }

    fn line(medication_id: &str, quantity: i64) -> NewLineItem {
        NewLineItem {
            medication_id: medication_id.to_string(),
            quantity,
            customer_price_cents: None,
        }
    }

    #[tokio::test]
    async fn test_create_decrements_stock_per_item() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;
        let b = seed_medication(&db, "Ibuprofen", 4).await;

        let created = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: Some("After meals".to_string()),
                items: vec![line(&a.id, 3), line(&b.id, 4)],
            })
            .await
            .unwrap();

        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[0].position, 0);
        assert_eq!(created.items[1].position, 1);

        let a = db.medications().get_by_id(&a.id).await.unwrap().unwrap();
        let b = db.medications().get_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 7);
        assert_eq!(b.stock, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_second_prescription_for_treatment() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;

        db.prescription_service()
            .create(NewPrescription {
                treatment_id: treatment_id.clone(),
                notes: None,
                items: vec![line(&a.id, 1)],
            })
            .await
            .unwrap();

        let err = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![line(&a.id, 1)],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::DuplicatePrescription { .. })
        ));

        // The duplicate attempt must not have touched stock
        let a = db.medications().get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 9);
    }

    #[tokio::test]
    async fn test_create_accepts_large_quantity_within_stock() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Serum", 5000).await;

        // No per-line cap: anything covered by stock goes through
        let created = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![line(&a.id, 1000)],
            })
            .await
            .unwrap();

        assert_eq!(created.items[0].quantity, 1000);

        let a = db.medications().get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 4000);
    }

    #[tokio::test]
    async fn test_duplicate_reported_before_item_validation() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;

        db.prescription_service()
            .create(NewPrescription {
                treatment_id: treatment_id.clone(),
                notes: None,
                items: vec![line(&a.id, 1)],
            })
            .await
            .unwrap();

        // Duplicate AND empty items: the conflict wins
        let err = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::DuplicatePrescription { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_requires_line_items() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;

        let err = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Core(CoreError::EmptyLineItems)));
    }

    #[tokio::test]
    async fn test_create_unknown_treatment() {
        let db = test_db().await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;

        let err = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id: "no-such-treatment".to_string(),
                notes: None,
                items: vec![line(&a.id, 1)],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::TreatmentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_request_restores_earlier_decrements() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;
        let b = seed_medication(&db, "Ibuprofen", 2).await;

        // Item 1 would succeed; item 2 exceeds stock; the rollback must undo
        // item 1's decrement.
        let err = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![line(&a.id, 5), line(&b.id, 3)],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InsufficientStock { .. })
        ));

        let a = db.medications().get_by_id(&a.id).await.unwrap().unwrap();
        let b = db.medications().get_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 10);
        assert_eq!(b.stock, 2);
    }

    #[tokio::test]
    async fn test_incremental_validation_within_one_request() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 5).await;

        // 3 + 4 > 5: the second line must see only the 2 units left after
        // the first.
        let err = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![line(&a.id, 3), line(&a.id, 4)],
            })
            .await
            .unwrap_err();

        match err {
            ServiceError::Core(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 4);
            }
            other => panic!("unexpected error: {other}"),
        }

        let a = db.medications().get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 5);
    }

    #[tokio::test]
    async fn test_update_replaces_items_and_rebalances_stock() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;
        let b = seed_medication(&db, "Ibuprofen", 10).await;

        let created = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![line(&a.id, 4)],
            })
            .await
            .unwrap();

        let updated = db
            .prescription_service()
            .update(
                &created.prescription.id,
                PrescriptionUpdate {
                    notes: Some("Switched".to_string()),
                    items: vec![line(&b.id, 2)],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].medication_id, b.id);

        // a restored in full, b decremented
        let a = db.medications().get_by_id(&a.id).await.unwrap().unwrap();
        let b = db.medications().get_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 10);
        assert_eq!(b.stock, 8);
    }

    #[tokio::test]
    async fn test_update_nets_against_restored_stock() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;

        let created = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![line(&a.id, 2)],
            })
            .await
            .unwrap();

        // Old 2 restored, then 5 applied: net decrement of 5 from the
        // pre-create level.
        db.prescription_service()
            .update(
                &created.prescription.id,
                PrescriptionUpdate {
                    notes: None,
                    items: vec![line(&a.id, 5)],
                },
            )
            .await
            .unwrap();

        let a = db.medications().get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 5);
    }

    #[tokio::test]
    async fn test_update_failure_leaves_prescription_untouched() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;
        let b = seed_medication(&db, "Ibuprofen", 1).await;

        let created = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![line(&a.id, 4)],
            })
            .await
            .unwrap();

        let err = db
            .prescription_service()
            .update(
                &created.prescription.id,
                PrescriptionUpdate {
                    notes: None,
                    items: vec![line(&b.id, 5)],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InsufficientStock { .. })
        ));

        // Old items and stock state fully intact
        let items = db.prescriptions().items(&created.prescription.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].medication_id, a.id);

        let a = db.medications().get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 6);
    }

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;

        let created = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![line(&a.id, 7)],
            })
            .await
            .unwrap();

        db.prescription_service()
            .delete(&created.prescription.id)
            .await
            .unwrap();

        let a = db.medications().get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(a.stock, 10);

        assert!(db
            .prescriptions()
            .get_by_id(&created.prescription.id)
            .await
            .unwrap()
            .is_none());
        assert!(db
            .prescriptions()
            .items(&created.prescription.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_skips_restore_for_deleted_medication() {
        let db = test_db().await;
        let treatment_id = seed_treatment(&db).await;
        let a = seed_medication(&db, "Amoxicillin", 10).await;
        let b = seed_medication(&db, "Ibuprofen", 10).await;

        let created = db
            .prescription_service()
            .create(NewPrescription {
                treatment_id,
                notes: None,
                items: vec![line(&a.id, 2), line(&b.id, 3)],
            })
            .await
            .unwrap();

        db.medications().delete(&a.id).await.unwrap();

        // Succeeds: a's restore is skipped, b's applies
        db.prescription_service()
            .delete(&created.prescription.id)
            .await
            .unwrap();

        assert!(db.medications().get_by_id(&a.id).await.unwrap().is_none());
        let b = db.medications().get_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(b.stock, 10);
    }

    #[tokio::test]
    async fn test_delete_unknown_prescription() {
        let db = test_db().await;

        let err = db.prescription_service().delete("missing").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::PrescriptionNotFound(_))
        ));
    }
}
