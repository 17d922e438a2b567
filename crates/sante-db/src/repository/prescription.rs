//! # Prescription Repository
//!
//! Database operations for prescriptions and their line items.
//!
//! Line items are not independently addressable: every write replaces or
//! removes the full set for a prescription, inside the transaction the
//! service orchestrates. Ordering by `position` preserves the caller's input
//! order, which matters because stock validation runs incrementally over the
//! items in that order.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::treatment::TreatmentRepository;
use sante_core::{
    Medication, Prescription, PrescriptionExpanded, PrescriptionItem, PrescriptionItemExpanded,
};

/// Repository for prescription database operations.
///
/// Pool-based methods serve reads; `*_tx` associated functions serve the
/// transactional create/update/delete flows in `PrescriptionService`.
#[derive(Debug, Clone)]
pub struct PrescriptionRepository {
    pool: SqlitePool,
}

impl PrescriptionRepository {
    /// Creates a new PrescriptionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PrescriptionRepository { pool }
    }

    // =========================================================================
    // Pool-based reads
    // =========================================================================

    /// Gets a prescription by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Prescription>> {
        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            SELECT id, treatment_id, notes, created_at, updated_at
            FROM prescriptions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(prescription)
    }

    /// Finds the prescription attached to a treatment, if any.
    ///
    /// At most one row exists per treatment (UNIQUE constraint).
    pub async fn find_by_treatment(&self, treatment_id: &str) -> DbResult<Option<Prescription>> {
        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            SELECT id, treatment_id, notes, created_at, updated_at
            FROM prescriptions
            WHERE treatment_id = ?1
            "#,
        )
        .bind(treatment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(prescription)
    }

    /// Lists the line items of a prescription, in input order.
    pub async fn items(&self, prescription_id: &str) -> DbResult<Vec<PrescriptionItem>> {
        let items = sqlx::query_as::<_, PrescriptionItem>(
            r#"
            SELECT id, prescription_id, medication_id, quantity,
                   customer_price_cents, position, created_at
            FROM prescription_items
            WHERE prescription_id = ?1
            ORDER BY position
            "#,
        )
        .bind(prescription_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists all prescriptions fully expanded, newest first.
    pub async fn list_expanded(&self) -> DbResult<Vec<PrescriptionExpanded>> {
        let prescriptions = sqlx::query_as::<_, Prescription>(
            r#"
            SELECT id, treatment_id, notes, created_at, updated_at
            FROM prescriptions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut expanded = Vec::with_capacity(prescriptions.len());
        for prescription in prescriptions {
            expanded.push(self.expand(prescription).await?);
        }

        Ok(expanded)
    }

    /// Gets a prescription by ID, fully expanded.
    pub async fn get_expanded(&self, id: &str) -> DbResult<Option<PrescriptionExpanded>> {
        match self.get_by_id(id).await? {
            Some(prescription) => Ok(Some(self.expand(prescription).await?)),
            None => Ok(None),
        }
    }

    /// Gets the prescription for a treatment, fully expanded.
    pub async fn find_by_treatment_expanded(
        &self,
        treatment_id: &str,
    ) -> DbResult<Option<PrescriptionExpanded>> {
        match self.find_by_treatment(treatment_id).await? {
            Some(prescription) => Ok(Some(self.expand(prescription).await?)),
            None => Ok(None),
        }
    }

    /// Expands a prescription with its items (each with its medication, when
    /// it still exists) and its treatment context.
    async fn expand(&self, prescription: Prescription) -> DbResult<PrescriptionExpanded> {
        let items = self.items(&prescription.id).await?;

        let mut expanded_items = Vec::with_capacity(items.len());
        for item in items {
            let medication = sqlx::query_as::<_, Medication>(
                r#"
                SELECT id, name, price_cents, stock, created_at, updated_at
                FROM medications
                WHERE id = ?1
                "#,
            )
            .bind(&item.medication_id)
            .fetch_optional(&self.pool)
            .await?;

            expanded_items.push(PrescriptionItemExpanded { item, medication });
        }

        let treatment = TreatmentRepository::new(self.pool.clone())
            .get_expanded(&prescription.treatment_id)
            .await?;

        Ok(PrescriptionExpanded {
            prescription,
            items: expanded_items,
            treatment,
        })
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Gets a prescription inside a transaction.
    pub async fn get_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Prescription>> {
        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            SELECT id, treatment_id, notes, created_at, updated_at
            FROM prescriptions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(prescription)
    }

    /// Finds the prescription for a treatment inside a transaction.
    pub async fn find_by_treatment_tx(
        conn: &mut SqliteConnection,
        treatment_id: &str,
    ) -> DbResult<Option<Prescription>> {
        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            SELECT id, treatment_id, notes, created_at, updated_at
            FROM prescriptions
            WHERE treatment_id = ?1
            "#,
        )
        .bind(treatment_id)
        .fetch_optional(conn)
        .await?;

        Ok(prescription)
    }

    /// Lists line items inside a transaction, in input order.
    pub async fn items_tx(
        conn: &mut SqliteConnection,
        prescription_id: &str,
    ) -> DbResult<Vec<PrescriptionItem>> {
        let items = sqlx::query_as::<_, PrescriptionItem>(
            r#"
            SELECT id, prescription_id, medication_id, quantity,
                   customer_price_cents, position, created_at
            FROM prescription_items
            WHERE prescription_id = ?1
            ORDER BY position
            "#,
        )
        .bind(prescription_id)
        .fetch_all(conn)
        .await?;

        Ok(items)
    }

    /// Inserts a prescription row inside a transaction.
    pub async fn insert_tx(
        conn: &mut SqliteConnection,
        prescription: &Prescription,
    ) -> DbResult<()> {
        debug!(id = %prescription.id, treatment_id = %prescription.treatment_id, "Inserting prescription");

        sqlx::query(
            r#"
            INSERT INTO prescriptions (id, treatment_id, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&prescription.id)
        .bind(&prescription.treatment_id)
        .bind(&prescription.notes)
        .bind(prescription.created_at)
        .bind(prescription.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts a line item inside a transaction.
    pub async fn insert_item_tx(
        conn: &mut SqliteConnection,
        item: &PrescriptionItem,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO prescription_items (
                id, prescription_id, medication_id, quantity,
                customer_price_cents, position, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.prescription_id)
        .bind(&item.medication_id)
        .bind(item.quantity)
        .bind(item.customer_price_cents)
        .bind(item.position)
        .bind(item.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Deletes all line items of a prescription inside a transaction.
    pub async fn delete_items_tx(
        conn: &mut SqliteConnection,
        prescription_id: &str,
    ) -> DbResult<()> {
        sqlx::query("DELETE FROM prescription_items WHERE prescription_id = ?1")
            .bind(prescription_id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Updates a prescription's notes inside a transaction.
    pub async fn update_notes_tx(
        conn: &mut SqliteConnection,
        id: &str,
        notes: Option<&str>,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE prescriptions
            SET notes = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(notes)
        .bind(now)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Prescription", id));
        }

        Ok(())
    }

    /// Deletes a prescription row inside a transaction.
    ///
    /// Line items cascade via the FK; restore loops run before this call.
    pub async fn delete_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting prescription");

        let result = sqlx::query("DELETE FROM prescriptions WHERE id = ?1")
            .bind(id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Prescription", id));
        }

        Ok(())
    }
}
