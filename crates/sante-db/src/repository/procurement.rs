//! # Procurement Repository
//!
//! Database operations for procurement rows and their suppliers.
//!
//! Procurement rows are history: they record a stock intake that already
//! happened. The stock mutation itself goes through the medication ledger,
//! orchestrated by `ProcurementService`. This repository only reads and
//! writes the rows.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use sante_core::{Procurement, ProcurementExpanded, Supplier};

/// Repository for procurement database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProcurementRepository::new(pool);
///
/// // Expanded listing for the dashboard, newest first
/// let rows = repo.list_expanded().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProcurementRepository {
    pool: SqlitePool,
}

impl ProcurementRepository {
    /// Creates a new ProcurementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProcurementRepository { pool }
    }

    // =========================================================================
    // Pool-based reads
    // =========================================================================

    /// Gets a procurement by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Procurement>> {
        let procurement = sqlx::query_as::<_, Procurement>(
            r#"
            SELECT id, medication_id, supplier_id, quantity, price_cents,
                   delivery_date, notes, created_at
            FROM procurements
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(procurement)
    }

    /// Lists all procurements with medication and supplier expanded,
    /// newest first.
    ///
    /// Either reference may be `None`: medications can be deleted after the
    /// fact (no FK holds the row), and supplier is optional to begin with.
    pub async fn list_expanded(&self) -> DbResult<Vec<ProcurementExpanded>> {
        let procurements = sqlx::query_as::<_, Procurement>(
            r#"
            SELECT id, medication_id, supplier_id, quantity, price_cents,
                   delivery_date, notes, created_at
            FROM procurements
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut expanded = Vec::with_capacity(procurements.len());
        for procurement in procurements {
            expanded.push(self.expand(procurement).await?);
        }

        Ok(expanded)
    }

    /// Gets a procurement by ID with medication and supplier expanded.
    pub async fn get_expanded(&self, id: &str) -> DbResult<Option<ProcurementExpanded>> {
        match self.get_by_id(id).await? {
            Some(procurement) => Ok(Some(self.expand(procurement).await?)),
            None => Ok(None),
        }
    }

    async fn expand(&self, procurement: Procurement) -> DbResult<ProcurementExpanded> {
        let medication = sqlx::query_as::<_, sante_core::Medication>(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM medications
            WHERE id = ?1
            "#,
        )
        .bind(&procurement.medication_id)
        .fetch_optional(&self.pool)
        .await?;

        let supplier = match &procurement.supplier_id {
            Some(supplier_id) => self.get_supplier(supplier_id).await?,
            None => None,
        };

        Ok(ProcurementExpanded {
            procurement,
            medication,
            supplier,
        })
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Gets a procurement inside a transaction.
    pub async fn get_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Procurement>> {
        let procurement = sqlx::query_as::<_, Procurement>(
            r#"
            SELECT id, medication_id, supplier_id, quantity, price_cents,
                   delivery_date, notes, created_at
            FROM procurements
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(procurement)
    }

    /// Inserts a procurement row inside a transaction.
    pub async fn insert_tx(
        conn: &mut SqliteConnection,
        procurement: &Procurement,
    ) -> DbResult<()> {
        debug!(id = %procurement.id, medication_id = %procurement.medication_id, "Inserting procurement");

        sqlx::query(
            r#"
            INSERT INTO procurements (
                id, medication_id, supplier_id, quantity, price_cents,
                delivery_date, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&procurement.id)
        .bind(&procurement.medication_id)
        .bind(&procurement.supplier_id)
        .bind(procurement.quantity)
        .bind(procurement.price_cents)
        .bind(procurement.delivery_date)
        .bind(&procurement.notes)
        .bind(procurement.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Deletes a procurement row inside a transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Procurement doesn't exist
    pub async fn delete_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting procurement");

        let result = sqlx::query("DELETE FROM procurements WHERE id = ?1")
            .bind(id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Procurement", id));
        }

        Ok(())
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    /// Gets a supplier by its ID.
    pub async fn get_supplier(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact, created_at
            FROM suppliers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Inserts a new supplier and returns it.
    pub async fn insert_supplier(&self, name: &str, contact: Option<&str>) -> DbResult<Supplier> {
        debug!(name = %name, "Inserting supplier");

        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            contact: contact.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, contact, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }
}
