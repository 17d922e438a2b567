//! # Medication Repository
//!
//! Database operations for medications, including the stock ledger.
//!
//! ## Stock Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: Absolute update (loses concurrent writes)                   │
//! │     UPDATE medications SET stock = 7 WHERE id = ?                      │
//! │                                                                         │
//! │  ✅ CORRECT: Delta update                                              │
//! │     UPDATE medications SET stock = stock + ?delta                      │
//! │                                                                         │
//! │  Procurement of 10:          delta = +10                               │
//! │  Prescription line of 3:     delta = -3                                │
//! │  Prescription deleted:       delta = +3 (restore)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Negative deltas are validated by the calling service against a fresh read
//! inside the same transaction. The repository itself applies deltas blindly;
//! the `CHECK (stock >= 0)` constraint is only a backstop.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use sante_core::Medication;

/// Repository for medication database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = MedicationRepository::new(pool);
///
/// // List all medications, newest first
/// let meds = repo.list().await?;
///
/// // Get by ID
/// let med = repo.get_by_id("uuid-here").await?;
/// ```
///
/// The associated `*_tx` functions take a `&mut SqliteConnection` so the
/// transactional services can run ledger operations inside one transaction.
#[derive(Debug, Clone)]
pub struct MedicationRepository {
    pool: SqlitePool,
}

impl MedicationRepository {
    /// Creates a new MedicationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicationRepository { pool }
    }

    // =========================================================================
    // Pool-based CRUD
    // =========================================================================

    /// Lists all medications, newest first.
    pub async fn list(&self) -> DbResult<Vec<Medication>> {
        let medications = sqlx::query_as::<_, Medication>(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM medications
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(medications)
    }

    /// Lists medications whose stock has reached zero.
    pub async fn list_out_of_stock(&self) -> DbResult<Vec<Medication>> {
        let medications = sqlx::query_as::<_, Medication>(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM medications
            WHERE stock <= 0
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(medications)
    }

    /// Gets a medication by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Medication))` - Medication found
    /// * `Ok(None)` - Medication not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Medication>> {
        let medication = sqlx::query_as::<_, Medication>(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM medications
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(medication)
    }

    /// Inserts a new medication and returns it.
    ///
    /// Generates the ID and timestamps here so callers only supply the
    /// business fields.
    pub async fn insert(&self, name: &str, price_cents: i64, stock: i64) -> DbResult<Medication> {
        debug!(name = %name, "Inserting medication");

        let now = Utc::now();
        let medication = Medication {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents,
            stock,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO medications (id, name, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&medication.id)
        .bind(&medication.name)
        .bind(medication.price_cents)
        .bind(medication.stock)
        .bind(medication.created_at)
        .bind(medication.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(medication)
    }

    /// Updates a medication's name, price and stock.
    ///
    /// ## Returns
    /// * `Ok(Medication)` - The updated row
    /// * `Err(DbError::NotFound)` - Medication doesn't exist
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        price_cents: i64,
        stock: i64,
    ) -> DbResult<Medication> {
        debug!(id = %id, "Updating medication");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE medications
            SET name = ?2, price_cents = ?3, stock = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(price_cents)
        .bind(stock)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medication", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Medication", id))
    }

    /// Deletes a medication.
    ///
    /// Historical procurement and prescription line rows keep their dangling
    /// `medication_id`; restore loops treat those as already-gone stock.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting medication");

        let result = sqlx::query("DELETE FROM medications WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medication", id));
        }

        Ok(())
    }

    /// Counts medications (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medications")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped ledger operations
    // =========================================================================

    /// Gets a medication inside a transaction.
    ///
    /// Reads through the transaction connection so the value reflects earlier
    /// uncommitted writes of the same operation.
    pub async fn get_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Medication>> {
        let medication = sqlx::query_as::<_, Medication>(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM medications
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(medication)
    }

    /// Applies a stock delta inside a transaction and returns the updated row.
    ///
    /// ## Arguments
    /// * `delta` - Change in stock: positive for procurement, negative for a
    ///   prescription line
    ///
    /// ## Returns
    /// * `Ok(Medication)` - The row after the delta
    /// * `Err(DbError::NotFound)` - Medication doesn't exist
    pub async fn adjust_stock(
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
    ) -> DbResult<Medication> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE medications
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medication", id));
        }

        Self::get_tx(conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Medication", id))
    }

    /// Restores stock inside a transaction, skipping deleted medications.
    ///
    /// Unlike [`adjust_stock`](Self::adjust_stock), a missing medication is
    /// not an error: restore loops walk historical line items whose
    /// medication may have been deleted since, and those rows are skipped.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock restored
    /// * `Ok(false)` - Medication no longer exists, nothing to restore
    pub async fn restore_stock(
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, delta = %delta, "Restoring stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE medications
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
