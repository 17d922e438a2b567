//! # Expense Repository
//!
//! Database operations for expense rows.
//!
//! Expenses are mostly written as a side effect of procurement creation (one
//! expense per procurement, inside the same transaction). They are never
//! deleted: when a procurement is reversed, its expense stays as a financial
//! record with a dangling `procurement_id`.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use sante_core::Expense;

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Lists all expenses, newest first.
    pub async fn list(&self) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, procurement_id, total_amount_cents, motif,
                   date_of_expense, created_at
            FROM expenses
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Gets an expense by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, procurement_id, total_amount_cents, motif,
                   date_of_expense, created_at
            FROM expenses
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Finds the expense attached to a procurement, if any.
    pub async fn find_by_procurement(&self, procurement_id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, procurement_id, total_amount_cents, motif,
                   date_of_expense, created_at
            FROM expenses
            WHERE procurement_id = ?1
            "#,
        )
        .bind(procurement_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Inserts an expense row inside a transaction.
    pub async fn insert_tx(conn: &mut SqliteConnection, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, motif = %expense.motif, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, procurement_id, total_amount_cents, motif,
                date_of_expense, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.procurement_id)
        .bind(expense.total_amount_cents)
        .bind(&expense.motif)
        .bind(expense.date_of_expense)
        .bind(expense.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }
}
