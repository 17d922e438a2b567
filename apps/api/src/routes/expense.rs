//! Expense handlers (`/depenses`).
//!
//! Read-only: expenses are created as a side effect of procurement and are
//! never edited or deleted through the API.

use axum::extract::State;
use axum::Json;

use crate::error::ApiResult;
use crate::state::AppState;
use sante_core::Expense;

/// GET /depenses
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Expense>>> {
    Ok(Json(state.db.expenses().list().await?))
}
