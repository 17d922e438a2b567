//! Procurement handlers (`/approvisonements`).
//!
//! Creation and deletion go through `ProcurementService` so the stock
//! mutation, the procurement row and the derived expense commit or roll
//! back together.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use sante_core::{CoreError, ProcurementExpanded};
use sante_db::NewProcurement;

/// POST /approvisonements
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewProcurement>,
) -> ApiResult<(StatusCode, Json<ProcurementExpanded>)> {
    let created = state.db.procurement_service().create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /approvisonements
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ProcurementExpanded>>> {
    Ok(Json(state.db.procurements().list_expanded().await?))
}

/// GET /approvisonements/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProcurementExpanded>> {
    let procurement = state
        .db
        .procurements()
        .get_expanded(&id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::ProcurementNotFound(id)))?;

    Ok(Json(procurement))
}

/// DELETE /approvisonements/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.procurement_service().delete(&id).await?;
    Ok(Json(json!({ "message": "Procurement deleted" })))
}
