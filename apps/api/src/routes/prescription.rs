//! Prescription handlers (`/ordonnances`).
//!
//! The dashboard deletes prescriptions via `POST /ordonnances/{id}` rather
//! than DELETE; the route is kept as-is. All writes go through
//! `PrescriptionService` transactions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use sante_core::{CoreError, PrescriptionExpanded, PrescriptionWithItems};
use sante_db::{NewPrescription, PrescriptionUpdate};

/// POST /ordonnances
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewPrescription>,
) -> ApiResult<(StatusCode, Json<PrescriptionWithItems>)> {
    let created = state.db.prescription_service().create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /ordonnances
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PrescriptionExpanded>>> {
    Ok(Json(state.db.prescriptions().list_expanded().await?))
}

/// GET /ordonnances/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PrescriptionExpanded>> {
    let prescription = state
        .db
        .prescriptions()
        .get_expanded(&id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::PrescriptionNotFound(id)))?;

    Ok(Json(prescription))
}

/// PUT /ordonnances/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PrescriptionUpdate>,
) -> ApiResult<Json<PrescriptionWithItems>> {
    let updated = state.db.prescription_service().update(&id, payload).await?;
    Ok(Json(updated))
}

/// POST /ordonnances/{id} (delete-style)
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.prescription_service().delete(&id).await?;
    Ok(Json(json!({ "message": "Prescription deleted" })))
}

/// GET /ordonnances/treatement/{treatment_id}
///
/// Returns the prescriptions attached to a treatment (zero or one, given
/// the uniqueness rule), each fully expanded. 404 for an unknown treatment.
pub async fn list_by_treatment(
    State(state): State<AppState>,
    Path(treatment_id): Path<String>,
) -> ApiResult<Json<Vec<PrescriptionExpanded>>> {
    state
        .db
        .treatments()
        .get_by_id(&treatment_id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::TreatmentNotFound(treatment_id.clone())))?;

    let prescriptions = state
        .db
        .prescriptions()
        .find_by_treatment_expanded(&treatment_id)
        .await?
        .into_iter()
        .collect();

    Ok(Json(prescriptions))
}
