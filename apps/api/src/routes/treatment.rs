//! Treatment handlers (`/traitements`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use sante_core::validation::validate_required_id;
use sante_core::{CoreError, Treatment, TreatmentExpanded};

#[derive(Debug, Deserialize)]
pub struct NewTreatment {
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub diagnosis: Option<String>,
}

/// POST /traitements
///
/// The patient must already exist; an unknown patient id surfaces as a
/// foreign key violation (400).
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewTreatment>,
) -> ApiResult<(StatusCode, Json<Treatment>)> {
    validate_required_id("patient_id", Some(&payload.patient_id)).map_err(CoreError::from)?;

    let treatment = state
        .db
        .treatments()
        .insert(
            &payload.patient_id,
            payload.doctor_id.as_deref(),
            payload.diagnosis.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(treatment)))
}

/// GET /traitements
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Treatment>>> {
    Ok(Json(state.db.treatments().list().await?))
}

/// GET /traitements/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TreatmentExpanded>> {
    let treatment = state
        .db
        .treatments()
        .get_expanded(&id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::TreatmentNotFound(id)))?;

    Ok(Json(treatment))
}
