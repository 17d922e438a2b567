//! Medication handlers (`/medicaments`).
//!
//! Plain CRUD on medication records. Stock edits through PUT set the level
//! directly and are meant for corrections; normal stock movement goes
//! through procurements and prescriptions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use sante_core::validation::{validate_medication_name, validate_price_cents};
use sante_core::{CoreError, Medication, ValidationError};

#[derive(Debug, Deserialize)]
pub struct MedicationPayload {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

fn validate_payload(payload: &MedicationPayload) -> Result<(), ApiError> {
    validate_medication_name(&payload.name).map_err(CoreError::from)?;
    validate_price_cents(payload.price_cents).map_err(CoreError::from)?;
    if payload.stock < 0 {
        return Err(CoreError::Validation(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        })
        .into());
    }
    Ok(())
}

/// POST /medicaments
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<MedicationPayload>,
) -> ApiResult<(StatusCode, Json<Medication>)> {
    validate_payload(&payload)?;

    let medication = state
        .db
        .medications()
        .insert(payload.name.trim(), payload.price_cents, payload.stock)
        .await?;

    Ok((StatusCode::CREATED, Json(medication)))
}

/// GET /medicaments
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Medication>>> {
    Ok(Json(state.db.medications().list().await?))
}

/// GET /medicaments/finished
pub async fn list_finished(State(state): State<AppState>) -> ApiResult<Json<Vec<Medication>>> {
    Ok(Json(state.db.medications().list_out_of_stock().await?))
}

/// GET /medicaments/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Medication>> {
    let medication = state
        .db
        .medications()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::MedicationNotFound(id)))?;

    Ok(Json(medication))
}

/// PUT /medicaments/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<MedicationPayload>,
) -> ApiResult<Json<Medication>> {
    validate_payload(&payload)?;

    let medication = state
        .db
        .medications()
        .update(&id, payload.name.trim(), payload.price_cents, payload.stock)
        .await?;

    Ok(Json(medication))
}

/// DELETE /medicaments/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.medications().delete(&id).await?;
    Ok(Json(json!({ "message": "Medication deleted" })))
}
