//! # Route Definitions
//!
//! The full HTTP surface, grouped per resource.
//!
//! ## Endpoints
//! ```text
//! POST   /medicaments                        create medication
//! GET    /medicaments                        list medications
//! GET    /medicaments/finished               list out-of-stock medications
//! GET    /medicaments/{id}                   get medication
//! PUT    /medicaments/{id}                   update medication
//! DELETE /medicaments/{id}                   delete medication
//!
//! POST   /approvisonements                   create procurement (stock +, expense)
//! GET    /approvisonements                   list procurements (expanded)
//! GET    /approvisonements/{id}              get procurement (expanded)
//! DELETE /approvisonements/{id}              delete procurement (stock reversal)
//!
//! POST   /ordonnances                        create prescription (stock -)
//! GET    /ordonnances                        list prescriptions (expanded)
//! GET    /ordonnances/{id}                   get prescription (expanded)
//! PUT    /ordonnances/{id}                   update prescription (replace items)
//! POST   /ordonnances/{id}                   delete prescription (stock restore)
//! GET    /ordonnances/treatement/{id}        prescriptions for a treatment
//!
//! GET    /depenses                           list expenses
//! POST   /traitements                        create treatment
//! GET    /traitements                        list treatments
//! GET    /traitements/{id}                   get treatment (expanded)
//! GET    /health                             liveness probe
//! ```
//!
//! The misspelled segments (`approvisonements`, `treatement`) are what the
//! dashboard requests; they are kept verbatim.

pub mod expense;
pub mod medication;
pub mod prescription;
pub mod procurement;
pub mod treatment;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{extract::State, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Medications
        .route(
            "/medicaments",
            post(medication::create).get(medication::list),
        )
        .route("/medicaments/finished", get(medication::list_finished))
        .route(
            "/medicaments/{id}",
            get(medication::get_one)
                .put(medication::update)
                .delete(medication::delete),
        )
        // Procurements
        .route(
            "/approvisonements",
            post(procurement::create).get(procurement::list),
        )
        .route(
            "/approvisonements/{id}",
            get(procurement::get_one).delete(procurement::delete),
        )
        // Prescriptions; POST on /{id} is the dashboard's delete
        .route(
            "/ordonnances",
            post(prescription::create).get(prescription::list),
        )
        .route(
            "/ordonnances/{id}",
            get(prescription::get_one)
                .put(prescription::update)
                .post(prescription::delete),
        )
        .route(
            "/ordonnances/treatement/{treatment_id}",
            get(prescription::list_by_treatment),
        )
        // Expenses
        .route("/depenses", get(expense::list))
        // Treatments
        .route(
            "/traitements",
            post(treatment::create).get(treatment::list),
        )
        .route("/traitements/{id}", get(treatment::get_one))
        // Health
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe: 200 when the database pool answers.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use sante_db::{Database, DbConfig};
    use tower::ServiceExt;

    async fn test_app() -> (Router, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let app = router(AppState::new(db.clone()));
        (app, db)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(json_body) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json_body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_medication(app: &Router, name: &str, stock: i64) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/medicaments",
            Some(json!({ "name": name, "price_cents": 250, "stock": stock })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_treatment(app: &Router, db: &Database) -> String {
        let patient = db
            .treatments()
            .insert_patient("Omar Tazi", None)
            .await
            .unwrap();
        let (status, body) = send(
            app,
            "POST",
            "/traitements",
            Some(json!({ "patient_id": patient.id, "diagnosis": "Flu" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _db) = test_app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_medication_crud() {
        let (app, _db) = test_app().await;

        let id = create_medication(&app, "Paracetamol 500mg", 10).await;

        let (status, body) = send(&app, "GET", &format!("/medicaments/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Paracetamol 500mg");
        assert_eq!(body["stock"], 10);

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/medicaments/{id}"),
            Some(json!({ "name": "Paracetamol 1g", "price_cents": 400, "stock": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Paracetamol 1g");
        assert_eq!(body["stock"], 12);

        let (status, _) = send(&app, "DELETE", &format!("/medicaments/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", &format!("/medicaments/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_medication_finished_listing() {
        let (app, _db) = test_app().await;

        create_medication(&app, "In stock", 5).await;
        create_medication(&app, "Exhausted", 0).await;

        let (status, body) = send(&app, "GET", "/medicaments/finished", None).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Exhausted");
    }

    #[tokio::test]
    async fn test_medication_rejects_empty_name() {
        let (app, _db) = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/medicaments",
            Some(json!({ "name": "", "price_cents": 100, "stock": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("required"));
    }

    #[tokio::test]
    async fn test_procurement_flow() {
        let (app, _db) = test_app().await;
        let med_id = create_medication(&app, "Amoxicillin", 5).await;

        let (status, body) = send(
            &app,
            "POST",
            "/approvisonements",
            Some(json!({
                "medication_id": med_id,
                "quantity": 10,
                "price_cents": 4500,
                "delivery_date": "2026-08-20T00:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["quantity"], 10);
        assert_eq!(body["medication"]["stock"], 15);
        let procurement_id = body["id"].as_str().unwrap().to_string();

        // Derived expense visible on /depenses
        let (status, body) = send(&app, "GET", "/depenses", None).await;
        assert_eq!(status, StatusCode::OK);
        let expenses = body.as_array().unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0]["motif"], "Procurement of (10) Amoxicillin");

        // Delete reverses the stock effect
        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/approvisonements/{procurement_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", &format!("/medicaments/{med_id}"), None).await;
        assert_eq!(body["stock"], 5);

        // Expense survives the deletion
        let (_, body) = send(&app, "GET", "/depenses", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_procurement_unknown_medication_is_404() {
        let (app, _db) = test_app().await;

        let (status, _) = send(
            &app,
            "POST",
            "/approvisonements",
            Some(json!({
                "medication_id": "no-such-id",
                "quantity": 3,
                "price_cents": 100,
                "delivery_date": "2026-08-20T00:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_prescription_lifecycle() {
        let (app, db) = test_app().await;
        let med_id = create_medication(&app, "Ibuprofen", 10).await;
        let treatment_id = create_treatment(&app, &db).await;

        // Create decrements stock
        let (status, body) = send(
            &app,
            "POST",
            "/ordonnances",
            Some(json!({
                "treatment_id": treatment_id,
                "notes": "After meals",
                "items": [{ "medication_id": med_id, "quantity": 4 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let prescription_id = body["id"].as_str().unwrap().to_string();

        let (_, body) = send(&app, "GET", &format!("/medicaments/{med_id}"), None).await;
        assert_eq!(body["stock"], 6);

        // Duplicate for the same treatment is rejected
        let (status, body) = send(
            &app,
            "POST",
            "/ordonnances",
            Some(json!({
                "treatment_id": treatment_id,
                "items": [{ "medication_id": med_id, "quantity": 1 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("already exists"));

        // Detail view expands items and treatment
        let (status, body) = send(
            &app,
            "GET",
            &format!("/ordonnances/{prescription_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["quantity"], 4);
        assert_eq!(body["treatment"]["patient"]["full_name"], "Omar Tazi");

        // Lookup by treatment
        let (status, body) = send(
            &app,
            "GET",
            &format!("/ordonnances/treatement/{treatment_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        // Update replaces items
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/ordonnances/{prescription_id}"),
            Some(json!({
                "items": [{ "medication_id": med_id, "quantity": 2 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", &format!("/medicaments/{med_id}"), None).await;
        assert_eq!(body["stock"], 8);

        // POST on /{id} deletes and restores stock
        let (status, _) = send(
            &app,
            "POST",
            &format!("/ordonnances/{prescription_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", &format!("/medicaments/{med_id}"), None).await;
        assert_eq!(body["stock"], 10);
    }

    #[tokio::test]
    async fn test_prescription_insufficient_stock_is_400() {
        let (app, db) = test_app().await;
        let med_id = create_medication(&app, "Aspirin", 2).await;
        let treatment_id = create_treatment(&app, &db).await;

        let (status, body) = send(
            &app,
            "POST",
            "/ordonnances",
            Some(json!({
                "treatment_id": treatment_id,
                "items": [{ "medication_id": med_id, "quantity": 5 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Insufficient stock"));

        // Nothing persisted
        let (_, body) = send(&app, "GET", "/ordonnances", None).await;
        assert!(body.as_array().unwrap().is_empty());
        let (_, body) = send(&app, "GET", &format!("/medicaments/{med_id}"), None).await;
        assert_eq!(body["stock"], 2);
    }

    #[tokio::test]
    async fn test_prescription_by_unknown_treatment_is_404() {
        let (app, _db) = test_app().await;

        let (status, _) = send(&app, "GET", "/ordonnances/treatement/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_treatment_detail_expansion() {
        let (app, db) = test_app().await;
        let treatment_id = create_treatment(&app, &db).await;

        let (status, body) = send(&app, "GET", &format!("/traitements/{treatment_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patient"]["full_name"], "Omar Tazi");
        assert_eq!(body["diagnosis"], "Flu");
    }

    #[tokio::test]
    async fn test_treatment_requires_existing_patient() {
        let (app, _db) = test_app().await;

        let (status, _) = send(
            &app,
            "POST",
            "/traitements",
            Some(json!({ "patient_id": "ghost" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
