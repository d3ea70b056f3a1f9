use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::AppError;
use shared_storage::AppContext;

use crate::models::{CreatePatientRequest, RebindRequest, UpdatePatientRequest};
use crate::services::patient::PatientService;

fn service(state: &AppContext) -> PatientService {
    PatientService::new(
        state.store.clone(),
        state.clock.clone(),
        state.config.session_duration_minutes,
    )
}

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppContext>>,
    Path(clinician_id): Path<Uuid>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let (patient, bookings) = service(&state)
        .create_with_series(clinician_id, request)
        .await?;

    Ok(Json(json!({
        "patient": patient,
        "bookings_created": bookings.len(),
        "series_id": bookings.first().map(|b| b.series_id)
    })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppContext>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let view = service(&state).get(patient_id).await?;
    Ok(Json(json!(view)))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppContext>>,
    Path(clinician_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patients = service(&state).list(clinician_id).await?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppContext>>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = service(&state).update(patient_id, request).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn rebind_patient_slot(
    State(state): State<Arc<AppContext>>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<RebindRequest>,
) -> Result<Json<Value>, AppError> {
    let bookings = service(&state)
        .rebind_slot(patient_id, request.slot_id)
        .await?;

    Ok(Json(json!({
        "message": "Slot rebound",
        "bookings_replanned": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn deactivate_patient(
    State(state): State<Arc<AppContext>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient = service(&state).deactivate(patient_id).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn reactivate_patient(
    State(state): State<Arc<AppContext>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient = service(&state).reactivate(patient_id).await?;
    Ok(Json(json!(patient)))
}
