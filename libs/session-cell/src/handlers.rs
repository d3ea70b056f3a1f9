use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::{AppError, BookingStatus};
use shared_storage::AppContext;

use crate::models::{
    CreateSeriesRequest, DoneRequest, NotesRequest, RescheduleRequest, ResizeRequest, TopUpRequest,
};
use crate::services::{lifecycle::LifecycleService, series::SeriesService};

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Deserialize)]
pub struct PatientBookingQuery {
    pub include_inactive: Option<bool>,
}

#[axum::debug_handler]
pub async fn create_series(
    State(state): State<Arc<AppContext>>,
    Json(request): Json<CreateSeriesRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SeriesService::new(state.store.clone(), state.clock.clone());
    let bookings = service
        .create_series(request.patient_id, request.slot_id, request.session_count)
        .await?;

    Ok(Json(json!({
        "series_id": bookings.first().map(|b| b.series_id),
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn top_up_series(
    State(state): State<Arc<AppContext>>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<TopUpRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SeriesService::new(state.store.clone(), state.clock.clone());
    let bookings = service.top_up(patient_id, request.additional).await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn resize_series(
    State(state): State<Arc<AppContext>>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<ResizeRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SeriesService::new(state.store.clone(), state.clock.clone());
    service.resize(patient_id, request.session_count).await?;

    Ok(Json(json!({
        "message": "Series resized",
        "session_count": request.session_count
    })))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppContext>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = LifecycleService::new(state.store.clone());
    let booking = service.get(booking_id).await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn mark_booking_done(
    State(state): State<Arc<AppContext>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<DoneRequest>,
) -> Result<Json<Value>, AppError> {
    let service = LifecycleService::new(state.store.clone());
    let booking = service.mark_done(booking_id, request.notes).await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<AppContext>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = LifecycleService::new(state.store.clone());
    let booking = service.cancel(booking_id).await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn mark_booking_no_show(
    State(state): State<Arc<AppContext>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = LifecycleService::new(state.store.clone());
    let booking = service.mark_no_show(booking_id).await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn reschedule_booking(
    State(state): State<Arc<AppContext>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = LifecycleService::new(state.store.clone());
    let booking = service
        .reschedule(booking_id, request.date, request.start)
        .await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn update_booking_notes(
    State(state): State<Arc<AppContext>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<NotesRequest>,
) -> Result<Json<Value>, AppError> {
    let service = LifecycleService::new(state.store.clone());
    let booking = service.update_notes(booking_id, request.notes).await?;
    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn list_clinician_bookings(
    State(state): State<Arc<AppContext>>,
    Path(clinician_id): Path<Uuid>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = LifecycleService::new(state.store.clone());

    let bookings = match (query.from, query.to, query.status) {
        (Some(from), Some(to), _) => {
            service
                .list_for_clinician_in_period(clinician_id, from, to)
                .await?
        }
        (None, None, Some(status)) => {
            service
                .list_for_clinician_by_status(clinician_id, status)
                .await?
        }
        (None, None, None) => service.list_for_clinician(clinician_id).await?,
        _ => {
            return Err(AppError::BadRequest(
                "provide both from and to for a period query".to_string(),
            ))
        }
    };

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn list_patient_bookings(
    State(state): State<Arc<AppContext>>,
    Path(patient_id): Path<Uuid>,
    Query(query): Query<PatientBookingQuery>,
) -> Result<Json<Value>, AppError> {
    let service = LifecycleService::new(state.store.clone());
    let bookings = service
        .list_for_patient(patient_id, query.include_inactive.unwrap_or(false))
        .await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn count_patient_bookings(
    State(state): State<Arc<AppContext>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = LifecycleService::new(state.store.clone());
    let counts = service.count_for_patient(patient_id).await?;
    Ok(Json(json!(counts)))
}
