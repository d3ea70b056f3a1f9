use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::{AppError, Weekday};
use shared_storage::AppContext;

use crate::models::{ConfigView, SaveConfigRequest};
use crate::services::{config::ConfigService, slots::SlotService};

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: Option<NaiveDate>,
}

fn config_service(state: &AppContext) -> ConfigService {
    ConfigService::new(
        state.store.clone(),
        state.clock.clone(),
        state.config.session_duration_minutes,
    )
}

fn slot_service(state: &AppContext) -> SlotService {
    SlotService::new(
        state.store.clone(),
        state.clock.clone(),
        state.config.session_duration_minutes,
    )
}

#[axum::debug_handler]
pub async fn save_configuration(
    State(state): State<Arc<AppContext>>,
    Path(clinician_id): Path<Uuid>,
    Json(request): Json<SaveConfigRequest>,
) -> Result<Json<Value>, AppError> {
    let (config, slots) = config_service(&state).save(clinician_id, request).await?;

    Ok(Json(json!({
        "configuration": ConfigView::from(&config),
        "slots_generated": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn get_configuration(
    State(state): State<Arc<AppContext>>,
    Path((clinician_id, weekday)): Path<(Uuid, Weekday)>,
) -> Result<Json<Value>, AppError> {
    let config = config_service(&state).get(clinician_id, weekday).await?;
    Ok(Json(json!(ConfigView::from(&config))))
}

#[axum::debug_handler]
pub async fn list_configurations(
    State(state): State<Arc<AppContext>>,
    Path(clinician_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let configs = config_service(&state).list(clinician_id).await?;
    let views: Vec<ConfigView> = configs.iter().map(ConfigView::from).collect();

    Ok(Json(json!({
        "configurations": views,
        "total": views.len()
    })))
}

#[axum::debug_handler]
pub async fn delete_configuration(
    State(state): State<Arc<AppContext>>,
    Path(config_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    config_service(&state).delete(config_id).await?;
    Ok(Json(json!({ "message": "Configuration deleted" })))
}

#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<AppContext>>,
    Path((clinician_id, weekday)): Path<(Uuid, Weekday)>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = slot_service(&state)
        .generate_slots(clinician_id, weekday, query.date)
        .await?;

    Ok(Json(json!({
        "weekday": weekday,
        "date": query.date,
        "slots": slots,
        "total": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn deactivate_slot(
    State(state): State<Arc<AppContext>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let slot = slot_service(&state).deactivate(slot_id).await?;
    Ok(Json(json!(slot)))
}

#[axum::debug_handler]
pub async fn reactivate_slot(
    State(state): State<Arc<AppContext>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let slot = slot_service(&state).reactivate(slot_id).await?;
    Ok(Json(json!(slot)))
}
