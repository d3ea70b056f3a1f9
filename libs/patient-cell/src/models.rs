use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use agenda_cell::models::ScheduleError;
use session_cell::models::SessionError;
use shared_models::{AppError, Patient, Weekday};
use shared_storage::StorageError;
use shared_utils::weekday_label;

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            PatientError::InvalidRequest(msg) => AppError::BadRequest(msg),
            PatientError::IllegalTransition(msg) => AppError::IllegalTransition(msg),
            PatientError::Schedule(inner) => inner.into(),
            PatientError::Session(inner) => inner.into(),
            PatientError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub slot_id: Uuid,
    pub session_count: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub sessions_per_pack: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RebindRequest {
    pub slot_id: Uuid,
}

/// The patient's current weekly arrangement, shown alongside the profile.
#[derive(Debug, Serialize)]
pub struct CurrentSlotSummary {
    pub slot_id: Uuid,
    pub weekday: Weekday,
    pub weekday_label: &'static str,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub series_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub full_name: String,
    pub current_slot: Option<CurrentSlotSummary>,
}

impl CurrentSlotSummary {
    pub fn new(slot: &shared_models::Slot, series_id: Option<Uuid>) -> Self {
        Self {
            slot_id: slot.id,
            weekday: slot.weekday,
            weekday_label: weekday_label::pt_br(slot.weekday),
            start: slot.start,
            end: slot.end,
            series_id,
        }
    }
}
