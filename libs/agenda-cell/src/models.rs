use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use session_cell::models::SessionError;
use shared_models::{AppError, Weekday};
use shared_storage::StorageError;
use shared_utils::weekday_label;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{0}")]
    SlotOccupied(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            ScheduleError::InvalidConfiguration(msg) => AppError::InvalidConfiguration(msg),
            ScheduleError::SlotOccupied(msg) => AppError::Conflict(msg),
            ScheduleError::Conflict(msg) => AppError::Conflict(msg),
            ScheduleError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<SessionError> for ScheduleError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Storage(e) => ScheduleError::Storage(e),
            other => ScheduleError::Conflict(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveConfigRequest {
    pub weekday: Weekday,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub step_minutes: i64,
}

/// Availability listing entry. `available` folds slot activity, occupation
/// and, when a date is given, the conflict check for that date.
#[derive(Debug, Serialize)]
pub struct SlotView {
    pub id: Uuid,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub weekday: Weekday,
    pub weekday_label: &'static str,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub step_minutes: i64,
}

impl From<&shared_models::WeeklyConfig> for ConfigView {
    fn from(config: &shared_models::WeeklyConfig) -> Self {
        Self {
            id: config.id,
            clinician_id: config.clinician_id,
            weekday: config.weekday,
            weekday_label: weekday_label::pt_br(config.weekday),
            work_start: config.work_start,
            work_end: config.work_end,
            break_start: config.break_start,
            break_end: config.break_end,
            step_minutes: config.step_minutes,
        }
    }
}
