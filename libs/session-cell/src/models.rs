use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::AppError;
use shared_storage::StorageError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{date} {start} overlaps scheduled session {booking_id}")]
    Conflict {
        date: NaiveDate,
        start: NaiveTime,
        booking_id: Uuid,
    },

    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            conflict @ SessionError::Conflict { .. } => AppError::Conflict(conflict.to_string()),
            SessionError::IllegalTransition(msg) => AppError::IllegalTransition(msg),
            SessionError::InvalidRequest(msg) => AppError::BadRequest(msg),
            SessionError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSeriesRequest {
    pub patient_id: Uuid,
    pub slot_id: Uuid,
    pub session_count: i32,
}

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub additional: i32,
}

#[derive(Debug, Deserialize)]
pub struct ResizeRequest {
    pub session_count: i32,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    /// New start time; the booking keeps its current start when omitted.
    pub start: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct DoneRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct BookingCounts {
    pub scheduled: usize,
    pub done: usize,
}
