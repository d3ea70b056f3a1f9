use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::{Booking, BookingStatus};
use shared_storage::Store;

use crate::models::{BookingCounts, SessionError};
use crate::services::conflict::ConflictService;

/// Booking state machine and the listing/counting queries around it.
/// `Scheduled` is the only non-terminal status; reschedule is the one
/// transition that keeps it.
pub struct LifecycleService {
    store: Store,
    conflicts: ConflictService,
}

impl LifecycleService {
    pub fn new(store: Store) -> Self {
        Self {
            conflicts: ConflictService::new(store.clone()),
            store,
        }
    }

    pub async fn get(&self, booking_id: Uuid) -> Result<Booking, SessionError> {
        self.store
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| SessionError::NotFound("booking".to_string()))
    }

    /// Scheduled -> Done, optionally recording session notes.
    pub async fn mark_done(
        &self,
        booking_id: Uuid,
        notes: Option<String>,
    ) -> Result<Booking, SessionError> {
        let mut booking = self.require_scheduled(booking_id, "mark done").await?;
        booking.status = BookingStatus::Done;
        if notes.is_some() {
            booking.notes = notes;
        }
        booking.updated_at = Some(Utc::now());
        let booking = self.store.bookings.update(&booking).await?;
        info!("Booking {} marked done", booking_id);
        Ok(booking)
    }

    /// Scheduled -> Cancelled. The row is kept, soft-deactivated, so the
    /// patient's history shows the cancellation.
    pub async fn cancel(&self, booking_id: Uuid) -> Result<Booking, SessionError> {
        let mut booking = self.get(booking_id).await?;
        if booking.status == BookingStatus::Done {
            return Err(SessionError::IllegalTransition(
                "a session already marked done cannot be cancelled".to_string(),
            ));
        }
        if !booking.is_scheduled() {
            return Err(SessionError::IllegalTransition(format!(
                "cannot cancel a session in status {}",
                booking.status
            )));
        }
        booking.status = BookingStatus::Cancelled;
        booking.active = false;
        booking.updated_at = Some(Utc::now());
        let booking = self.store.bookings.update(&booking).await?;
        info!("Booking {} cancelled", booking_id);
        Ok(booking)
    }

    /// Scheduled -> NoShow.
    pub async fn mark_no_show(&self, booking_id: Uuid) -> Result<Booking, SessionError> {
        let mut booking = self.require_scheduled(booking_id, "mark no-show").await?;
        booking.status = BookingStatus::NoShow;
        booking.updated_at = Some(Utc::now());
        let booking = self.store.bookings.update(&booking).await?;
        info!("Booking {} marked no-show", booking_id);
        Ok(booking)
    }

    /// Scheduled -> Scheduled on a new date (and optionally a new start time),
    /// guarded by the conflict detector with the booking itself excluded.
    pub async fn reschedule(
        &self,
        booking_id: Uuid,
        new_date: NaiveDate,
        new_start: Option<chrono::NaiveTime>,
    ) -> Result<Booking, SessionError> {
        let mut booking = self.require_scheduled(booking_id, "reschedule").await?;

        let duration = booking.duration();
        let start = new_start.unwrap_or(booking.start);
        let end = start + duration;

        let conflicting = self
            .conflicts
            .find_conflicting(booking.clinician_id, new_date, start, end)
            .await?;
        if let Some(offender) = conflicting.iter().find(|b| b.id != booking.id) {
            return Err(SessionError::Conflict {
                date: new_date,
                start,
                booking_id: offender.id,
            });
        }

        debug!(
            "Rescheduling booking {} from {} {} to {} {}",
            booking_id, booking.date, booking.start, new_date, start
        );
        booking.date = new_date;
        booking.start = start;
        booking.end = end;
        booking.updated_at = Some(Utc::now());
        Ok(self.store.bookings.update(&booking).await?)
    }

    pub async fn update_notes(
        &self,
        booking_id: Uuid,
        notes: String,
    ) -> Result<Booking, SessionError> {
        let mut booking = self.get(booking_id).await?;
        booking.notes = Some(notes);
        booking.updated_at = Some(Utc::now());
        Ok(self.store.bookings.update(&booking).await?)
    }

    pub async fn list_for_clinician(
        &self,
        clinician_id: Uuid,
    ) -> Result<Vec<Booking>, SessionError> {
        Ok(self.store.bookings.find_by_clinician(clinician_id).await?)
    }

    pub async fn list_for_clinician_in_period(
        &self,
        clinician_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>, SessionError> {
        if from > to {
            return Err(SessionError::InvalidRequest(
                "period start must not be after period end".to_string(),
            ));
        }
        Ok(self
            .store
            .bookings
            .find_by_clinician_in_period(clinician_id, from, to)
            .await?)
    }

    pub async fn list_for_clinician_by_status(
        &self,
        clinician_id: Uuid,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, SessionError> {
        Ok(self
            .store
            .bookings
            .find_by_clinician_and_status(clinician_id, status)
            .await?)
    }

    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Booking>, SessionError> {
        Ok(self
            .store
            .bookings
            .find_by_patient(patient_id, !include_inactive)
            .await?)
    }

    /// Scheduled and realized totals per patient.
    pub async fn count_for_patient(&self, patient_id: Uuid) -> Result<BookingCounts, SessionError> {
        let all = self.store.bookings.find_by_patient(patient_id, false).await?;
        Ok(BookingCounts {
            scheduled: all.iter().filter(|b| b.is_scheduled()).count(),
            done: all
                .iter()
                .filter(|b| b.status == BookingStatus::Done)
                .count(),
        })
    }

    async fn require_scheduled(
        &self,
        booking_id: Uuid,
        action: &str,
    ) -> Result<Booking, SessionError> {
        let booking = self.get(booking_id).await?;
        if !booking.is_scheduled() {
            return Err(SessionError::IllegalTransition(format!(
                "cannot {} a session in status {}",
                action, booking.status
            )));
        }
        Ok(booking)
    }
}
