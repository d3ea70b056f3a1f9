use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::{Booking, BookingStatus, Slot};
use shared_storage::Store;
use shared_utils::Clock;

use crate::models::SessionError;
use crate::services::conflict::ConflictService;

/// Materializes recurring weekly bookings for a patient bound to a slot:
/// series creation, top-up, pack resize and slot rebinding.
pub struct SeriesService {
    store: Store,
    conflicts: ConflictService,
    clock: Arc<dyn Clock>,
}

impl SeriesService {
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self {
            conflicts: ConflictService::new(store.clone()),
            store,
            clock,
        }
    }

    /// First future date falling on the slot's weekday. When that date is
    /// today but the slot's start time has already passed, skip to next week.
    pub fn next_occurrence(&self, weekday: shared_models::Weekday, slot_start: NaiveTime) -> NaiveDate {
        let today = self.clock.today();
        let current = today.weekday().num_days_from_monday() as i64;
        let target = weekday.to_chrono().num_days_from_monday() as i64;
        let mut ahead = (target - current).rem_euclid(7);
        if ahead == 0 && self.clock.now() >= slot_start {
            ahead = 7;
        }
        today + Duration::days(ahead)
    }

    /// Creates `count` bookings starting at the slot's next occurrence, spaced
    /// exactly 7 days apart, then binds the slot to the patient. Every date is
    /// checked against the conflict detector before anything is written, so a
    /// conflicting date fails the whole series.
    pub async fn create_series(
        &self,
        patient_id: Uuid,
        slot_id: Uuid,
        session_count: i32,
    ) -> Result<Vec<Booking>, SessionError> {
        if session_count < 1 {
            return Err(SessionError::InvalidRequest(
                "session count must be at least 1".to_string(),
            ));
        }

        let mut slot = self.load_bookable_slot(slot_id, patient_id).await?;
        let first_date = self.next_occurrence(slot.weekday, slot.start);
        let dates = self
            .plan_dates(slot.clinician_id, slot.start, slot.end, first_date, session_count)
            .await?;

        let series_id = Uuid::new_v4();
        let bookings = self.materialize(&slot, patient_id, series_id, 1, &dates).await?;

        slot.patient_id = Some(patient_id);
        slot.active = false;
        self.store.slots.update(&slot).await?;

        info!(
            "Created series {} with {} bookings for patient {} on slot {}",
            series_id,
            bookings.len(),
            patient_id,
            slot_id
        );
        Ok(bookings)
    }

    /// Pre-flight check for series creation with no writes. Lets callers that
    /// create other rows first (patient registration) fail before touching
    /// storage.
    pub async fn validate_series(
        &self,
        patient_id: Uuid,
        slot_id: Uuid,
        session_count: i32,
    ) -> Result<(), SessionError> {
        if session_count < 1 {
            return Err(SessionError::InvalidRequest(
                "session count must be at least 1".to_string(),
            ));
        }
        let slot = self.load_bookable_slot(slot_id, patient_id).await?;
        let first_date = self.next_occurrence(slot.weekday, slot.start);
        self.plan_dates(slot.clinician_id, slot.start, slot.end, first_date, session_count)
            .await?;
        Ok(())
    }

    /// Appends `additional` bookings to the patient's series, continuing the
    /// sequence numbering and the weekly cadence one week after the latest
    /// booking of the series.
    pub async fn top_up(
        &self,
        patient_id: Uuid,
        additional: i32,
    ) -> Result<Vec<Booking>, SessionError> {
        if additional < 1 {
            return Err(SessionError::InvalidRequest(
                "additional session count must be at least 1".to_string(),
            ));
        }

        let scheduled = self.store.bookings.find_scheduled_by_patient(patient_id).await?;
        let latest = scheduled.last().ok_or_else(|| {
            SessionError::InvalidRequest("patient has no scheduled series to extend".to_string())
        })?;

        let series = self.store.bookings.find_by_series(latest.series_id).await?;
        let next_sequence = series.iter().map(|b| b.sequence).max().unwrap_or(0) + 1;
        let first_date = latest.date + Duration::days(7);

        let dates = self
            .plan_dates(
                latest.clinician_id,
                latest.start,
                latest.end,
                first_date,
                additional,
            )
            .await?;

        let template = latest.clone();
        let series_id = template.series_id;
        let bookings = self
            .materialize_like(&template, series_id, next_sequence, &dates)
            .await?;

        info!(
            "Topped up series {} with {} bookings for patient {}",
            series_id,
            bookings.len(),
            patient_id
        );
        Ok(bookings)
    }

    /// Adjusts the patient's series to the new pack size:
    /// - zero scheduled bookings: create `new_count` from scratch,
    /// - more requested than scheduled: top up the difference,
    /// - same count: no-op,
    /// - fewer requested: deactivate the most-future scheduled bookings.
    pub async fn resize(&self, patient_id: Uuid, new_count: i32) -> Result<(), SessionError> {
        if new_count < 0 {
            return Err(SessionError::InvalidRequest(
                "session count cannot be negative".to_string(),
            ));
        }

        let patient = self
            .store
            .patients
            .find_by_id(patient_id)
            .await?
            .ok_or_else(|| SessionError::NotFound("patient".to_string()))?;
        if !patient.active {
            return Err(SessionError::IllegalTransition(
                "cannot resize the series of an inactive patient".to_string(),
            ));
        }

        let scheduled = self.store.bookings.find_scheduled_by_patient(patient_id).await?;
        debug!(
            "Resizing series for patient {}: {} scheduled, {} requested",
            patient_id,
            scheduled.len(),
            new_count
        );

        if scheduled.is_empty() {
            if new_count == 0 {
                return Ok(());
            }
            let slot_id = patient.slot_id.ok_or_else(|| {
                SessionError::InvalidRequest("patient has no bound slot".to_string())
            })?;
            self.create_series(patient_id, slot_id, new_count).await?;
            return Ok(());
        }

        let delta = new_count as i64 - scheduled.len() as i64;
        if delta > 0 {
            self.top_up(patient_id, delta as i32).await?;
        } else if delta < 0 {
            // Trim from the far end: the most-future scheduled bookings go
            // first, the earliest stay untouched.
            let mut by_date = scheduled;
            by_date.sort_by(|a, b| b.date.cmp(&a.date));
            for mut booking in by_date.into_iter().take((-delta) as usize) {
                booking.status = BookingStatus::Cancelled;
                booking.active = false;
                booking.updated_at = Some(Utc::now());
                self.store.bookings.update(&booking).await?;
            }
        }
        Ok(())
    }

    /// Moves the patient's recurring assignment onto another slot: plans the
    /// future scheduled bookings on the new day and time, then releases the
    /// old slot, replaces the bookings and binds the new slot, continuing
    /// the sequence numbering. Nothing is written when planning fails.
    pub async fn rebind(
        &self,
        patient_id: Uuid,
        old_slot_id: Option<Uuid>,
        new_slot_id: Uuid,
    ) -> Result<Vec<Booking>, SessionError> {
        let mut slot = self.load_bookable_slot(new_slot_id, patient_id).await?;

        let today = self.clock.today();
        let scheduled = self.store.bookings.find_scheduled_by_patient(patient_id).await?;
        let (future, kept): (Vec<_>, Vec<_>) =
            scheduled.into_iter().partition(|b| b.date > today);

        let series_id = future
            .first()
            .or_else(|| kept.first())
            .map(|b| b.series_id)
            .unwrap_or_else(Uuid::new_v4);

        let future_ids: Vec<Uuid> = future.iter().map(|b| b.id).collect();
        let moved = future.len() as i32;

        // Plan before touching anything so a conflict on the new day leaves
        // the old binding and bookings intact. The bookings being replaced
        // are not counted as conflicts.
        let dates = if moved > 0 {
            let first_date = self.next_occurrence(slot.weekday, slot.start);
            self.plan_dates_ignoring(
                slot.clinician_id,
                slot.start,
                slot.end,
                first_date,
                moved,
                &future_ids,
            )
            .await?
        } else {
            Vec::new()
        };

        if let Some(old_id) = old_slot_id.filter(|id| *id != new_slot_id) {
            if let Some(mut old_slot) = self.store.slots.find_by_id(old_id).await? {
                old_slot.patient_id = None;
                old_slot.active = true;
                self.store.slots.update(&old_slot).await?;
            }
        }

        let mut bookings = Vec::new();
        if moved > 0 {
            self.store.bookings.delete_batch(&future_ids).await?;

            let surviving = self.store.bookings.find_by_series(series_id).await?;
            let next_sequence = surviving.iter().map(|b| b.sequence).max().unwrap_or(0) + 1;
            bookings = self
                .materialize(&slot, patient_id, series_id, next_sequence, &dates)
                .await?;
        }

        slot.patient_id = Some(patient_id);
        slot.active = false;
        self.store.slots.update(&slot).await?;

        info!(
            "Rebound patient {} to slot {}; moved {} future bookings",
            patient_id, new_slot_id, moved
        );
        Ok(bookings)
    }

    async fn load_bookable_slot(
        &self,
        slot_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Slot, SessionError> {
        let slot = self
            .store
            .slots
            .find_by_id(slot_id)
            .await?
            .ok_or_else(|| SessionError::NotFound("slot".to_string()))?;
        match slot.patient_id {
            Some(bound) if bound != patient_id => Err(SessionError::InvalidRequest(
                "slot is already bound to another patient".to_string(),
            )),
            // A bound slot is inactive by construction; only an unbound one
            // that was explicitly deactivated is unbookable.
            None if !slot.active => Err(SessionError::InvalidRequest(
                "slot is deactivated and cannot be booked".to_string(),
            )),
            _ => Ok(slot),
        }
    }

    /// Validates `count` weekly dates starting at `first_date` against the
    /// conflict detector. Any conflicting date fails the plan before a single
    /// row is written.
    async fn plan_dates(
        &self,
        clinician_id: Uuid,
        start: NaiveTime,
        end: NaiveTime,
        first_date: NaiveDate,
        count: i32,
    ) -> Result<Vec<NaiveDate>, SessionError> {
        self.plan_dates_ignoring(clinician_id, start, end, first_date, count, &[])
            .await
    }

    async fn plan_dates_ignoring(
        &self,
        clinician_id: Uuid,
        start: NaiveTime,
        end: NaiveTime,
        first_date: NaiveDate,
        count: i32,
        ignored: &[Uuid],
    ) -> Result<Vec<NaiveDate>, SessionError> {
        let mut dates = Vec::with_capacity(count as usize);
        let mut date = first_date;
        for _ in 0..count {
            let conflicting = self
                .conflicts
                .find_conflicting(clinician_id, date, start, end)
                .await?;
            if let Some(offender) = conflicting.iter().find(|b| !ignored.contains(&b.id)) {
                return Err(SessionError::Conflict {
                    date,
                    start,
                    booking_id: offender.id,
                });
            }
            dates.push(date);
            date += Duration::days(7);
        }
        Ok(dates)
    }

    async fn materialize(
        &self,
        slot: &Slot,
        patient_id: Uuid,
        series_id: Uuid,
        first_sequence: i32,
        dates: &[NaiveDate],
    ) -> Result<Vec<Booking>, SessionError> {
        let rows = dates
            .iter()
            .enumerate()
            .map(|(i, date)| Booking {
                id: Uuid::new_v4(),
                patient_id,
                clinician_id: slot.clinician_id,
                slot_id: Some(slot.id),
                series_id,
                sequence: first_sequence + i as i32,
                date: *date,
                start: slot.start,
                end: slot.end,
                status: BookingStatus::Scheduled,
                active: true,
                notes: None,
                created_at: Utc::now(),
                updated_at: None,
            })
            .collect();
        Ok(self.store.bookings.insert_batch(rows).await?)
    }

    async fn materialize_like(
        &self,
        template: &Booking,
        series_id: Uuid,
        first_sequence: i32,
        dates: &[NaiveDate],
    ) -> Result<Vec<Booking>, SessionError> {
        let rows = dates
            .iter()
            .enumerate()
            .map(|(i, date)| Booking {
                id: Uuid::new_v4(),
                patient_id: template.patient_id,
                clinician_id: template.clinician_id,
                slot_id: template.slot_id,
                series_id,
                sequence: first_sequence + i as i32,
                date: *date,
                start: template.start,
                end: template.end,
                status: BookingStatus::Scheduled,
                active: true,
                notes: None,
                created_at: Utc::now(),
                updated_at: None,
            })
            .collect();
        Ok(self.store.bookings.insert_batch(rows).await?)
    }
}
