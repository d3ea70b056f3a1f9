use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::Booking;
use shared_storage::Store;

use crate::models::SessionError;

/// Overlap detection against the scheduled bookings of one clinician.
pub struct ConflictService {
    store: Store,
}

impl ConflictService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Whether `[start, end)` on `date` overlaps any scheduled, active booking
    /// of the clinician. A clinician with no bookings stored at all is treated
    /// as fully available without querying per date.
    pub async fn has_conflict(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<bool, SessionError> {
        self.has_conflict_excluding(clinician_id, date, start, end, None)
            .await
    }

    /// Same check, ignoring one booking id. Used by reschedule so a booking
    /// never conflicts with itself.
    pub async fn has_conflict_excluding(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        exclude: Option<Uuid>,
    ) -> Result<bool, SessionError> {
        let conflicting = self
            .find_conflicting_excluding(clinician_id, date, start, end, exclude)
            .await?;
        if let Some(first) = conflicting.first() {
            warn!(
                "Conflict for clinician {} on {} {}..{}: booking {}",
                clinician_id, date, start, end, first.id
            );
        }
        Ok(!conflicting.is_empty())
    }

    /// The offending bookings, for diagnostic responses.
    pub async fn find_conflicting(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<Booking>, SessionError> {
        self.find_conflicting_excluding(clinician_id, date, start, end, None)
            .await
    }

    async fn find_conflicting_excluding(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>, SessionError> {
        debug!(
            "Checking conflicts for clinician {} on {} {}..{}",
            clinician_id, date, start, end
        );

        // Cold system: nothing stored for this clinician means nothing can
        // overlap, skip the per-date query.
        if self.store.bookings.count_for_clinician(clinician_id).await? == 0 {
            return Ok(Vec::new());
        }

        let existing = self
            .store
            .bookings
            .find_scheduled_on_date(clinician_id, date)
            .await?;

        Ok(existing
            .into_iter()
            .filter(|b| Some(b.id) != exclude)
            .filter(|b| intervals_overlap(b.start, b.end, start, end))
            .collect())
    }
}

fn intervals_overlap(
    existing_start: NaiveTime,
    existing_end: NaiveTime,
    start: NaiveTime,
    end: NaiveTime,
) -> bool {
    (existing_start <= start && existing_end > start)
        || (existing_start < end && existing_end >= end)
        || (existing_start >= start && existing_end <= end)
}
