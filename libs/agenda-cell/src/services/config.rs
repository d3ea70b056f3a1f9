use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::{BookingStatus, Slot, WeeklyConfig};
use shared_storage::Store;
use shared_utils::Clock;

use crate::models::{SaveConfigRequest, ScheduleError};
use crate::services::slots::SlotService;

/// One active weekly configuration per (clinician, weekday). Saving validates
/// the field invariants, verifies the edited grid against scheduled sessions
/// and regenerates the derived slots.
pub struct ConfigService {
    store: Store,
    slots: SlotService,
    session_duration: i64,
}

impl ConfigService {
    pub fn new(store: Store, clock: Arc<dyn Clock>, session_duration: i64) -> Self {
        Self {
            slots: SlotService::new(store.clone(), clock, session_duration),
            store,
            session_duration,
        }
    }

    /// Creates or updates the configuration for (clinician, weekday) and
    /// rebuilds its slots. Refused when the edited grid would conflict with
    /// already-scheduled sessions on the weekday's next occurrence.
    pub async fn save(
        &self,
        clinician_id: Uuid,
        request: SaveConfigRequest,
    ) -> Result<(WeeklyConfig, Vec<Slot>), ScheduleError> {
        let existing = self
            .store
            .configs
            .find_active(clinician_id, request.weekday)
            .await?;

        let is_update = existing.is_some();
        let mut candidate = match existing {
            Some(config) => config,
            None => WeeklyConfig {
                id: Uuid::new_v4(),
                clinician_id,
                weekday: request.weekday,
                work_start: request.work_start,
                work_end: request.work_end,
                break_start: request.break_start,
                break_end: request.break_end,
                step_minutes: request.step_minutes,
                active: true,
                created_at: Utc::now(),
                updated_at: None,
            },
        };
        candidate.work_start = request.work_start;
        candidate.work_end = request.work_end;
        candidate.break_start = request.break_start;
        candidate.break_end = request.break_end;
        candidate.step_minutes = request.step_minutes;

        candidate
            .validate(self.session_duration)
            .map_err(ScheduleError::InvalidConfiguration)?;

        if !self
            .slots
            .check_all_slots_free(clinician_id, None, &candidate)
            .await?
        {
            warn!(
                "Rejected configuration edit for clinician {} on {}: scheduled sessions conflict",
                clinician_id, candidate.weekday
            );
            return Err(ScheduleError::Conflict(
                "edited configuration conflicts with already scheduled sessions".to_string(),
            ));
        }

        let saved = if is_update {
            candidate.updated_at = Some(Utc::now());
            self.store.configs.update(&candidate).await?
        } else {
            self.store.configs.insert(candidate).await?
        };

        let slots = self.slots.regenerate(&saved).await?;
        info!(
            "Saved configuration {} for clinician {} on {} ({} slots)",
            saved.id,
            clinician_id,
            saved.weekday,
            slots.len()
        );
        Ok((saved, slots))
    }

    pub async fn get(
        &self,
        clinician_id: Uuid,
        weekday: shared_models::Weekday,
    ) -> Result<WeeklyConfig, ScheduleError> {
        self.store
            .configs
            .find_active(clinician_id, weekday)
            .await?
            .ok_or_else(|| ScheduleError::NotFound("configuration".to_string()))
    }

    /// Active configurations of the clinician, ordered by weekday.
    pub async fn list(&self, clinician_id: Uuid) -> Result<Vec<WeeklyConfig>, ScheduleError> {
        Ok(self.store.configs.find_active_by_clinician(clinician_id).await?)
    }

    /// Deletes a configuration and its derived slots. Refused while any slot
    /// is bound to a patient; bookings referencing the deleted slots are
    /// removed, keeping realized sessions as soft-deleted history.
    pub async fn delete(&self, config_id: Uuid) -> Result<(), ScheduleError> {
        let config = self
            .store
            .configs
            .find_by_id(config_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound("configuration".to_string()))?;

        let slots = self.store.slots.find_by_config(config_id).await?;
        if let Some(occupied) = slots.iter().find(|s| s.is_occupied()) {
            return Err(ScheduleError::SlotOccupied(format!(
                "slot {} at {} is bound to a patient; rebind or deactivate the patient first",
                occupied.id, occupied.start
            )));
        }

        for slot in &slots {
            let bookings = self.store.bookings.find_by_slot(slot.id).await?;
            let mut to_delete = Vec::new();
            for mut booking in bookings {
                if booking.status == BookingStatus::Done {
                    booking.active = false;
                    booking.updated_at = Some(Utc::now());
                    self.store.bookings.update(&booking).await?;
                } else {
                    to_delete.push(booking.id);
                }
            }
            if !to_delete.is_empty() {
                debug!(
                    "Removing {} bookings referencing slot {}",
                    to_delete.len(),
                    slot.id
                );
                self.store.bookings.delete_batch(&to_delete).await?;
            }
        }

        self.store.slots.delete_by_config(config_id).await?;
        self.store.configs.delete(config_id).await?;
        info!(
            "Deleted configuration {} ({}) and {} slots",
            config_id,
            config.weekday,
            slots.len()
        );
        Ok(())
    }
}
