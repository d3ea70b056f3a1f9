use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, info};
use uuid::Uuid;

use session_cell::services::conflict::ConflictService;
use shared_models::{Slot, Weekday, WeeklyConfig};
use shared_storage::Store;
use shared_utils::Clock;

use crate::models::{ScheduleError, SlotView};

/// Expands a weekly configuration into the `(start, end)` pairs of its
/// bookable windows. Deterministic; storage untouched.
///
/// `t` walks from work start in steps of `step_minutes` (the total spacing
/// between successive starts). A window overlapping the break is suppressed;
/// a step landing inside the break jumps straight to the break's end. A
/// window ending exactly at the break start, or at the end of the working
/// day, still fits.
pub fn expand(config: &WeeklyConfig, duration_minutes: i64) -> Vec<(NaiveTime, NaiveTime)> {
    let duration = Duration::minutes(duration_minutes);
    let step = Duration::minutes(config.step_minutes);
    let break_window = config.break_window();

    let mut windows = Vec::new();
    let mut t = config.work_start;
    loop {
        let (t_end, wrapped) = t.overflowing_add_signed(duration);
        if wrapped != 0 || t_end > config.work_end {
            break;
        }

        let suppressed = match break_window {
            Some((break_start, break_end)) => t < break_end && t_end > break_start,
            None => false,
        };
        if !suppressed {
            windows.push((t, t_end));
        }

        let (mut next, wrapped) = t.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        if let Some((break_start, break_end)) = break_window {
            if next >= break_start && next < break_end {
                next = break_end;
            }
        }
        t = next;
    }
    windows
}

/// Persists and queries the availability index: the slot rows derived from
/// weekly configurations, their per-date availability and their binding
/// state.
pub struct SlotService {
    store: Store,
    conflicts: ConflictService,
    clock: Arc<dyn Clock>,
    session_duration: i64,
}

impl SlotService {
    pub fn new(store: Store, clock: Arc<dyn Clock>, session_duration: i64) -> Self {
        Self {
            conflicts: ConflictService::new(store.clone()),
            store,
            clock,
            session_duration,
        }
    }

    /// Destructively rebuilds the slot rows of one configuration. Bindings of
    /// occupied slots are carried over onto the regenerated window with the
    /// same start; a binding whose window no longer exists refuses the whole
    /// regeneration.
    pub async fn regenerate(&self, config: &WeeklyConfig) -> Result<Vec<Slot>, ScheduleError> {
        let windows = expand(config, self.session_duration);
        let existing = self.store.slots.find_by_config(config.id).await?;

        let bound: Vec<&Slot> = existing.iter().filter(|s| s.is_occupied()).collect();
        for slot in &bound {
            if !windows.iter().any(|(start, _)| *start == slot.start) {
                return Err(ScheduleError::SlotOccupied(format!(
                    "slot {} at {} is bound to a patient and does not exist in the edited configuration",
                    slot.id, slot.start
                )));
            }
        }

        self.store.slots.delete_by_config(config.id).await?;

        let rows = windows
            .into_iter()
            .map(|(start, end)| {
                let carried = bound.iter().find(|s| s.start == start);
                Slot {
                    id: Uuid::new_v4(),
                    config_id: config.id,
                    clinician_id: config.clinician_id,
                    weekday: config.weekday,
                    start,
                    end,
                    active: carried.is_none(),
                    patient_id: carried.and_then(|s| s.patient_id),
                }
            })
            .collect();
        let slots = self.store.slots.insert_batch(rows).await?;

        info!(
            "Regenerated {} slots for configuration {} ({})",
            slots.len(),
            config.id,
            config.weekday
        );
        Ok(slots)
    }

    /// Availability listing for one clinician and weekday. With a concrete
    /// date, each free window is additionally checked against the scheduled
    /// bookings of that date.
    pub async fn generate_slots(
        &self,
        clinician_id: Uuid,
        weekday: Weekday,
        date: Option<NaiveDate>,
    ) -> Result<Vec<SlotView>, ScheduleError> {
        if let Some(d) = date {
            if Weekday::from_date(d) != weekday {
                return Err(ScheduleError::InvalidConfiguration(format!(
                    "{} does not fall on a {}",
                    d, weekday
                )));
            }
        }

        let slots = self
            .store
            .slots
            .find_by_clinician_weekday(clinician_id, weekday)
            .await?;

        let mut views = Vec::with_capacity(slots.len());
        for slot in slots {
            let mut available = slot.active && !slot.is_occupied();
            if available {
                if let Some(d) = date {
                    available = !self
                        .conflicts
                        .has_conflict(clinician_id, d, slot.start, slot.end)
                        .await
                        .map_err(ScheduleError::from)?;
                }
            }
            views.push(SlotView {
                id: slot.id,
                start: slot.start,
                end: slot.end,
                available,
            });
        }
        Ok(views)
    }

    /// Verification mode of the generator: expands a candidate configuration
    /// and checks every window against the conflict detector on a concrete
    /// date (the weekday's next occurrence unless one is given). Returns
    /// false on the first conflict.
    pub async fn check_all_slots_free(
        &self,
        clinician_id: Uuid,
        date: Option<NaiveDate>,
        candidate: &WeeklyConfig,
    ) -> Result<bool, ScheduleError> {
        let target = date.unwrap_or_else(|| self.next_occurrence(candidate.weekday));
        debug!(
            "Verifying candidate configuration for clinician {} against {}",
            clinician_id, target
        );

        for (start, end) in expand(candidate, self.session_duration) {
            let conflict = self
                .conflicts
                .has_conflict(clinician_id, target, start, end)
                .await
                .map_err(ScheduleError::from)?;
            if conflict {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn deactivate(&self, slot_id: Uuid) -> Result<Slot, ScheduleError> {
        self.set_active(slot_id, false).await
    }

    pub async fn reactivate(&self, slot_id: Uuid) -> Result<Slot, ScheduleError> {
        self.set_active(slot_id, true).await
    }

    /// Clears the slot's patient binding and makes it bookable again.
    pub async fn release(&self, slot_id: Uuid) -> Result<Slot, ScheduleError> {
        let mut slot = self.get(slot_id).await?;
        slot.patient_id = None;
        slot.active = true;
        Ok(self.store.slots.update(&slot).await?)
    }

    pub async fn get(&self, slot_id: Uuid) -> Result<Slot, ScheduleError> {
        self.store
            .slots
            .find_by_id(slot_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound("slot".to_string()))
    }

    fn next_occurrence(&self, weekday: Weekday) -> NaiveDate {
        use chrono::Datelike;
        let today = self.clock.today();
        let current = today.weekday().num_days_from_monday() as i64;
        let target = weekday.to_chrono().num_days_from_monday() as i64;
        today + Duration::days((target - current).rem_euclid(7))
    }

    async fn set_active(&self, slot_id: Uuid, active: bool) -> Result<Slot, ScheduleError> {
        let mut slot = self.get(slot_id).await?;
        if active && slot.is_occupied() {
            return Err(ScheduleError::SlotOccupied(
                "an occupied slot cannot be reactivated while bound".to_string(),
            ));
        }
        slot.active = active;
        Ok(self.store.slots.update(&slot).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn config(
        work: (NaiveTime, NaiveTime),
        pause: Option<(NaiveTime, NaiveTime)>,
        step_minutes: i64,
    ) -> WeeklyConfig {
        WeeklyConfig {
            id: Uuid::new_v4(),
            clinician_id: Uuid::new_v4(),
            weekday: Weekday::Monday,
            work_start: work.0,
            work_end: work.1,
            break_start: pause.map(|p| p.0),
            break_end: pause.map(|p| p.1),
            step_minutes,
            active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn hourly_day_with_lunch_break() {
        let cfg = config((t(8, 0), t(18, 0)), Some((t(12, 0), t(13, 0))), 60);
        let windows = expand(&cfg, 50);

        let starts: Vec<_> = windows.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            starts,
            vec![
                t(8, 0),
                t(9, 0),
                t(10, 0),
                t(11, 0),
                t(13, 0),
                t(14, 0),
                t(15, 0),
                t(16, 0),
                t(17, 0),
            ]
        );
        // The last window ends at 17:50, inside the working day.
        assert_eq!(windows.last().unwrap().1, t(17, 50));
    }

    #[test]
    fn window_ending_exactly_at_break_start_is_kept() {
        let cfg = config((t(8, 0), t(14, 0)), Some((t(8, 50), t(10, 0))), 50);
        let windows = expand(&cfg, 50);
        assert_eq!(windows[0], (t(8, 0), t(8, 50)));
        // 08:50 lands inside the break, so the walk jumps to 10:00.
        assert_eq!(windows[1], (t(10, 0), t(10, 50)));
    }

    #[test]
    fn window_straddling_break_start_is_suppressed() {
        let cfg = config((t(8, 0), t(14, 0)), Some((t(9, 30), t(10, 30))), 60);
        let windows = expand(&cfg, 50);
        let starts: Vec<_> = windows.iter().map(|(s, _)| *s).collect();
        // 09:00-09:50 spans the break start, 10:00 starts inside the break.
        assert_eq!(starts, vec![t(8, 0), t(10, 30), t(11, 30), t(12, 30)]);
    }

    #[test]
    fn window_ending_exactly_at_work_end_is_kept() {
        let cfg = config((t(8, 0), t(9, 40)), None, 50);
        let windows = expand(&cfg, 50);
        assert_eq!(windows, vec![(t(8, 0), t(8, 50)), (t(8, 50), t(9, 40))]);
    }

    #[test]
    fn no_break_means_plain_stepping() {
        let cfg = config((t(8, 0), t(12, 0)), None, 90);
        let windows = expand(&cfg, 50);
        let starts: Vec<_> = windows.iter().map(|(s, _)| *s).collect();
        assert_eq!(starts, vec![t(8, 0), t(9, 30), t(11, 0)]);
    }

    #[test]
    fn expansion_is_deterministic() {
        let cfg = config((t(8, 0), t(18, 0)), Some((t(12, 0), t(13, 0))), 60);
        assert_eq!(expand(&cfg, 50), expand(&cfg, 50));
    }

    #[test]
    fn windows_never_overlap_each_other_or_the_break() {
        let cfg = config((t(7, 15), t(19, 45)), Some((t(11, 40), t(13, 20))), 55);
        let windows = expand(&cfg, 50);

        for pair in windows.windows(2) {
            assert!(pair[0].1 <= pair[1].0);
        }
        for (start, end) in &windows {
            assert!(*end <= cfg.work_end);
            assert!(!(start < &t(13, 20) && end > &t(11, 40)));
        }
    }

    #[test]
    fn late_day_window_never_wraps_past_midnight() {
        let cfg = config((t(22, 0), t(23, 59)), None, 60);
        let windows = expand(&cfg, 50);
        let starts: Vec<_> = windows.iter().map(|(s, _)| *s).collect();
        assert_eq!(starts, vec![t(22, 0), t(23, 0)]);
    }
}
