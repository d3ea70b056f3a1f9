use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// Closed weekday enumeration used across the engine. Kept separate from
/// `chrono::Weekday` so the wire representation stays explicit (Mon..Sun).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::from_chrono(date.weekday())
    }

    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        };
        write!(f, "{}", name)
    }
}

/// Per-weekday working template of a clinician: work window, optional break
/// window and the step interval between successive session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyConfig {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub weekday: Weekday,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    /// Total spacing in minutes between one session start and the next
    /// (session duration plus idle gap).
    pub step_minutes: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WeeklyConfig {
    /// Field invariants only; scheduling-level checks (occupied slots,
    /// booking conflicts) belong to the services that own them.
    pub fn validate(&self, session_duration_minutes: i64) -> Result<(), String> {
        if self.work_start >= self.work_end {
            return Err("work start must be before work end".to_string());
        }
        if self.step_minutes < session_duration_minutes {
            return Err(format!(
                "step interval ({} min) must be at least the session duration ({} min)",
                self.step_minutes, session_duration_minutes
            ));
        }
        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => {
                if start >= end {
                    return Err("break start must be before break end".to_string());
                }
                if start < self.work_start || end > self.work_end {
                    return Err("break must lie within the work window".to_string());
                }
                Ok(())
            }
            (None, None) => Ok(()),
            _ => Err("break start and break end must be provided together".to_string()),
        }
    }

    pub fn break_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.break_start.zip(self.break_end)
    }
}

/// One recurring weekly time window derived from a `WeeklyConfig`. A slot
/// with a non-null `patient_id` is occupied and never listed as free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub config_id: Uuid,
    pub clinician_id: Uuid,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub active: bool,
    pub patient_id: Option<Uuid>,
}

impl Slot {
    pub fn is_occupied(&self) -> bool {
        self.patient_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Scheduled,
    Done,
    Cancelled,
    NoShow,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Scheduled => write!(f, "scheduled"),
            BookingStatus::Done => write!(f, "done"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// One dated occurrence of a recurring assignment between a patient and a
/// clinician. All occurrences of one assignment share a `series_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub clinician_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub series_id: Uuid,
    pub sequence: i32,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub status: BookingStatus,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn is_scheduled(&self) -> bool {
        self.status == BookingStatus::Scheduled && self.active
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    /// Weekly slot this patient is permanently attached to, if any.
    pub slot_id: Option<Uuid>,
    /// Target session-pack size.
    pub sessions_per_pack: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(
        work: (&str, &str),
        pause: Option<(&str, &str)>,
        step_minutes: i64,
    ) -> WeeklyConfig {
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        WeeklyConfig {
            id: Uuid::new_v4(),
            clinician_id: Uuid::new_v4(),
            weekday: Weekday::Monday,
            work_start: t(work.0),
            work_end: t(work.1),
            break_start: pause.map(|p| t(p.0)),
            break_end: pause.map(|p| t(p.1)),
            step_minutes,
            active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn validates_ordered_work_window() {
        assert!(config(("08:00", "18:00"), None, 60).validate(50).is_ok());
        assert!(config(("18:00", "08:00"), None, 60).validate(50).is_err());
    }

    #[test]
    fn validates_break_within_window() {
        assert!(config(("08:00", "18:00"), Some(("12:00", "13:00")), 60)
            .validate(50)
            .is_ok());
        assert!(config(("08:00", "18:00"), Some(("07:00", "09:00")), 60)
            .validate(50)
            .is_err());
        assert!(config(("08:00", "18:00"), Some(("13:00", "12:00")), 60)
            .validate(50)
            .is_err());
    }

    #[test]
    fn rejects_half_open_break() {
        let mut cfg = config(("08:00", "18:00"), None, 60);
        cfg.break_start = Some(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert!(cfg.validate(50).is_err());
    }

    #[test]
    fn rejects_step_shorter_than_session() {
        assert!(config(("08:00", "18:00"), None, 30).validate(50).is_err());
    }

    #[test]
    fn weekday_roundtrips_through_chrono() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(); // a Monday
        assert_eq!(Weekday::from_date(date), Weekday::Monday);
        assert_eq!(Weekday::Monday.to_chrono(), chrono::Weekday::Mon);
    }
}
