use chrono::{Local, NaiveDate, NaiveTime};

/// Source of "today" and "now" for the scheduling engine. Every date
/// comparison goes through this trait so tests can pin the calendar.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> NaiveTime;
}

/// Wall-clock time in the server's local zone. The engine is single-zone by
/// design; clinician and patients share the clinic's local calendar.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Frozen clock for tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl FixedClock {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(year, month, day).expect("valid date"),
            time: NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time"),
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now(&self) -> NaiveTime {
        self.time
    }
}
