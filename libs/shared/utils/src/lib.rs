pub mod clock;
pub mod weekday_label;

pub use clock::{Clock, FixedClock, SystemClock};
