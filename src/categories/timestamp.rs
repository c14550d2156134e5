//! Wall clock port and the legacy timestamp format stored on categories.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock (production)
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Format a timestamp the way existing category documents store it.
///
/// Fields are unpadded and the minute slot repeats the hour, matching the
/// documents already in the store.
pub fn legacy_timestamp(at: &NaiveDateTime) -> String {
    format!(
        "{}-{}-{} {}:{}:{}",
        at.year(),
        at.month(),
        at.day(),
        at.hour(),
        at.hour(),
        at.second()
    )
}
