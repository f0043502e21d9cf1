//! Simulated calendar helpers.
//!
//! Spans carry whole-second resolution; fractional inputs are rounded.

use crate::SimulationError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Parse a `YYYY-MM-DD` start date into midnight of that day.
pub fn parse_start_date(value: &str) -> Result<NaiveDateTime, SimulationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|source| SimulationError::InvalidStartDate {
            value: value.to_string(),
            source,
        })
}

pub fn minutes(value: f64) -> Result<Duration, SimulationError> {
    seconds(value * 60.0)
}

pub fn hours(value: f64) -> Result<Duration, SimulationError> {
    seconds(value * 3_600.0)
}

pub fn days(value: f64) -> Result<Duration, SimulationError> {
    seconds(value * SECONDS_PER_DAY)
}

fn seconds(value: f64) -> Result<Duration, SimulationError> {
    let rounded = value.round();
    if !rounded.is_finite() {
        return Err(SimulationError::TimeOutOfRange);
    }
    // `as` saturates, and a saturated count is rejected by `try_seconds`.
    Duration::try_seconds(rounded as i64).ok_or(SimulationError::TimeOutOfRange)
}

/// The instant `span` after `at`, if the calendar can represent it.
pub fn after(at: NaiveDateTime, span: Duration) -> Result<NaiveDateTime, SimulationError> {
    at.checked_add_signed(span)
        .ok_or(SimulationError::TimeOutOfRange)
}

/// Length of a span in fractional days.
pub fn as_days(span: Duration) -> f64 {
    span.num_seconds() as f64 / SECONDS_PER_DAY
}

/// ISO-8601 week number of an instant.
pub fn iso_week(at: NaiveDateTime) -> u32 {
    at.iso_week().week()
}
