use chrono::{DateTime, Datelike, Timelike, Utc};
use crate::models::{Availability, DayOfWeek, OpenWindow};

/// Fraction (0..=1) of the request window covered by the nurse's open hours
///
/// Only the windows listed for one weekday are consulted: `day_override`
/// when given, otherwise the UTC weekday of `start`. The request is laid
/// over that single day, so any part of it past midnight is never covered.
/// A zero-length or inverted request window yields `0.0`, as does a day
/// with no listed windows.
pub fn availability_ratio(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    availability: &Availability,
    day_override: Option<DayOfWeek>,
) -> f64 {
    let duration_ms = (end - start).num_milliseconds();
    if duration_ms <= 0 {
        return 0.0;
    }

    let day = day_override.unwrap_or_else(|| DayOfWeek::from(start.weekday()));
    let Some(windows) = availability.get(&day) else {
        return 0.0;
    };

    let request_start = i64::from(start.num_seconds_from_midnight()) * 1000
        + i64::from(start.timestamp_subsec_millis().min(999));
    let request_end = request_start + duration_ms;

    let covered: i64 = merged_windows(availability_windows(windows))
        .into_iter()
        .map(|(open, close)| (close.min(request_end) - open.max(request_start)).max(0))
        .sum();

    (covered as f64 / duration_ms as f64).clamp(0.0, 1.0)
}

/// Ratio for an optional request window
///
/// Without both `start` and `end` there is no time constraint and the
/// nurse counts as fully available.
pub fn request_availability(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    availability: &Availability,
    day_override: Option<DayOfWeek>,
) -> f64 {
    match (start, end) {
        (Some(start), Some(end)) => availability_ratio(start, end, availability, day_override),
        _ => 1.0,
    }
}

fn availability_windows(windows: &[OpenWindow]) -> Vec<(i64, i64)> {
    windows
        .iter()
        .map(|window| {
            let (open, close) = window.bounds();
            (i64::from(open) * 1000, i64::from(close) * 1000)
        })
        .collect()
}

/// Sort and merge overlapping windows so no span is counted twice
fn merged_windows(mut windows: Vec<(i64, i64)>) -> Vec<(i64, i64)> {
    windows.sort_unstable();
    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(windows.len());
    for (open, close) in windows {
        match merged.last_mut() {
            Some(last) if open <= last.1 => last.1 = last.1.max(close),
            _ => merged.push((open, close)),
        }
    }
    merged
}
