//! Timestamp utilities

use chrono::{DateTime, Local, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a schedule offset in minutes to a duration
///
/// Negative values clamp to zero and values too large for `Duration`
/// saturate to `Duration::MAX`; the schedule unit is minutes but waits are
/// handed to the runtime as plain durations.
pub fn minutes_to_duration(minutes: f64) -> Duration {
    Duration::try_from_secs_f64(minutes.max(0.0) * 60.0).unwrap_or(Duration::MAX)
}

/// Format a timestamp as local wall-clock time without milliseconds
///
/// Matches the console format the device operators are used to.
pub fn format_clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}
