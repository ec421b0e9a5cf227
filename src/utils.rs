use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use ruma::MilliSecondsSinceUnixEpoch;

/// Converts a Matrix timestamp into a datetime at the given UTC offset,
/// or in the system's local time zone if `offset` is `None`.
pub fn unix_time_millis_to_datetime(
    millis: &MilliSecondsSinceUnixEpoch,
    offset: Option<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let millis: i64 = millis.get().into();
    match offset {
        Some(offset) => offset.timestamp_millis_opt(millis).single(),
        None => Local
            .timestamp_millis_opt(millis)
            .single()
            .map(|dt| dt.fixed_offset()),
    }
}

/// Returns the calendar date of the given timestamp.
pub fn local_date(
    millis: &MilliSecondsSinceUnixEpoch,
    offset: Option<FixedOffset>,
) -> Option<NaiveDate> {
    unix_time_millis_to_datetime(millis, offset).map(|dt| dt.date_naive())
}

/// Formats the given timestamp with a `chrono` format string.
///
/// Returns `None` if the timestamp is out of range or the format string is invalid.
pub fn format_timestamp(
    millis: &MilliSecondsSinceUnixEpoch,
    format: &str,
    offset: Option<FixedOffset>,
) -> Option<String> {
    let dt = unix_time_millis_to_datetime(millis, offset)?;
    let mut formatted = String::new();
    write!(formatted, "{}", dt.format(format)).ok()?;
    Some(formatted)
}

/// Formats an unread message count compactly, e.g. `1234` becomes `1.2k`.
pub fn format_unread_counter(count: u32) -> String {
    if count > 999 {
        format!("{}.{}k", count / 1000, count % 1000 / 100)
    } else {
        count.to_string()
    }
}
