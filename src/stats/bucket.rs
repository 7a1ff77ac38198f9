/// Calendar bucketing: map a date to the key of the time bucket it falls in.
///
/// Keys are plain strings so they double as exact-match lookup keys and
/// chart labels:
///   daily   -> "2025-03-10"
///   weekly  -> "2025-W11"   (ISO-8601 week numbering)
///   monthly -> "2025-03"
///   yearly  -> "2025"
///
/// Pure functions, no clock access -- callers pass the date in.
use chrono::{Datelike, NaiveDate};

use super::Granularity;

/// ISO weekday abbreviations, Monday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn bucket_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            // ISO week: the week's Thursday fixes both year and number, so
            // early January can belong to the previous year's last week.
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Granularity::Monthly => format!("{}-{:02}", date.year(), date.month()),
        Granularity::Yearly => date.year().to_string(),
    }
}

/// Weekday-of-week index, Mon=0 .. Sun=6.
///
/// This answers "which weekday pattern does this follow", not "when did it
/// happen" -- a deliberately separate mapping from `bucket_key`.
#[inline]
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}
