//! Wall-clock source for run timestamps.

use time::macros::format_description;
use time::OffsetDateTime;

/// Source of "now". Injected into the orchestrator so elapsed time can be
/// tested without sleeping.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Local time when the offset can be determined, UTC otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// `2024-03-01 14:05:09.000123`
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
    at.format(format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// `20240301-140509-000123`, safe for file names.
pub fn format_file_stamp(at: OffsetDateTime) -> String {
    let format =
        format_description!("[year][month][day]-[hour][minute][second]-[subsecond digits:6]");
    at.format(format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Seconds from `start` to `end`, never negative.
pub fn elapsed_seconds(start: OffsetDateTime, end: OffsetDateTime) -> f64 {
    (end - start).as_seconds_f64().max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn record_timestamp_has_microseconds() {
        let at = datetime!(2024-03-01 14:05:09.000123 UTC);
        assert_eq!(format_timestamp(at), "2024-03-01 14:05:09.000123");
    }

    #[test]
    fn file_stamp_is_path_safe() {
        let at = datetime!(2024-03-01 14:05:09.5 UTC);
        let stamp = format_file_stamp(at);
        assert_eq!(stamp, "20240301-140509-500000");
        assert!(!stamp.contains(':'));
        assert!(!stamp.contains(' '));
    }

    #[test]
    fn elapsed_is_clamped_at_zero() {
        let start = datetime!(2024-03-01 14:05:10 UTC);
        let end = datetime!(2024-03-01 14:05:09 UTC);
        assert_eq!(elapsed_seconds(start, end), 0.0);
        assert_eq!(elapsed_seconds(end, start), 1.0);
    }
}
