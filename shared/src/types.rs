//! Common types used across the platform

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds in one day
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Look-ahead used by expiry reporting and the expiration sweep
pub const DEFAULT_EXPIRATION_WINDOW_DAYS: i64 = 30;

/// Trailing window used for usage-based predictions
pub const USAGE_WINDOW_DAYS: i64 = 30;

/// A half-open time window `[start, end)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window covering the `days` before `now`
    pub fn trailing(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }
}

/// Whole days from `now` until `at`, rounded up.
///
/// Negative once `at` is more than a full day in the past.
pub fn days_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (at - now).num_milliseconds();
    (ms as f64 / DAY_MS as f64).ceil() as i64
}

/// UTC calendar day of a timestamp
pub fn calendar_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_days_until_rounds_up() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(days_until(now + Duration::hours(1), now), 1);
        assert_eq!(days_until(now + Duration::days(7), now), 7);
        assert_eq!(days_until(now + Duration::days(7) + Duration::minutes(1), now), 8);
    }

    #[test]
    fn test_days_until_past() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        // Less than a day ago still rounds up to zero
        assert_eq!(days_until(now - Duration::hours(3), now), 0);
        assert_eq!(days_until(now - Duration::days(2), now), -2);
    }

    #[test]
    fn test_trailing_window() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let window = TimeWindow::trailing(now, 30);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap());
        assert_eq!(window.end, now);
        assert_eq!(calendar_day(window.start).to_string(), "2024-05-31");
    }
}
