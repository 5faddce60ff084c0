use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::error::{GanttError, Result};

/// Wire format for dates handed to the persistence callback.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const MS_PER_SECOND: i64 = 1_000;
pub const MS_PER_DAY: i64 = 86_400_000;

/// Converts epoch milliseconds to wall-clock time in one fixed UTC offset.
///
/// All engine arithmetic happens on epoch milliseconds; the calendar is only
/// consulted to find unit boundaries and to format labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Out-of-range offsets fall back to UTC.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or(Utc.fix());
        Self { offset }
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset.local_minus_utc() as i64 * MS_PER_SECOND
    }

    pub fn now(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Wall-clock time for an epoch-millisecond timestamp.
    pub fn naive(&self, ms: i64) -> NaiveDateTime {
        DateTime::from_timestamp_millis(ms.saturating_add(self.offset_ms()))
            .unwrap_or_default()
            .naive_utc()
    }

    /// Epoch milliseconds for a wall-clock time.
    pub fn timestamp(&self, at: NaiveDateTime) -> i64 {
        at.and_utc().timestamp_millis() - self.offset_ms()
    }

    pub fn date(&self, ms: i64) -> NaiveDate {
        self.naive(ms).date()
    }

    pub fn start_of_day(&self, ms: i64) -> i64 {
        let local = ms.saturating_add(self.offset_ms());
        local - local.rem_euclid(MS_PER_DAY) - self.offset_ms()
    }

    /// Last millisecond of the day containing `ms`.
    pub fn end_of_day(&self, ms: i64) -> i64 {
        self.start_of_day(ms) + MS_PER_DAY - 1
    }

    pub fn format(&self, ms: i64) -> String {
        self.naive(ms).format(DATE_TIME_FORMAT).to_string()
    }

    /// Accepts `YYYY-MM-DD HH:mm:ss`, `YYYY-MM-DD` and RFC 3339.
    pub fn parse(&self, text: &str) -> Result<i64> {
        let text = text.trim();
        if let Ok(at) = NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT) {
            return Ok(self.timestamp(at));
        }
        if let Ok(day) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
            return Ok(self.timestamp(day.and_time(chrono::NaiveTime::MIN)));
        }
        DateTime::parse_from_rfc3339(text)
            .map(|at| at.timestamp_millis())
            .map_err(|_| GanttError::InvalidDate(text.to_string()))
    }
}
