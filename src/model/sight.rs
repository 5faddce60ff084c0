use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::GanttError;

/// Timeline zoom level. Each level fixes how much time one pixel covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sight {
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    HalfYear,
}

impl Sight {
    pub const ALL: [Sight; 5] = [
        Sight::Day,
        Sight::Week,
        Sight::Month,
        Sight::Quarter,
        Sight::HalfYear,
    ];

    pub fn seconds_per_pixel(self) -> i64 {
        match self {
            Sight::Day => 2_880,
            Sight::Week => 3_600,
            Sight::Month => 14_400,
            Sight::Quarter => 86_400,
            Sight::HalfYear => 115_200,
        }
    }

    /// Milliseconds covered by one pixel.
    pub fn px_unit_amp(self) -> f64 {
        (self.seconds_per_pixel() * 1_000) as f64
    }

    pub fn label(self) -> &'static str {
        match self {
            Sight::Day => "Day",
            Sight::Week => "Week",
            Sight::Month => "Month",
            Sight::Quarter => "Quarter",
            Sight::HalfYear => "Year",
        }
    }

    /// Granularity of the lower axis row.
    pub fn minor_unit(self) -> Unit {
        match self {
            Sight::Day => Unit::Day,
            Sight::Week => Unit::Week,
            Sight::Month => Unit::Month,
            Sight::Quarter => Unit::Quarter,
            Sight::HalfYear => Unit::HalfYear,
        }
    }

    /// Granularity of the upper axis row.
    pub fn major_unit(self) -> Unit {
        match self {
            Sight::Day | Sight::Week => Unit::Month,
            Sight::Month | Sight::Quarter | Sight::HalfYear => Unit::Year,
        }
    }

    /// Slot highlighted under the pointer on a row without dates.
    pub fn slot_unit(self) -> Unit {
        match self {
            Sight::Day => Unit::Day,
            Sight::Week | Sight::Month => Unit::Week,
            Sight::Quarter | Sight::HalfYear => Unit::Month,
        }
    }
}

impl fmt::Display for Sight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sight::Day => "day",
            Sight::Week => "week",
            Sight::Month => "month",
            Sight::Quarter => "quarter",
            Sight::HalfYear => "halfYear",
        };
        f.write_str(name)
    }
}

impl FromStr for Sight {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Sight::Day),
            "week" => Ok(Sight::Week),
            "month" => Ok(Sight::Month),
            "quarter" => Ok(Sight::Quarter),
            "halfyear" | "half-year" | "half_year" => Ok(Sight::HalfYear),
            _ => Err(GanttError::UnknownSight(s.to_string())),
        }
    }
}

/// A calendar unit the axis can be divided into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Day,
    /// ISO week, Monday first.
    Week,
    Month,
    Quarter,
    HalfYear,
    Year,
}

/// A week bucket stops one second short of the next Monday.
pub const WEEK_SPAN_MS: i64 = 7 * 24 * 60 * 60 * 1000 - 1000;

impl Unit {
    /// First instant of the unit containing `at`.
    pub fn start_of(self, at: NaiveDateTime) -> NaiveDateTime {
        let date = at.date();
        let day = match self {
            Unit::Day => date,
            Unit::Week => {
                date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Unit::Month => first_of_month(date, date.month()),
            Unit::Quarter => first_of_month(date, date.month0() / 3 * 3 + 1),
            Unit::HalfYear => first_of_month(date, date.month0() / 6 * 6 + 1),
            Unit::Year => first_of_month(date, 1),
        };
        day.and_time(NaiveTime::MIN)
    }

    /// Start of the following unit. `start` must be a unit start.
    pub fn next(self, start: NaiveDateTime) -> NaiveDateTime {
        let months = match self {
            Unit::Day => return start + chrono::Duration::days(1),
            Unit::Week => return start + chrono::Duration::days(7),
            Unit::Month => 1,
            Unit::Quarter => 3,
            Unit::HalfYear => 6,
            Unit::Year => 12,
        };
        start
            .checked_add_months(Months::new(months))
            .unwrap_or(start + chrono::Duration::days(31 * months as i64))
    }

    /// Last instant covered by the unit starting at `start`.
    pub fn end_of(self, start: NaiveDateTime) -> NaiveDateTime {
        match self {
            Unit::Week => start + chrono::Duration::milliseconds(WEEK_SPAN_MS),
            _ => self.next(start) - chrono::Duration::milliseconds(1),
        }
    }

    /// Short label for a minor axis bucket.
    pub fn label(self, start: NaiveDateTime) -> String {
        match self {
            Unit::Day => start.format("%-d").to_string(),
            Unit::Week => format!("W{}", start.iso_week().week()),
            Unit::Month => start.format("%b").to_string(),
            Unit::Quarter => format!("Q{}", start.month0() / 3 + 1),
            Unit::HalfYear => {
                if start.month0() < 6 {
                    "H1".to_string()
                } else {
                    "H2".to_string()
                }
            }
            Unit::Year => start.format("%Y").to_string(),
        }
    }

    /// Long label for a major axis bucket.
    pub fn heading(self, start: NaiveDateTime) -> String {
        match self {
            Unit::Month => start.format("%b %Y").to_string(),
            Unit::Year => start.format("%Y").to_string(),
            _ => self.label(start),
        }
    }
}

fn first_of_month(date: NaiveDate, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap()
    }

    #[test]
    fn parses_units() {
        assert_eq!("week".parse::<Sight>().unwrap(), Sight::Week);
        assert_eq!("halfYear".parse::<Sight>().unwrap(), Sight::HalfYear);
        assert!("fortnight".parse::<Sight>().is_err());
        for sight in Sight::ALL {
            assert_eq!(sight.to_string().parse::<Sight>().unwrap(), sight);
        }
    }

    #[test]
    fn week_starts_on_monday() {
        // 2024-01-07 is a Sunday.
        let start = Unit::Week.start_of(at(2024, 1, 7));
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let end = Unit::Week.end_of(start);
        assert_eq!(end.to_string(), "2024-01-07 23:59:59");
        assert_eq!(Unit::Week.label(start), "W1");
    }

    #[test]
    fn quarter_and_half_year_boundaries() {
        let q = Unit::Quarter.start_of(at(2024, 8, 19));
        assert_eq!(q.date(), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(Unit::Quarter.next(q).date(), NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
        assert_eq!(Unit::Quarter.label(q), "Q3");

        let h = Unit::HalfYear.start_of(at(2024, 5, 31));
        assert_eq!(h.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(Unit::HalfYear.label(h), "H1");
        assert_eq!(Unit::HalfYear.label(Unit::HalfYear.next(h)), "H2");
    }

    #[test]
    fn month_end_handles_leap_february() {
        let feb = Unit::Month.start_of(at(2024, 2, 10));
        assert_eq!(Unit::Month.end_of(feb).to_string(), "2024-02-29 23:59:59.999");
    }
}
