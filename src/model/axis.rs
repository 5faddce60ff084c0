use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

use super::bar::Geometry;
use super::calendar::DATE_TIME_FORMAT;
use super::sight::{Sight, Unit};
use super::timeline::Timeline;

/// Predicate flagging non-working days on the minor axis.
pub type RestDayFn = dyn Fn(NaiveDate) -> bool + Send + Sync;

/// Saturday and Sunday.
pub fn default_rest_day(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Upper bound on buckets per row, for absurdly wide panes.
const MAX_BUCKETS: usize = 4_096;

/// One tick region of the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisBucket {
    pub label: String,
    pub left: f64,
    pub width: f64,
    /// Start of the bucket as `YYYY-MM-DD HH:mm:ss`.
    pub key: String,
    /// Non-working day; only ever set on day-zoom minor buckets.
    pub is_rest_day: bool,
}

/// Walk `unit` across the visible range, returning each unit's start and end.
fn walk(unit: Unit, timeline: &Timeline, chart_width: f64) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let calendar = timeline.calendar();
    let (visible_start, visible_end) = timeline.visible_range(chart_width);
    let mut start = unit.start_of(calendar.naive(visible_start));
    let mut spans = Vec::new();
    loop {
        spans.push((start, unit.end_of(start)));
        start = unit.next(start);
        if calendar.timestamp(start) >= visible_end + 1 || spans.len() >= MAX_BUCKETS {
            break;
        }
    }
    spans
}

fn bucket(
    timeline: &Timeline,
    label: String,
    start: NaiveDateTime,
    end: NaiveDateTime,
    is_rest_day: bool,
) -> AxisBucket {
    let calendar = timeline.calendar();
    let start_ms = calendar.timestamp(start);
    AxisBucket {
        label,
        left: timeline.time_to_px(start_ms),
        width: timeline.width_for_range(start_ms, calendar.timestamp(end)),
        key: start.format(DATE_TIME_FORMAT).to_string(),
        is_rest_day,
    }
}

/// Coarse buckets (months or years). The first one is clipped to the left
/// edge of the pane so its heading stays readable.
pub fn major_buckets(timeline: &Timeline, chart_width: f64) -> Vec<AxisBucket> {
    let unit = timeline.sight().major_unit();
    let visible_start = timeline.calendar().naive(timeline.visible_range(chart_width).0);
    walk(unit, timeline, chart_width)
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| {
            let label = unit.heading(start);
            let start = if i == 0 { visible_start.max(start) } else { start };
            bucket(timeline, label, start, end, false)
        })
        .collect()
}

/// Fine buckets at the zoom level's own granularity.
pub fn minor_buckets(timeline: &Timeline, chart_width: f64, is_rest_day: &RestDayFn) -> Vec<AxisBucket> {
    let unit = timeline.sight().minor_unit();
    let flag_rest_days = timeline.sight() == Sight::Day;
    walk(unit, timeline, chart_width)
        .into_iter()
        .map(|(start, end)| {
            let rest = flag_rest_days && is_rest_day(start.date());
            bucket(timeline, unit.label(start), start, end, rest)
        })
        .collect()
}

/// The slot under timeline pixel `px`, used to preview and seed a new bar on
/// a row without dates.
pub fn slot_geometry(timeline: &Timeline, px: f64) -> Geometry {
    let calendar = timeline.calendar();
    let unit = timeline.sight().slot_unit();
    let start = unit.start_of(calendar.naive(timeline.px_to_time(px.max(0.0))));
    let end = unit.end_of(start);
    let start_ms = calendar.timestamp(start);
    Geometry::new(
        timeline.time_to_px(start_ms),
        timeline.width_for_range(start_ms, calendar.timestamp(end)),
    )
}
