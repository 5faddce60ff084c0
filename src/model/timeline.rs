use super::calendar::{Calendar, MS_PER_DAY};
use super::sight::Sight;

/// Which side of the visible window an off-screen bar lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarSide {
    Left,
    Right,
}

/// Maps epoch milliseconds onto a horizontal pixel axis.
///
/// Pixel 0 is the epoch. The pan offset is the pixel at the left edge of the
/// chart pane and never goes negative.
#[derive(Debug, Clone)]
pub struct Timeline {
    sight: Sight,
    pan_offset: f64,
    /// Fixed temporal anchor used when switching zoom levels.
    anchor: i64,
    calendar: Calendar,
    min_bar_px: f64,
}

impl Timeline {
    /// Starts with the anchor at the left edge of the chart.
    pub fn new(sight: Sight, anchor: i64, calendar: Calendar, min_bar_px: f64) -> Self {
        let mut timeline = Self {
            sight,
            pan_offset: 0.0,
            anchor,
            calendar,
            min_bar_px,
        };
        timeline.set_pan_offset(timeline.time_to_px(anchor));
        timeline
    }

    pub fn sight(&self) -> Sight {
        self.sight
    }

    pub fn anchor(&self) -> i64 {
        self.anchor
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn px_unit_amp(&self) -> f64 {
        self.sight.px_unit_amp()
    }

    pub fn time_to_px(&self, ms: i64) -> f64 {
        ms as f64 / self.px_unit_amp()
    }

    pub fn px_to_time(&self, px: f64) -> i64 {
        (px * self.px_unit_amp()).round() as i64
    }

    pub fn pan_offset(&self) -> f64 {
        self.pan_offset
    }

    pub fn set_pan_offset(&mut self, px: f64) {
        self.pan_offset = if px.is_finite() { px.max(0.0) } else { 0.0 };
    }

    pub fn pan_by(&mut self, delta: f64) {
        self.set_pan_offset(self.pan_offset + delta);
    }

    /// Epoch-ms range covered by a chart pane `chart_width` pixels wide.
    pub fn visible_range(&self, chart_width: f64) -> (i64, i64) {
        let start = self.px_to_time(self.pan_offset);
        (start, start + self.px_to_time(chart_width.max(0.0)))
    }

    /// Change zoom, keeping the anchor at the same spot in the chart pane.
    pub fn switch_sight(&mut self, sight: Sight) {
        if sight == self.sight {
            return;
        }
        let relative = self.time_to_px(self.anchor) - self.pan_offset;
        self.sight = sight;
        self.set_pan_offset(self.time_to_px(self.anchor) - relative);
    }

    /// Center the start of the day containing `ms`.
    pub fn scroll_to_date(&mut self, ms: i64, chart_width: f64) {
        let day_px = self.time_to_px(self.calendar.start_of_day(ms));
        self.set_pan_offset(day_px - chart_width.max(0.0) / 2.0);
    }

    /// Bring an off-screen bar's nearest edge to the center of the chart.
    pub fn scroll_to_bar(&mut self, left: f64, width: f64, side: BarSide, chart_width: f64) {
        let center = self.pan_offset + chart_width.max(0.0) / 2.0;
        let target = match side {
            BarSide::Left => left + width,
            BarSide::Right => left,
        };
        self.pan_by(target - center);
    }

    /// `None` while any part of the bar is inside the chart pane.
    pub fn offscreen_side(&self, left: f64, width: f64, chart_width: f64) -> Option<BarSide> {
        if left + width < self.pan_offset {
            Some(BarSide::Left)
        } else if left > self.pan_offset + chart_width {
            Some(BarSide::Right)
        } else {
            None
        }
    }

    /// Pixel width of a time range at the current zoom. No state is touched.
    pub fn width_for_range(&self, start: i64, end: i64) -> f64 {
        (end - start) as f64 / self.px_unit_amp()
    }

    /// Narrowest a bar may be drawn: a whole day, and never under the
    /// configured pixel floor.
    pub fn min_bar_width(&self) -> f64 {
        self.time_to_px(MS_PER_DAY).max(self.min_bar_px)
    }

    /// `min_bar_width` in milliseconds.
    pub fn min_bar_span(&self) -> i64 {
        self.px_to_time(self.min_bar_width())
    }
}
