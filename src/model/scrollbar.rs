use super::timeline::Timeline;

/// Sizing constants for the horizontal scrollbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollbarMetrics {
    pub track_length: f64,
    pub min_thumb_width: f64,
    /// Scrollable width always exceeds the chart pane by at least this much.
    pub margin: f64,
}

impl Default for ScrollbarMetrics {
    fn default() -> Self {
        Self {
            track_length: 160.0,
            min_thumb_width: 30.0,
            margin: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thumb {
    pub left: f64,
    pub width: f64,
}

fn anchor_px(timeline: &Timeline) -> f64 {
    let calendar = timeline.calendar();
    timeline.time_to_px(calendar.start_of_day(timeline.anchor()))
}

/// Virtual scroll extent: how far the view has wandered from the anchor,
/// never less than the pane plus the margin.
pub fn scroll_width(timeline: &Timeline, chart_width: f64, metrics: &ScrollbarMetrics) -> f64 {
    let wandered = (chart_width + timeline.pan_offset() - anchor_px(timeline)).abs();
    wandered.max(chart_width + metrics.margin)
}

/// Rate of thumb pixels per timeline pixel.
fn rate(timeline: &Timeline, chart_width: f64, metrics: &ScrollbarMetrics) -> f64 {
    let scroll = scroll_width(timeline, chart_width, metrics);
    if scroll > 0.0 {
        chart_width.max(0.0) / scroll
    } else {
        0.0
    }
}

/// Thumb placement. Centered while the view sits on the anchor, sliding
/// proportionally as the view pans away.
pub fn thumb(timeline: &Timeline, chart_width: f64, metrics: &ScrollbarMetrics) -> Thumb {
    let rate = rate(timeline, chart_width, metrics);
    let width = (rate * metrics.track_length).max(metrics.min_thumb_width);
    let calendar = timeline.calendar();
    let view_start = calendar.start_of_day(timeline.visible_range(chart_width).0);
    let half = (chart_width - width) / 2.0;
    let left = half + rate * (timeline.time_to_px(view_start) - anchor_px(timeline));
    let max_left = (chart_width - width).max(0.0);
    Thumb {
        left: left.clamp(0.0, max_left),
        width,
    }
}

/// Thumb drag in progress; the rate is frozen at drag start so the view
/// follows the pointer linearly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbDrag {
    origin_pan: f64,
    rate: f64,
}

impl ThumbDrag {
    pub fn begin(timeline: &Timeline, chart_width: f64, metrics: &ScrollbarMetrics) -> Self {
        Self {
            origin_pan: timeline.pan_offset(),
            rate: rate(timeline, chart_width, metrics),
        }
    }

    /// Pan offset for a thumb moved `delta` pixels from where it was grabbed.
    pub fn pan_for(&self, delta: f64) -> f64 {
        if self.rate > 0.0 {
            (self.origin_pan + delta / self.rate).max(0.0)
        } else {
            self.origin_pan
        }
    }
}
