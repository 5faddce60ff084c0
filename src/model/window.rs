use std::ops::Range;

/// Extra rows materialized around the viewport during fast scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPadding {
    pub lookahead: usize,
    pub back: usize,
}

impl Default for RowPadding {
    fn default() -> Self {
        Self {
            lookahead: 10,
            back: 5,
        }
    }
}

/// Contiguous slice of rows the renderer should materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowWindow {
    pub start: usize,
    pub count: usize,
}

impl RowWindow {
    /// The raw window; may run past the last row.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.count
    }

    /// The window clamped to `total` rows.
    pub fn clamped(&self, total: usize) -> Range<usize> {
        self.start.min(total)..(self.start + self.count).min(total)
    }
}

pub fn visible_rows(
    scroll_top: f64,
    row_height: f64,
    viewport_height: f64,
    padding: RowPadding,
) -> RowWindow {
    if !(row_height > 0.0) {
        return RowWindow::default();
    }
    let rows_in_view = (viewport_height.max(0.0) / row_height).ceil() as usize;
    let first = (scroll_top.max(0.0) / row_height).ceil() as usize;
    RowWindow {
        start: first.saturating_sub(padding.back),
        count: rows_in_view + padding.lookahead,
    }
}

/// Scrollable body height; never shorter than the viewport.
pub fn content_height(row_count: usize, row_height: f64, top_padding: f64, viewport_height: f64) -> f64 {
    (row_count as f64 * row_height + top_padding).max(viewport_height)
}

/// Top of the hover indicator for a pointer `offset_y` pixels into the body
/// content, or `None` when the pointer is outside the rows.
pub fn indicator_top(offset_y: f64, row_count: usize, row_height: f64, top_padding: f64) -> Option<f64> {
    if !(row_height > 0.0) {
        return None;
    }
    let y = offset_y - top_padding;
    if y < 0.0 || y >= row_count as f64 * row_height {
        return None;
    }
    Some((y / row_height).floor() * row_height + top_padding)
}
