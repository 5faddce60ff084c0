use super::task::{NodeId, TaskNode};
use super::timeline::Timeline;
use super::tree::TaskTree;

/// Where a bar is in its drag lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    Start,
    Moving,
    #[default]
    End,
}

/// Horizontal placement of a bar in timeline pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    pub left: f64,
    pub width: f64,
}

impl Geometry {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// Vertical layout shared by all bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    pub row_height: f64,
    pub bar_height: f64,
    pub top_padding: f64,
}

impl BarLayout {
    pub fn row_top(&self, display_index: usize) -> f64 {
        self.top_padding
            + display_index as f64 * self.row_height
            + (self.row_height - self.bar_height) / 2.0
    }
}

/// Render record for one visible task.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub key: String,
    pub node: NodeId,
    pub display_index: usize,
    pub left: f64,
    pub width: f64,
    pub row_top: f64,
    pub gesture: GestureState,
    /// Set when the task lacks a start or end date.
    pub invalid_range: bool,
    /// Set while a persistence call for this task is pending.
    pub loading: bool,
    pub depth: usize,
    pub child_count: usize,
    pub collapsed: bool,
}

impl Bar {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.left, self.width)
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.left = geometry.left;
        self.width = geometry.width;
    }
}

/// Day-aligned span of a task in epoch ms, widened to the minimum bar span.
pub fn task_span(node: &TaskNode, timeline: &Timeline) -> Option<(i64, i64)> {
    let calendar = timeline.calendar();
    let start = calendar.start_of_day(node.start?);
    let mut end = calendar.end_of_day(node.end?);
    let min_span = timeline.min_bar_span();
    if end - start < min_span {
        end = start + min_span;
    }
    Some((start, end))
}

/// Geometry for a span at the current zoom.
pub fn span_geometry(span: (i64, i64), timeline: &Timeline) -> Geometry {
    let left = timeline.time_to_px(span.0);
    Geometry::new(left, timeline.width_for_range(span.0, span.1))
}

/// One bar per visible node, in display order.
pub fn build_bars(tree: &TaskTree, timeline: &Timeline, layout: &BarLayout) -> Vec<Bar> {
    tree.display()
        .iter()
        .enumerate()
        .filter_map(|(row, &id)| tree.get(id).map(|node| (row, node)))
        .map(|(row, node)| {
            let geometry = task_span(node, timeline)
                .map(|span| span_geometry(span, timeline))
                .unwrap_or_default();
            Bar {
                key: node.key.clone(),
                node: node.id,
                display_index: row,
                left: geometry.left,
                width: geometry.width,
                row_top: layout.row_top(row),
                gesture: GestureState::End,
                invalid_range: !node.has_range(),
                loading: false,
                depth: node.depth,
                child_count: node.children.len(),
                collapsed: node.collapsed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::calendar::{Calendar, MS_PER_DAY};
    use crate::model::sight::Sight;
    use crate::model::task::{DateKeys, Record};
    use serde_json::json;

    const LAYOUT: BarLayout = BarLayout {
        row_height: 28.0,
        bar_height: 8.0,
        top_padding: 0.0,
    };

    fn tree() -> TaskTree {
        let data: Vec<Record> = serde_json::from_value(json!([
            { "key": "same", "startDate": "2024-01-03", "endDate": "2024-01-03" },
            { "key": "span", "startDate": "2024-01-01", "endDate": "2024-01-05" },
            { "key": "open", "startDate": "2024-01-01" }
        ]))
        .unwrap();
        TaskTree::ingest(&data, DateKeys::default(), &Calendar::utc())
    }

    fn timeline(sight: Sight) -> Timeline {
        Timeline::new(sight, 0, Calendar::utc(), 11.0)
    }

    #[test]
    fn same_day_task_is_exactly_minimum_width() {
        let tree = tree();
        for sight in Sight::ALL {
            let t = timeline(sight);
            let bars = build_bars(&tree, &t, &LAYOUT);
            assert!((bars[0].width - t.min_bar_width()).abs() < 1e-9, "{sight}");
            assert!(!bars[0].invalid_range);
        }
    }

    #[test]
    fn multi_day_task_spans_whole_days() {
        let t = timeline(Sight::Day);
        let bars = build_bars(&tree(), &t, &LAYOUT);
        let span = &bars[1];
        assert_eq!(span.left, 1_704_067_200_000.0 / 2_880_000.0);
        assert!((span.width - (5 * MS_PER_DAY - 1) as f64 / 2_880_000.0).abs() < 1e-9);
        for bar in &bars {
            assert!(bar.width >= t.min_bar_width() || bar.invalid_range);
        }
    }

    #[test]
    fn open_range_is_flagged_and_flat() {
        let bars = build_bars(&tree(), &timeline(Sight::Week), &LAYOUT);
        let open = &bars[2];
        assert!(open.invalid_range);
        assert_eq!(open.width, 0.0);
        assert_eq!(open.left, 0.0);
    }

    #[test]
    fn rows_are_centered_in_their_slot() {
        let bars = build_bars(&tree(), &timeline(Sight::Day), &LAYOUT);
        assert_eq!(bars[0].row_top, 10.0);
        assert_eq!(bars[2].row_top, 2.0 * 28.0 + 10.0);
    }
}
