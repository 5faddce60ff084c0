//! The chart engine: owns the task tree, the timeline and every piece of
//! interaction state, and hands renderers plain geometry to draw.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::config::ChartConfig;
use crate::error::{GanttError, Result};
use crate::model::axis::{self, default_rest_day, RestDayFn};
use crate::model::bar::{build_bars, span_geometry, BarLayout};
use crate::model::calendar::{MS_PER_DAY, MS_PER_SECOND};
use crate::model::column::column_widths;
use crate::model::scrollbar;
use crate::model::viewport::PaneLimits;
use crate::model::window::{self, RowWindow};
use crate::model::{
    AxisBucket, Bar, BarSide, Column, DragSession, Geometry, GestureState, MoveType, NodeId,
    Record, Sight, TaskTree, Thumb, ThumbDrag, Timeline, Viewport,
};
use crate::persist::{Resolution, UpdateOutcome, UpdateRequest};

/// A finished drag waiting on the host's persistence callback.
#[derive(Debug, Clone)]
struct PendingUpdate {
    node: NodeId,
    /// Rollback target, captured by value at drag start.
    origin: Geometry,
    origin_invalid: bool,
    /// Sight the origin pixels were measured at.
    sight: Sight,
    /// Dragged span in epoch ms, so the bar survives zoom changes.
    span: (i64, i64),
    start: (i64, String),
    end: (i64, String),
}

pub struct GanttEngine {
    config: ChartConfig,
    timeline: Timeline,
    viewport: Viewport,
    tree: TaskTree,
    layout: BarLayout,
    bars: Vec<Bar>,
    /// Index into `bars` for each node, `None` when the node is hidden.
    bar_slots: Vec<Option<usize>>,
    columns: Vec<Column>,
    rest_day: Box<RestDayFn>,
    scroll_top: f64,
    scrolling: bool,
    pointer_pressed: bool,
    indicator: Option<f64>,
    session: Option<DragSession>,
    pending: HashMap<Uuid, PendingUpdate>,
    generation: u64,
    revision: u64,
}

impl GanttEngine {
    /// Anchored `anchor_days` before now.
    pub fn new(config: ChartConfig) -> Self {
        let anchor = config.calendar().now() - config.anchor_days * MS_PER_DAY;
        Self::with_anchor(config, anchor)
    }

    pub fn with_anchor(config: ChartConfig, anchor: i64) -> Self {
        let calendar = config.calendar();
        let timeline = Timeline::new(config.unit, anchor, calendar, config.min_bar_px);
        let viewport = Viewport::new(PaneLimits::from_config(&config), config.row_height);
        let tree = TaskTree::ingest(&[], config.date_keys(), &calendar);
        let layout = config.bar_layout();
        Self {
            config,
            timeline,
            viewport,
            tree,
            layout,
            bars: Vec::new(),
            bar_slots: Vec::new(),
            columns: vec![Column::new("name", "Name")],
            rest_day: Box::new(default_rest_day),
            scroll_top: 0.0,
            scrolling: false,
            pointer_pressed: false,
            indicator: None,
            session: None,
            pending: HashMap::new(),
            generation: 0,
            revision: 0,
        }
    }

    // ---- data and settings ----

    /// Replace the task data. In-flight updates from the previous data set
    /// are forgotten and their outcomes will be ignored.
    pub fn set_data(&mut self, records: &[Record]) {
        self.session = None;
        self.pointer_pressed = false;
        if !self.pending.is_empty() {
            debug!(
                "dropping {} in-flight update(s) from generation {}",
                self.pending.len(),
                self.generation
            );
            self.pending.clear();
        }
        self.generation += 1;
        self.tree = TaskTree::ingest(records, self.config.date_keys(), self.timeline.calendar());
        info!(
            "loaded {} task(s), {} visible",
            self.tree.len(),
            self.tree.display().len()
        );
        self.rebuild_bars();
    }

    /// Change which record fields hold the dates and re-read the data.
    pub fn set_date_keys(&mut self, start: impl Into<String>, end: impl Into<String>) {
        self.config.start_date_key = start.into();
        self.config.end_date_key = end.into();
        let records = self.tree.to_records();
        self.set_data(&records);
    }

    pub fn set_rest_day<F>(&mut self, is_rest_day: F)
    where
        F: Fn(NaiveDate) -> bool + Send + Sync + 'static,
    {
        self.rest_day = Box::new(is_rest_day);
        self.touch();
    }

    pub fn reset_rest_day(&mut self) {
        self.set_rest_day(default_rest_day);
    }

    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        (self.rest_day)(date)
    }

    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.columns = columns;
        self.touch();
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_widths(&self) -> Vec<f64> {
        column_widths(&self.columns, self.viewport.table_width)
    }

    // ---- layout and navigation ----

    /// Change zoom. An unfinished drag is cancelled since its pixels belong
    /// to the old scale.
    pub fn switch_sight(&mut self, sight: Sight) {
        if sight == self.timeline.sight() {
            return;
        }
        self.cancel_drag();
        self.timeline.switch_sight(sight);
        self.config.unit = sight;
        debug!("switched to {sight} view");
        self.rebuild_bars();
    }

    pub fn sync_size(&mut self, width: f64, height: f64) -> bool {
        let changed = self.viewport.sync_size(width, height);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn resize_table(&mut self, width: f64) {
        self.viewport.resize_table(width);
        self.touch();
    }

    pub fn toggle_table_collapse(&mut self) {
        self.viewport.toggle_table_collapse();
        self.touch();
    }

    pub fn set_row_height(&mut self, row_height: f64) {
        if !(row_height > 0.0) || row_height == self.layout.row_height {
            return;
        }
        self.config.row_height = row_height;
        self.layout.row_height = row_height;
        self.viewport.row_height = row_height;
        self.rebuild_bars();
    }

    pub fn set_pan_offset(&mut self, px: f64) {
        self.timeline.set_pan_offset(px);
        self.touch();
    }

    pub fn pan_by(&mut self, delta: f64) {
        self.timeline.pan_by(delta);
        self.touch();
    }

    /// Horizontal wheel input. Marks the chart as scrolling until
    /// `end_scrolling` is called.
    pub fn handle_wheel(&mut self, delta_x: f64) {
        if delta_x == 0.0 || !delta_x.is_finite() {
            return;
        }
        self.scrolling = true;
        self.pan_by(delta_x);
    }

    pub fn end_scrolling(&mut self) {
        if self.scrolling {
            self.scrolling = false;
            self.touch();
        }
    }

    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        let max = (self.content_height() - self.viewport.body_height()).max(0.0);
        let scroll_top = if scroll_top.is_finite() { scroll_top.clamp(0.0, max) } else { 0.0 };
        if scroll_top != self.scroll_top {
            self.scroll_top = scroll_top;
            self.touch();
        }
    }

    pub fn scroll_to_today(&mut self) {
        let now = self.timeline.calendar().now();
        self.scroll_to_date(now);
    }

    pub fn scroll_to_date(&mut self, ms: i64) {
        self.timeline.scroll_to_date(ms, self.viewport.chart_width);
        self.touch();
    }

    pub fn scroll_to_bar(&mut self, node: NodeId, side: BarSide) -> Result<()> {
        let bar = self.bar(node).ok_or(GanttError::NoSuchNode(node))?;
        let geometry = bar.geometry();
        self.timeline
            .scroll_to_bar(geometry.left, geometry.width, side, self.viewport.chart_width);
        self.touch();
        Ok(())
    }

    /// Side of the pane a visible row's bar has scrolled off to.
    pub fn offscreen_side(&self, node: NodeId) -> Option<BarSide> {
        let bar = self.bar(node).filter(|bar| !bar.invalid_range)?;
        self.timeline
            .offscreen_side(bar.left, bar.width, self.viewport.chart_width)
    }

    pub fn width_for_range(&self, start: i64, end: i64) -> f64 {
        self.timeline.width_for_range(start, end)
    }

    /// `width_for_range` for date strings in any format the engine parses.
    pub fn width_for_dates(&self, start: &str, end: &str) -> Result<f64> {
        let calendar = self.timeline.calendar();
        Ok(self.width_for_range(calendar.parse(start)?, calendar.parse(end)?))
    }

    // ---- tree ----

    pub fn expand_all(&mut self) {
        if self.tree.set_all_collapsed(false) {
            self.rebuild_bars();
        }
    }

    pub fn collapse_all(&mut self) {
        if self.tree.set_all_collapsed(true) {
            self.rebuild_bars();
        }
    }

    pub fn set_collapsed(&mut self, node: NodeId, collapsed: bool) -> Result<()> {
        if self.tree.set_collapsed(node, collapsed)? {
            self.rebuild_bars();
        }
        Ok(())
    }

    pub fn toggle_collapsed(&mut self, node: NodeId) -> Result<()> {
        let collapsed = self.tree.node(node)?.collapsed;
        self.set_collapsed(node, !collapsed)
    }

    // ---- derived views ----

    pub fn major_buckets(&self) -> Vec<AxisBucket> {
        axis::major_buckets(&self.timeline, self.viewport.chart_width)
    }

    pub fn minor_buckets(&self) -> Vec<AxisBucket> {
        axis::minor_buckets(&self.timeline, self.viewport.chart_width, &*self.rest_day)
    }

    /// Slot a new bar would occupy for a pointer at timeline pixel `px`.
    pub fn slot_at(&self, px: f64) -> Geometry {
        axis::slot_geometry(&self.timeline, px)
    }

    pub fn row_window(&self) -> RowWindow {
        window::visible_rows(
            self.scroll_top,
            self.layout.row_height,
            self.viewport.body_height(),
            self.config.row_padding(),
        )
    }

    pub fn content_height(&self) -> f64 {
        window::content_height(
            self.bars.len(),
            self.layout.row_height,
            self.layout.top_padding,
            self.viewport.body_height(),
        )
    }

    /// Every displayed row's bar, in display order.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Bars inside the virtual-scroll window.
    pub fn visible_bars(&self) -> &[Bar] {
        &self.bars[self.row_window().clamped(self.bars.len())]
    }

    pub fn bar(&self, node: NodeId) -> Option<&Bar> {
        self.bar_slot(node).map(|slot| &self.bars[slot])
    }

    pub fn thumb(&self) -> Thumb {
        scrollbar::thumb(&self.timeline, self.viewport.chart_width, &self.config.scrollbar())
    }

    pub fn begin_thumb_drag(&self) -> ThumbDrag {
        ThumbDrag::begin(&self.timeline, self.viewport.chart_width, &self.config.scrollbar())
    }

    pub fn drag_thumb(&mut self, drag: &ThumbDrag, delta: f64) {
        self.set_pan_offset(drag.pan_for(delta));
    }

    /// Pointer moved to `offset_y` pixels into the body content.
    pub fn hover(&mut self, offset_y: f64) {
        let top = if self.pointer_pressed {
            None
        } else {
            window::indicator_top(
                offset_y,
                self.bars.len(),
                self.layout.row_height,
                self.layout.top_padding,
            )
        };
        if top != self.indicator {
            self.indicator = top;
            self.touch();
        }
    }

    pub fn leave(&mut self) {
        if self.indicator.take().is_some() {
            self.touch();
        }
    }

    pub fn indicator_top(&self) -> Option<f64> {
        self.indicator
    }

    // ---- gestures ----

    /// Start dragging a bar. Rows without dates always start a `Create`
    /// gesture seeded from the slot under the pointer; the row stays an
    /// invalid range until the pointer first moves.
    pub fn begin_drag(&mut self, node: NodeId, move_type: MoveType, pointer_x: f64) -> Result<Uuid> {
        if self.is_loading(node) {
            return Err(GanttError::BarBusy(node));
        }
        let slot = self.bar_slot(node).ok_or(GanttError::NoSuchNode(node))?;
        if self.session.is_some() {
            debug!("superseding a drag that never finished");
            self.cancel_drag();
        }

        let bar = &self.bars[slot];
        let move_type = match (bar.invalid_range, move_type) {
            (true, _) => MoveType::Create,
            (false, MoveType::Create) => MoveType::Move,
            (false, other) => other,
        };
        let origin = bar.geometry();
        let origin_invalid = bar.invalid_range;
        let base = if move_type == MoveType::Create {
            self.slot_at(pointer_x)
        } else {
            origin
        };

        let session = DragSession::new(node, move_type, origin, origin_invalid, base, pointer_x);
        let id = session.id;
        debug!("drag {id} started on {node:?} ({move_type:?})");
        self.bars[slot].gesture = GestureState::Start;
        self.session = Some(session);
        self.pointer_pressed = true;
        self.indicator = None;
        self.touch();
        Ok(id)
    }

    pub fn drag_to(&mut self, pointer_x: f64) -> Result<Geometry> {
        let min_width = self.timeline.min_bar_width();
        let session = self.session.as_mut().ok_or(GanttError::NoActiveDrag)?;
        let geometry = session.drag_to(pointer_x, min_width);
        if !session.moved() {
            return Ok(geometry);
        }
        let node = session.node;
        if let Some(slot) = self.bar_slot(node) {
            let bar = &mut self.bars[slot];
            bar.set_geometry(geometry);
            bar.invalid_range = false;
            bar.gesture = GestureState::Moving;
        }
        self.touch();
        Ok(geometry)
    }

    /// Abandon the active drag and put the bar back. Returns whether there
    /// was one.
    pub fn cancel_drag(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        debug!("drag {} cancelled", session.id);
        self.pointer_pressed = false;
        self.restore(session.node, session.origin, session.origin_invalid);
        self.touch();
        true
    }

    /// Finish the active drag.
    ///
    /// Returns the update to persist, or `None` when the gesture leaves the
    /// task's dates unchanged. The bar keeps its dragged geometry and is
    /// marked loading until the outcome is passed to `settle_update`.
    pub fn end_drag(&mut self) -> Result<Option<UpdateRequest>> {
        let mut session = self.session.take().ok_or(GanttError::NoActiveDrag)?;
        let moved = session.moved();
        session.finish();
        self.pointer_pressed = false;
        self.touch();

        let returned = session.move_type != MoveType::Create && session.current == session.origin;
        if !moved || returned {
            debug!("drag {} released without moving {:?}", session.id, session.node);
            self.restore(session.node, session.origin, session.origin_invalid);
            return Ok(None);
        }

        let geometry = session.current;
        let calendar = *self.timeline.calendar();
        let (task_start, task_end) = {
            let node = self.tree.node(session.node)?;
            (node.start, node.end)
        };
        let (start_ms, end_ms) = self.released_span(&session, task_start, task_end);
        let start = (start_ms, calendar.format(start_ms));
        let end = (end_ms, calendar.format(end_ms));

        let node = self.tree.node(session.node)?;
        let unchanged = match (node.start, node.end) {
            (Some(s), Some(e)) => {
                calendar.format(calendar.start_of_day(s)) == start.1
                    && calendar.format(calendar.end_of_day(e)) == end.1
            }
            _ => false,
        };
        if unchanged {
            debug!("drag {} left {:?} on the same days", session.id, session.node);
            self.restore(session.node, session.origin, session.origin_invalid);
            return Ok(None);
        }

        let request = UpdateRequest {
            id: session.id,
            generation: self.generation,
            node: session.node,
            record: node.record.clone(),
            start_date: start.1.clone(),
            end_date: end.1.clone(),
        };
        info!(
            "requesting {} -> {} for task '{}'",
            request.start_date, request.end_date, node.key
        );
        self.pending.insert(
            session.id,
            PendingUpdate {
                node: session.node,
                origin: session.origin,
                origin_invalid: session.origin_invalid,
                sight: self.timeline.sight(),
                span: (
                    self.timeline.px_to_time(geometry.left),
                    self.timeline.px_to_time(geometry.right()),
                ),
                start,
                end,
            },
        );
        if let Some(slot) = self.bar_slot(session.node) {
            let bar = &mut self.bars[slot];
            bar.gesture = GestureState::End;
            bar.loading = true;
        }
        Ok(Some(request))
    }

    /// Apply the host's answer to an update. Returns false when the outcome
    /// is unknown or belongs to data that has since been replaced.
    pub fn settle_update(&mut self, outcome: UpdateOutcome) -> bool {
        if outcome.generation != self.generation {
            debug!("ignoring outcome {} from generation {}", outcome.id, outcome.generation);
            return false;
        }
        let Some(pending) = self.pending.remove(&outcome.id) else {
            debug!("ignoring unknown outcome {}", outcome.id);
            return false;
        };
        match outcome.resolution {
            Resolution::Accepted => {
                if let Err(e) = self.tree.commit_dates(pending.node, pending.start, pending.end) {
                    warn!("could not commit dates: {e}");
                }
                self.rebuild_bars();
            }
            Resolution::Rejected => {
                info!("update for {:?} rejected, rolling back", pending.node);
                self.roll_back(&pending);
            }
            Resolution::Failed(reason) => {
                warn!("update for {:?} failed ({reason}), rolling back", pending.node);
                self.roll_back(&pending);
            }
        }
        true
    }

    // ---- queries ----

    pub fn is_loading(&self, node: NodeId) -> bool {
        self.pending.values().any(|p| p.node == node)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn active_drag(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn pointer_pressed(&self) -> bool {
        self.pointer_pressed
    }

    pub fn scrolling(&self) -> bool {
        self.scrolling
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn sight(&self) -> Sight {
        self.timeline.sight()
    }

    pub fn pan_offset(&self) -> f64 {
        self.timeline.pan_offset()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tree(&self) -> &TaskTree {
        &self.tree
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bumped on every visible change; renderers may skip frames where it
    /// has not moved.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The current data with committed dates, in the shape it was loaded.
    pub fn to_records(&self) -> Vec<Record> {
        self.tree.to_records()
    }

    // ---- internals ----

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn bar_slot(&self, node: NodeId) -> Option<usize> {
        self.bar_slots.get(node.0).copied().flatten()
    }

    fn restore(&mut self, node: NodeId, origin: Geometry, origin_invalid: bool) {
        if let Some(slot) = self.bar_slot(node) {
            let bar = &mut self.bars[slot];
            bar.set_geometry(origin);
            bar.invalid_range = origin_invalid;
            bar.gesture = GestureState::End;
            bar.loading = self.pending.values().any(|p| p.node == node);
        }
    }

    /// Day-snapped dates for a released drag. Edges the gesture did not
    /// move keep the task's own dates, so the minimum-width extension of a
    /// short task never leaks into its persisted range.
    fn released_span(&self, session: &DragSession, start: Option<i64>, end: Option<i64>) -> (i64, i64) {
        let calendar = self.timeline.calendar();
        let to_time = |px: f64| self.timeline.px_to_time(px);
        let geometry = session.current;
        let left = calendar.start_of_day(to_time(geometry.left));
        let right = calendar.end_of_day(to_time(geometry.right()) - MS_PER_SECOND);

        let (start, end) = match (session.move_type, start, end) {
            (MoveType::Move, Some(s), Some(e)) => {
                let shift = to_time(geometry.left) - to_time(session.origin.left);
                (
                    calendar.start_of_day(calendar.start_of_day(s) + shift),
                    calendar.end_of_day(calendar.end_of_day(e) + shift - MS_PER_SECOND),
                )
            }
            (MoveType::ResizeLeft, Some(_), Some(e)) => {
                let end = calendar.end_of_day(e);
                (left.min(calendar.start_of_day(end)), end)
            }
            (MoveType::ResizeRight, Some(s), Some(_)) => (calendar.start_of_day(s), right),
            _ => (left, right),
        };
        (start, end - (MS_PER_SECOND - 1))
    }

    fn roll_back(&mut self, pending: &PendingUpdate) {
        if pending.sight == self.timeline.sight() {
            self.restore(pending.node, pending.origin, pending.origin_invalid);
            self.touch();
        } else {
            // Origin pixels are from another zoom; the stored dates are
            // untouched so a rebuild reproduces the original bar.
            self.rebuild_bars();
        }
    }

    fn rebuild_bars(&mut self) {
        self.bars = build_bars(&self.tree, &self.timeline, &self.layout);
        self.bar_slots = vec![None; self.tree.len()];
        for (i, bar) in self.bars.iter().enumerate() {
            self.bar_slots[bar.node.0] = Some(i);
        }

        for pending in self.pending.values() {
            if let Some(slot) = self.bar_slots.get(pending.node.0).copied().flatten() {
                let bar = &mut self.bars[slot];
                bar.set_geometry(span_geometry(pending.span, &self.timeline));
                bar.invalid_range = false;
                bar.loading = true;
            }
        }

        let orphaned = self
            .session
            .as_ref()
            .is_some_and(|s| self.bar_slot(s.node).is_none());
        if orphaned {
            debug!("dragged row was hidden, dropping the drag");
            self.session = None;
            self.pointer_pressed = false;
        }
        if let Some(session) = &self.session {
            if let Some(slot) = self.bar_slots.get(session.node.0).copied().flatten() {
                let bar = &mut self.bars[slot];
                bar.gesture = session.state;
                if session.moved() {
                    bar.set_geometry(session.current);
                    bar.invalid_range = false;
                }
            }
        }

        let max_scroll = (self.content_height() - self.viewport.body_height()).max(0.0);
        self.scroll_top = self.scroll_top.min(max_scroll);
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::run_update;
    use serde_json::json;

    const JAN_1_2024: i64 = 1_704_067_200_000;
    const DAY_PX: f64 = 30.0;

    fn engine(data: serde_json::Value) -> GanttEngine {
        let mut engine = GanttEngine::with_anchor(ChartConfig::default(), JAN_1_2024 - 10 * MS_PER_DAY);
        let records: Vec<Record> = serde_json::from_value(data).unwrap();
        engine.set_data(&records);
        engine
    }

    fn sample() -> GanttEngine {
        engine(json!([
            { "key": "build", "startDate": "2024-01-01", "endDate": "2024-01-05" },
            { "key": "later", "startDate": "2024-02-01", "endDate": "2024-02-03" },
            { "key": "unscheduled" }
        ]))
    }

    fn outcome(request: &UpdateRequest, resolution: Resolution) -> UpdateOutcome {
        UpdateOutcome::for_request(request, resolution)
    }

    #[test]
    fn move_by_one_day_requests_shifted_dates() {
        let mut e = sample();
        let node = NodeId(0);
        let bar = e.bar(node).unwrap().clone();
        assert_eq!(bar.left, 591_690.0);

        e.begin_drag(node, MoveType::Move, 1_000.0).unwrap();
        assert!(e.pointer_pressed());
        let g = e.drag_to(1_000.0 + DAY_PX).unwrap();
        assert_eq!(g.left, 591_720.0);

        let request = e.end_drag().unwrap().unwrap();
        assert_eq!(request.start_date, "2024-01-02 00:00:00");
        assert_eq!(request.end_date, "2024-01-06 23:59:59");
        assert_eq!(request.record["key"], "build");
        assert!(e.is_loading(node));
        assert!(e.bar(node).unwrap().loading);
        assert!(!e.pointer_pressed());
    }

    #[test]
    fn rejected_update_restores_exact_geometry() {
        let mut e = sample();
        let node = NodeId(0);
        let before = e.bar(node).unwrap().clone();

        e.begin_drag(node, MoveType::Move, 1_000.0).unwrap();
        e.drag_to(1_030.0).unwrap();
        let request = e.end_drag().unwrap().unwrap();
        assert!(e.settle_update(outcome(&request, Resolution::Rejected)));

        let after = e.bar(node).unwrap();
        assert_eq!(after.left, before.left);
        assert_eq!(after.width, before.width);
        assert!(!after.loading);
        assert!(!after.invalid_range);
        assert_eq!(e.tree().node(node).unwrap().start, Some(JAN_1_2024));
    }

    #[test]
    fn accepted_update_commits_snapped_dates() {
        let mut e = sample();
        let node = NodeId(0);
        e.begin_drag(node, MoveType::Move, 1_000.0).unwrap();
        e.drag_to(1_030.0).unwrap();
        let request = e.end_drag().unwrap().unwrap();
        assert!(e.settle_update(outcome(&request, Resolution::Accepted)));

        let task = e.tree().node(node).unwrap();
        assert_eq!(task.record["startDate"], "2024-01-02 00:00:00");
        assert_eq!(task.record["endDate"], "2024-01-06 23:59:59");
        assert_eq!(task.start, Some(JAN_1_2024 + MS_PER_DAY));

        let bar = e.bar(node).unwrap();
        assert!(!bar.loading);
        assert_eq!(bar.left, 591_720.0);
        assert_eq!(e.to_records()[0]["startDate"], "2024-01-02 00:00:00");
    }

    #[test]
    fn failed_update_rolls_back() {
        let mut e = sample();
        let before = e.bar(NodeId(1)).unwrap().geometry();
        e.begin_drag(NodeId(1), MoveType::ResizeRight, 0.0).unwrap();
        e.drag_to(90.0).unwrap();
        let request = e.end_drag().unwrap().unwrap();
        e.settle_update(outcome(&request, Resolution::Failed("timeout".into())));
        assert_eq!(e.bar(NodeId(1)).unwrap().geometry(), before);
        assert!(!e.is_loading(NodeId(1)));
    }

    #[test]
    fn same_day_drag_is_a_no_op() {
        let mut e = sample();
        let node = NodeId(0);
        let before = e.bar(node).unwrap().geometry();
        e.begin_drag(node, MoveType::ResizeRight, 500.0).unwrap();
        e.drag_to(495.0).unwrap();
        assert_eq!(e.end_drag().unwrap(), None);
        assert_eq!(e.bar(node).unwrap().geometry(), before);
        assert!(!e.is_loading(node));

        e.begin_drag(node, MoveType::Move, 500.0).unwrap();
        assert_eq!(e.end_drag().unwrap(), None);
        assert_eq!(e.bar(node).unwrap().geometry(), before);
    }

    #[test]
    fn busy_bar_rejects_new_drags() {
        let mut e = sample();
        e.begin_drag(NodeId(0), MoveType::Move, 0.0).unwrap();
        e.drag_to(60.0).unwrap();
        let request = e.end_drag().unwrap().unwrap();

        assert!(matches!(
            e.begin_drag(NodeId(0), MoveType::Move, 0.0),
            Err(GanttError::BarBusy(NodeId(0)))
        ));
        assert!(e.begin_drag(NodeId(1), MoveType::Move, 0.0).is_ok());
        e.cancel_drag();

        e.settle_update(outcome(&request, Resolution::Accepted));
        assert!(e.begin_drag(NodeId(0), MoveType::Move, 0.0).is_ok());
    }

    #[test]
    fn drag_without_session_is_an_error() {
        let mut e = sample();
        assert!(matches!(e.drag_to(10.0), Err(GanttError::NoActiveDrag)));
        assert!(matches!(e.end_drag(), Err(GanttError::NoActiveDrag)));
        assert!(!e.cancel_drag());
    }

    #[test]
    fn create_on_an_unscheduled_row() {
        let mut e = sample();
        let node = NodeId(2);
        assert!(e.bar(node).unwrap().invalid_range);

        let jan_3_noon = e.timeline().time_to_px(JAN_1_2024 + 2 * MS_PER_DAY + MS_PER_DAY / 2);
        e.begin_drag(node, MoveType::Move, jan_3_noon).unwrap();
        assert_eq!(e.active_drag().unwrap().move_type, MoveType::Create);
        let bar = e.bar(node).unwrap();
        assert!(bar.invalid_range);
        assert_eq!(bar.gesture, GestureState::Start);

        e.drag_to(jan_3_noon).unwrap();
        assert!(e.bar(node).unwrap().invalid_range);
        e.drag_to(jan_3_noon + 2.0 * DAY_PX).unwrap();
        let bar = e.bar(node).unwrap();
        assert!(!bar.invalid_range);
        assert_eq!(bar.gesture, GestureState::Moving);
        let request = e.end_drag().unwrap().unwrap();
        assert_eq!(request.start_date, "2024-01-03 00:00:00");
        assert_eq!(request.end_date, "2024-01-05 23:59:59");

        e.settle_update(outcome(&request, Resolution::Rejected));
        let bar = e.bar(node).unwrap();
        assert!(bar.invalid_range);
        assert_eq!(bar.width, 0.0);
    }

    #[test]
    fn create_released_in_place_changes_nothing() {
        let mut e = sample();
        let node = NodeId(2);
        let px = e.timeline().time_to_px(JAN_1_2024 + 2 * MS_PER_DAY);
        e.begin_drag(node, MoveType::Create, px).unwrap();
        assert_eq!(e.end_drag().unwrap(), None);

        let bar = e.bar(node).unwrap();
        assert!(bar.invalid_range);
        assert_eq!(bar.width, 0.0);
        assert!(!e.is_loading(node));
        assert_eq!(e.tree().node(node).unwrap().start, None);
    }

    #[test]
    fn short_task_keeps_its_length_at_coarse_zoom() {
        let mut e = engine(json!([
            { "key": "review", "startDate": "2024-01-03", "endDate": "2024-01-03" }
        ]));
        e.switch_sight(Sight::Quarter);
        let node = NodeId(0);
        let before = e.bar(node).unwrap().geometry();
        assert_eq!(before.width, e.timeline().min_bar_width());

        // Out and back to where it started.
        e.begin_drag(node, MoveType::Move, 100.0).unwrap();
        e.drag_to(140.0).unwrap();
        e.drag_to(100.0).unwrap();
        assert_eq!(e.end_drag().unwrap(), None);
        assert_eq!(e.bar(node).unwrap().geometry(), before);

        // One pixel is a day at quarter zoom.
        e.begin_drag(node, MoveType::Move, 100.0).unwrap();
        e.drag_to(102.0).unwrap();
        let request = e.end_drag().unwrap().unwrap();
        assert_eq!(request.start_date, "2024-01-05 00:00:00");
        assert_eq!(request.end_date, "2024-01-05 23:59:59");
        e.settle_update(outcome(&request, Resolution::Rejected));

        e.begin_drag(node, MoveType::ResizeLeft, 100.0).unwrap();
        e.drag_to(99.0).unwrap();
        let request = e.end_drag().unwrap().unwrap();
        assert_eq!(request.start_date, "2024-01-02 00:00:00");
        assert_eq!(request.end_date, "2024-01-03 23:59:59");
    }

    #[test]
    fn stale_outcomes_are_ignored() {
        let mut e = sample();
        e.begin_drag(NodeId(0), MoveType::Move, 0.0).unwrap();
        e.drag_to(30.0).unwrap();
        let request = e.end_drag().unwrap().unwrap();

        let records = e.to_records();
        e.set_data(&records);
        assert!(!e.is_loading(NodeId(0)));
        assert!(!e.settle_update(outcome(&request, Resolution::Accepted)));
        assert_eq!(e.tree().node(NodeId(0)).unwrap().start, Some(JAN_1_2024));

        let unknown = UpdateOutcome {
            id: Uuid::new_v4(),
            generation: e.generation(),
            resolution: Resolution::Accepted,
        };
        assert!(!e.settle_update(unknown));
    }

    #[test]
    fn new_drag_supersedes_an_unfinished_one() {
        let mut e = sample();
        let before = e.bar(NodeId(0)).unwrap().geometry();
        e.begin_drag(NodeId(0), MoveType::Move, 0.0).unwrap();
        e.drag_to(300.0).unwrap();
        e.begin_drag(NodeId(1), MoveType::Move, 0.0).unwrap();
        assert_eq!(e.bar(NodeId(0)).unwrap().geometry(), before);
        assert_eq!(e.active_drag().unwrap().node, NodeId(1));
    }

    #[test]
    fn zoom_switch_keeps_pending_bar_and_cancels_drag() {
        let mut e = sample();
        e.begin_drag(NodeId(0), MoveType::Move, 0.0).unwrap();
        e.drag_to(30.0).unwrap();
        let request = e.end_drag().unwrap().unwrap();
        e.begin_drag(NodeId(1), MoveType::Move, 0.0).unwrap();

        e.switch_sight(Sight::Week);
        assert!(e.active_drag().is_none());
        let bar = e.bar(NodeId(0)).unwrap();
        assert!(bar.loading);
        assert_eq!(bar.left, e.timeline().time_to_px(JAN_1_2024 + MS_PER_DAY));

        e.settle_update(outcome(&request, Resolution::Rejected));
        let bar = e.bar(NodeId(0)).unwrap();
        assert_eq!(bar.left, e.timeline().time_to_px(JAN_1_2024));
        assert!(!bar.loading);
    }

    #[test]
    fn collapse_hides_rows_and_their_bars() {
        let mut e = engine(json!([
            { "key": "epic", "startDate": "2024-01-01", "endDate": "2024-01-31", "children": [
                { "key": "a", "startDate": "2024-01-02", "endDate": "2024-01-04" },
                { "key": "b", "startDate": "2024-01-05", "endDate": "2024-01-09" }
            ]},
            { "key": "solo", "startDate": "2024-01-10", "endDate": "2024-01-11" }
        ]));
        assert_eq!(e.bars().len(), 4);
        e.collapse_all();
        assert_eq!(e.bars().len(), 2);
        assert!(e.bar(NodeId(1)).is_none());
        assert_eq!(e.bar(NodeId(3)).unwrap().display_index, 1);
        e.toggle_collapsed(NodeId(0)).unwrap();
        assert_eq!(e.bars().len(), 4);
        assert!(e.toggle_collapsed(NodeId(99)).is_err());
    }

    #[test]
    fn hover_tracks_rows_but_not_while_dragging() {
        let mut e = sample();
        e.hover(30.0);
        assert_eq!(e.indicator_top(), Some(28.0));
        e.hover(28.0 * 3.0 + 1.0);
        assert_eq!(e.indicator_top(), None);
        e.hover(5.0);
        e.begin_drag(NodeId(0), MoveType::Move, 0.0).unwrap();
        assert_eq!(e.indicator_top(), None);
        e.hover(5.0);
        assert_eq!(e.indicator_top(), None);
        e.cancel_drag();
        e.hover(5.0);
        assert_eq!(e.indicator_top(), Some(0.0));
        e.leave();
        assert_eq!(e.indicator_top(), None);
    }

    #[test]
    fn navigation_and_offscreen_bars() {
        let mut e = sample();
        assert_eq!(e.offscreen_side(NodeId(1)), Some(BarSide::Right));
        assert_eq!(e.offscreen_side(NodeId(2)), None);
        e.scroll_to_bar(NodeId(1), BarSide::Right).unwrap();
        assert_eq!(e.offscreen_side(NodeId(1)), None);
        assert_eq!(e.offscreen_side(NodeId(0)), Some(BarSide::Left));

        e.scroll_to_date(JAN_1_2024);
        let center = e.pan_offset() + e.viewport().chart_width / 2.0;
        assert_eq!(center, 591_690.0);

        let revision = e.revision();
        e.handle_wheel(40.0);
        assert!(e.scrolling());
        assert!(e.revision() > revision);
        e.end_scrolling();
        assert!(!e.scrolling());

        assert_eq!(e.width_for_dates("2024-01-01", "2024-01-02").unwrap(), DAY_PX);
        assert!(e.width_for_dates("soon", "2024-01-02").is_err());
    }

    #[test]
    fn rest_days_only_mark_day_view() {
        let mut e = sample();
        e.scroll_to_date(JAN_1_2024);
        assert!(e.minor_buckets().iter().any(|b| b.is_rest_day));
        e.set_rest_day(|_| false);
        assert!(!e.minor_buckets().iter().any(|b| b.is_rest_day));
        e.reset_rest_day();
        e.switch_sight(Sight::Week);
        assert!(!e.minor_buckets().iter().any(|b| b.is_rest_day));
        assert!(!e.major_buckets().is_empty());
    }

    #[test]
    fn virtual_window_limits_visible_bars() {
        let rows: Vec<_> = (0..200)
            .map(|i| json!({ "key": format!("t{i}"), "startDate": "2024-01-01", "endDate": "2024-01-02" }))
            .collect();
        let mut e = engine(serde_json::Value::Array(rows));
        e.sync_size(1320.0, 418.0);
        assert_eq!(e.visible_bars().len(), 23);
        e.set_scroll_top(28.0 * 100.0);
        assert_eq!(e.visible_bars()[0].display_index, 95);
        e.set_scroll_top(1e9);
        assert_eq!(e.scroll_top(), e.content_height() - e.viewport().body_height());
    }

    #[test]
    fn date_keys_can_be_renamed() {
        let mut e = engine(json!([{ "key": "x", "from": "2024-01-01", "to": "2024-01-02" }]));
        assert!(e.bar(NodeId(0)).unwrap().invalid_range);
        e.set_date_keys("from", "to");
        assert!(!e.bar(NodeId(0)).unwrap().invalid_range);
    }

    #[tokio::test]
    async fn round_trip_through_a_handler() {
        let mut e = sample();
        e.begin_drag(NodeId(0), MoveType::Move, 0.0).unwrap();
        e.drag_to(DAY_PX * 3.0).unwrap();
        let request = e.end_drag().unwrap().unwrap();

        let no_weekends = |_: Record, start: String, _: String| async move {
            Ok::<_, anyhow::Error>(!start.starts_with("2024-01-06") && !start.starts_with("2024-01-07"))
        };
        let result = run_update(&no_weekends, &request).await;
        assert_eq!(result.resolution, Resolution::Accepted);
        e.settle_update(result);
        assert_eq!(e.tree().node(NodeId(0)).unwrap().record["startDate"], "2024-01-04 00:00:00");
    }
}
