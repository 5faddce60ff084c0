use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use egui::{Pos2, Rect, Sense, Vec2};
use gantt_engine::io::{load_records, save_records};
use gantt_engine::model::axis::default_rest_day;
use gantt_engine::model::calendar::{DATE_TIME_FORMAT, MS_PER_DAY};
use gantt_engine::model::{Calendar, Column, NodeId, Record};
use gantt_engine::throttle::{Debounce, Throttle};
use gantt_engine::{ChartConfig, GanttEngine, Resolution, UpdateDispatcher};
use log::{error, info};
use serde_json::json;

use crate::ui;
use crate::ui::gantt_chart::ChartState;

/// Main application state.
pub struct GanttApp {
    pub engine: GanttEngine,
    pub data_path: Option<PathBuf>,
    pub selected: Option<NodeId>,
    pub status_message: String,
    dispatcher: UpdateDispatcher,
    chart: ChartState,
    wheel: Throttle<f64>,
    vertical: Throttle<f64>,
    scroll_quiet: Debounce<()>,
    // Keeps the dispatcher's worker threads alive.
    _runtime: tokio::runtime::Runtime,
}

impl GanttApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: ChartConfig,
        records: Vec<Record>,
        data_path: Option<PathBuf>,
        runtime: tokio::runtime::Runtime,
    ) -> Self {
        let interval = Duration::from_millis(config.input_throttle_ms);
        let mut engine = GanttEngine::new(config);
        engine.set_columns(vec![
            Column::new("name", "Task").with_flex(1.0),
            Column::new("owner", "Owner").with_width(90.0),
        ]);
        engine.set_data(&records);

        ui::theme::apply_theme(&cc.egui_ctx);
        let ctx = cc.egui_ctx.clone();
        let dispatcher = UpdateDispatcher::new(runtime.handle().clone(), Arc::new(confirm_dates))
            .on_settled(move || ctx.request_repaint());

        Self {
            engine,
            data_path,
            selected: None,
            status_message: "Ready".to_string(),
            dispatcher,
            chart: ChartState::default(),
            wheel: Throttle::merging(interval, |a, b| a + b),
            vertical: Throttle::merging(interval, |a, b| a + b),
            scroll_quiet: Debounce::new(interval),
            _runtime: runtime,
        }
    }

    // --- File operations ---

    pub fn save(&mut self) {
        let Some(path) = &self.data_path else {
            return;
        };
        match save_records(&self.engine.to_records(), path) {
            Ok(()) => self.status_message = format!("Saved {}", path.display()),
            Err(e) => {
                error!("saving {} failed: {e}", path.display());
                self.status_message = format!("Error saving: {e}");
            }
        }
    }

    pub fn reload(&mut self) {
        let Some(path) = &self.data_path else {
            return;
        };
        match load_records(path) {
            Ok(records) => {
                self.engine.set_data(&records);
                self.selected = None;
                self.status_message = "Reloaded".to_string();
            }
            Err(e) => {
                error!("loading {} failed: {e}", path.display());
                self.status_message = format!("Error loading: {e}");
            }
        }
    }

    // --- Input ---

    fn wheel_horizontal(&mut self, delta: f64, now: Instant) {
        if let Some(delta) = self.wheel.submit(delta, now) {
            self.engine.handle_wheel(delta);
        }
        self.scroll_quiet.submit((), now);
    }

    fn wheel_vertical(&mut self, delta: f64, now: Instant) {
        if let Some(delta) = self.vertical.submit(delta, now) {
            let top = self.engine.scroll_top() + delta;
            self.engine.set_scroll_top(top);
        }
    }

    fn poll_input(&mut self, now: Instant) {
        if let Some(delta) = self.wheel.poll(now) {
            self.engine.handle_wheel(delta);
        }
        if let Some(delta) = self.vertical.poll(now) {
            let top = self.engine.scroll_top() + delta;
            self.engine.set_scroll_top(top);
        }
        if self.scroll_quiet.poll(now).is_some() {
            self.engine.end_scrolling();
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.wheel.deadline(),
            self.vertical.deadline(),
            self.scroll_quiet.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn drain_outcomes(&mut self) {
        while let Some(outcome) = self.dispatcher.try_next() {
            let resolution = outcome.resolution.clone();
            if !self.engine.settle_update(outcome) {
                continue;
            }
            match resolution {
                Resolution::Accepted => {
                    self.status_message = "Dates updated".to_string();
                    self.save();
                }
                Resolution::Rejected => {
                    self.status_message = "Change rejected, bar restored".to_string();
                }
                Resolution::Failed(reason) => {
                    self.status_message = format!("Update failed: {reason}");
                }
            }
        }
    }
}

/// Stand-in persistence backend: answers after a short delay and refuses
/// tasks that would start on a rest day.
async fn confirm_dates(record: Record, start: String, end: String) -> anyhow::Result<bool> {
    tokio::time::sleep(Duration::from_millis(400)).await;
    let day = NaiveDateTime::parse_from_str(&start, DATE_TIME_FORMAT)?.date();
    let key = record.get("key").and_then(|k| k.as_str()).unwrap_or("task");
    if default_rest_day(day) {
        info!("refusing to start {key} on {day}");
        return Ok(false);
    }
    info!("accepted {key}: {start} → {end}");
    Ok(true)
}

/// A small plan around today, shown when no data file is given.
pub fn sample_records(calendar: &Calendar) -> Vec<Record> {
    let today = calendar.start_of_day(calendar.now());
    let day = |offset: i64| calendar.format(today + offset * MS_PER_DAY);
    let plan = json!([
        { "key": "planning", "name": "Planning", "owner": "Ana", "startDate": day(-5), "endDate": day(8), "children": [
            { "key": "kickoff", "name": "Project kickoff", "owner": "Ana", "startDate": day(-5), "endDate": day(-2) },
            { "key": "requirements", "name": "Requirements", "owner": "Ben", "startDate": day(-2), "endDate": day(5) }
        ]},
        { "key": "execution", "name": "Execution", "owner": "Cho", "startDate": day(6), "endDate": day(30), "children": [
            { "key": "ui", "name": "UI design", "owner": "Dee", "startDate": day(6), "endDate": day(18) },
            { "key": "backend", "name": "Backend", "owner": "Cho", "startDate": day(6), "endDate": day(28) },
            { "key": "qa", "name": "Testing & QA", "owner": "Eli" }
        ]},
        { "key": "launch", "name": "Launch", "owner": "Ana", "startDate": day(32), "endDate": day(32) }
    ]);
    serde_json::from_value(plan).unwrap_or_default()
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.drain_outcomes();
        self.poll_input(now);

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(egui::RichText::new(&self.status_message).size(11.0));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "Tasks: {} · View: {}",
                                self.engine.tree().len(),
                                self.engine.sight().label(),
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                        if self.engine.has_pending() {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.engine.sync_size(rect.width() as f64, rect.height() as f64);

                let table_w = self.engine.viewport().table_width as f32;
                let table_rect = Rect::from_min_size(rect.min, Vec2::new(table_w, rect.height()));
                let chart_rect = Rect::from_min_max(Pos2::new(rect.left() + table_w, rect.top()), rect.max);
                let body_top = rect.top() + self.engine.config().header_height as f32 + 1.0;

                if ui.rect_contains_pointer(rect) {
                    let delta = ui.input(|i| i.raw_scroll_delta);
                    if delta.x != 0.0 {
                        self.wheel_horizontal(-delta.x as f64, now);
                    }
                    if delta.y != 0.0 {
                        self.wheel_vertical(-delta.y as f64, now);
                    }
                }
                match ui.input(|i| i.pointer.hover_pos()) {
                    Some(pos) if rect.contains(pos) && pos.y >= body_top => {
                        let offset = (pos.y - body_top) as f64 + self.engine.scroll_top();
                        self.engine.hover(offset);
                    }
                    _ => self.engine.leave(),
                }

                let action = ui::task_table::show_task_table(&self.engine, self.selected, table_rect, ui);
                match action {
                    ui::task_table::TaskTableAction::Select(node) => self.selected = Some(node),
                    ui::task_table::TaskTableAction::ToggleCollapse(node) => {
                        if let Err(e) = self.engine.toggle_collapsed(node) {
                            self.status_message = e.to_string();
                        }
                    }
                    ui::task_table::TaskTableAction::None => {}
                }

                if table_w > 0.0 {
                    let splitter = Rect::from_center_size(
                        Pos2::new(table_rect.right(), rect.center().y),
                        Vec2::new(ui::theme::SPLITTER_WIDTH, rect.height()),
                    );
                    let response = ui.interact(splitter, ui.id().with("splitter"), Sense::drag());
                    if response.hovered() || response.dragged() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                    }
                    if response.dragged() {
                        self.engine.resize_table((table_w + response.drag_delta().x) as f64);
                    }
                    ui.painter().line_segment(
                        [splitter.center_top(), splitter.center_bottom()],
                        egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE),
                    );
                }

                let interaction = ui::gantt_chart::show_gantt_chart(
                    &mut self.engine,
                    &mut self.chart,
                    self.selected,
                    chart_rect,
                    ui,
                );
                if let Some(node) = interaction.selected {
                    self.selected = Some(node);
                }
                if let Some(message) = interaction.message {
                    self.status_message = message;
                }
                for request in interaction.requests {
                    self.dispatcher.dispatch(request);
                }
            });

        if let Some(deadline) = self.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}
