use egui::{Align2, Color32, CursorIcon, Painter, Pos2, Rect, Sense, Stroke, Ui, Vec2};
use gantt_engine::model::{Bar, BarSide, MoveType, NodeId, ThumbDrag};
use gantt_engine::{GanttEngine, UpdateRequest};

use crate::ui::theme;

/// Interaction state the chart keeps between frames.
#[derive(Debug, Default)]
pub struct ChartState {
    /// Thumb drag and the pointer x it was grabbed at.
    thumb: Option<(ThumbDrag, f32)>,
}

/// Result details from interactions in the Gantt chart.
#[derive(Debug, Default)]
pub struct ChartInteraction {
    /// Finished drags that need persisting.
    pub requests: Vec<UpdateRequest>,
    pub selected: Option<NodeId>,
    pub message: Option<String>,
}

/// Render the timeline pane and feed pointer input back into the engine.
pub fn show_gantt_chart(
    engine: &mut GanttEngine,
    state: &mut ChartState,
    selected: Option<NodeId>,
    rect: Rect,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return interaction;
    }

    let config = engine.config().clone();
    let header = Rect::from_min_size(rect.min, Vec2::new(rect.width(), config.header_height as f32));
    let body = Rect::from_min_max(Pos2::new(rect.left(), header.bottom() + 1.0), rect.max);
    let pan = engine.pan_offset();
    let scroll = engine.scroll_top() as f32;
    let row_h = config.row_height as f32;
    let to_screen = |px: f64| rect.left() + (px - pan) as f32;
    let to_timeline = |x: f32| pan + (x - rect.left()) as f64;

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, theme::BG_DARK);
    draw_axis(engine, &painter, header, body, pan);

    let body_painter = painter.with_clip_rect(body);
    draw_today_line(engine, &body_painter, body, pan);

    if let Some(top) = engine.indicator_top() {
        let y = body.top() + top as f32 - scroll;
        body_painter.rect_filled(
            Rect::from_min_size(Pos2::new(rect.left(), y), Vec2::new(rect.width(), row_h)),
            0.0,
            theme::BG_ROW_HOVER,
        );
    }

    // Cloned so the engine can be driven while iterating.
    let bars: Vec<Bar> = engine.visible_bars().to_vec();
    let dragged_node = engine.active_drag().map(|s| s.node);

    for bar in &bars {
        let row_top = body.top() + config.top_padding as f32 + bar.display_index as f32 * row_h - scroll;
        let row = Rect::from_min_size(Pos2::new(rect.left(), row_top), Vec2::new(rect.width(), row_h));
        if row.bottom() < body.top() || row.top() > body.bottom() {
            continue;
        }
        let hit_row = row.intersect(body);

        if bar.invalid_range && dragged_node == Some(bar.node) {
            // Create pressed but not moved yet.
            if let Some(session) = engine.active_drag() {
                let preview = Rect::from_min_size(
                    Pos2::new(to_screen(session.base.left), body.top() + bar.row_top as f32 - scroll),
                    Vec2::new(session.base.width as f32, config.bar_height as f32),
                );
                body_painter.rect_filled(preview, theme::BAR_ROUNDING, theme::SLOT_PREVIEW);
            }
            continue;
        }
        if bar.invalid_range {
            let response = ui.interact(hit_row, ui.id().with(("empty-row", bar.node)), Sense::drag());
            if let Some(pos) = response.hover_pos() {
                let slot = engine.slot_at(to_timeline(pos.x));
                let preview = Rect::from_min_size(
                    Pos2::new(to_screen(slot.left), body.top() + bar.row_top as f32 - scroll),
                    Vec2::new(slot.width as f32, config.bar_height as f32),
                );
                body_painter.rect_filled(preview, theme::BAR_ROUNDING, theme::SLOT_PREVIEW);
                ui.ctx().set_cursor_icon(CursorIcon::Crosshair);
            }
            if response.drag_started() {
                begin(engine, bar.node, MoveType::Create, ui, &to_timeline, &mut interaction);
            }
            continue;
        }

        let bar_rect = Rect::from_min_size(
            Pos2::new(to_screen(bar.left), body.top() + bar.row_top as f32 - scroll),
            Vec2::new(bar.width as f32, config.bar_height as f32),
        );
        let label = engine
            .tree()
            .get(bar.node)
            .and_then(|node| node.field("name"))
            .unwrap_or_else(|| bar.key.clone());
        draw_bar(&body_painter, bar, bar_rect, &label, selected == Some(bar.node));

        if let Some(side) = engine.offscreen_side(bar.node) {
            if offscreen_marker(ui, &body_painter, bar.node, side, row, hit_row) {
                if let Err(e) = engine.scroll_to_bar(bar.node, side) {
                    log::debug!("scroll to bar failed: {e}");
                }
            }
            continue;
        }
        if bar.loading {
            continue;
        }

        let grab = Rect::from_x_y_ranges(bar_rect.x_range(), row.y_range()).intersect(body);
        let handle = |x: f32| {
            Rect::from_x_y_ranges(
                x - theme::HANDLE_WIDTH / 2.0..=x + theme::HANDLE_WIDTH / 2.0,
                row.y_range(),
            )
            .intersect(body)
        };
        let body_response = ui.interact(grab, ui.id().with(("task-bar", bar.node)), Sense::click_and_drag());
        let left_response = ui.interact(
            handle(bar_rect.left()),
            ui.id().with(("task-resize-left", bar.node)),
            Sense::drag(),
        );
        let right_response = ui.interact(
            handle(bar_rect.right()),
            ui.id().with(("task-resize-right", bar.node)),
            Sense::drag(),
        );

        if left_response.hovered() || right_response.hovered() {
            ui.ctx().set_cursor_icon(CursorIcon::ResizeHorizontal);
        } else if body_response.hovered() {
            ui.ctx().set_cursor_icon(CursorIcon::Grab);
        }
        if body_response.clicked() {
            interaction.selected = Some(bar.node);
        }

        let move_type = if left_response.drag_started() {
            Some(MoveType::ResizeLeft)
        } else if right_response.drag_started() {
            Some(MoveType::ResizeRight)
        } else if body_response.drag_started() {
            Some(MoveType::Move)
        } else {
            None
        };
        if let Some(move_type) = move_type {
            begin(engine, bar.node, move_type, ui, &to_timeline, &mut interaction);
        }

        if dragged_node.is_none() && body_response.hovered() {
            if let Some(node) = engine.tree().get(bar.node) {
                let keys = engine.tree().keys();
                let start = node.field(&keys.start).unwrap_or_default();
                let end = node.field(&keys.end).unwrap_or_default();
                egui::show_tooltip_at_pointer(
                    ui.ctx(),
                    ui.layer_id(),
                    egui::Id::new(("task-tip", bar.node)),
                    |ui| {
                        ui.strong(&label);
                        ui.label(format!("{start} → {end}"));
                    },
                );
            }
        }
    }

    follow_pointer(engine, ui, &to_timeline, &mut interaction);
    scrollbar(engine, state, &painter, rect, ui);
    interaction
}

fn begin(
    engine: &mut GanttEngine,
    node: NodeId,
    move_type: MoveType,
    ui: &Ui,
    to_timeline: &dyn Fn(f32) -> f64,
    interaction: &mut ChartInteraction,
) {
    let Some(origin) = ui.input(|i| i.pointer.press_origin()) else {
        return;
    };
    match engine.begin_drag(node, move_type, to_timeline(origin.x)) {
        Ok(_) => interaction.selected = Some(node),
        Err(e) => interaction.message = Some(e.to_string()),
    }
}

/// While a drag is active the pointer drives it, wherever it wanders.
fn follow_pointer(
    engine: &mut GanttEngine,
    ui: &Ui,
    to_timeline: &dyn Fn(f32) -> f64,
    interaction: &mut ChartInteraction,
) {
    if engine.active_drag().is_none() {
        return;
    }
    let (pos, released) = ui.input(|i| (i.pointer.interact_pos(), i.pointer.any_released()));
    if let Some(pos) = pos {
        if let Err(e) = engine.drag_to(to_timeline(pos.x)) {
            log::debug!("drag update dropped: {e}");
        }
    }
    ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
    if released {
        match engine.end_drag() {
            Ok(Some(request)) => {
                interaction.message = Some(format!("Saving {} → {}…", request.start_date, request.end_date));
                interaction.requests.push(request);
            }
            Ok(None) => {}
            Err(e) => interaction.message = Some(e.to_string()),
        }
    }
}

fn scrollbar(engine: &mut GanttEngine, state: &mut ChartState, painter: &Painter, rect: Rect, ui: &mut Ui) {
    let thumb = engine.thumb();
    let thumb_rect = Rect::from_min_size(
        Pos2::new(
            rect.left() + thumb.left as f32,
            rect.bottom() - theme::SCROLLBAR_HEIGHT - 2.0,
        ),
        Vec2::new(thumb.width as f32, theme::SCROLLBAR_HEIGHT),
    );
    let response = ui.interact(thumb_rect, ui.id().with("timeline-thumb"), Sense::drag());
    if response.drag_started() {
        if let Some(pos) = response.interact_pointer_pos() {
            state.thumb = Some((engine.begin_thumb_drag(), pos.x));
        }
    }
    if response.dragged() {
        if let (Some((drag, grabbed_at)), Some(pos)) = (state.thumb, response.interact_pointer_pos()) {
            engine.drag_thumb(&drag, (pos.x - grabbed_at) as f64);
        }
    }
    if response.drag_stopped() {
        state.thumb = None;
    }
    let color = if response.hovered() || response.dragged() {
        theme::ACCENT
    } else {
        theme::THUMB
    };
    painter.rect_filled(thumb_rect, theme::SCROLLBAR_HEIGHT / 2.0, color);
}

/// Arrow at the pane edge for a bar that has scrolled out of view. Returns
/// true when clicked.
fn offscreen_marker(
    ui: &mut Ui,
    painter: &Painter,
    node: NodeId,
    side: BarSide,
    row: Rect,
    hit_row: Rect,
) -> bool {
    let (x, glyph, align) = match side {
        BarSide::Left => (row.left() + 4.0, "◀", Align2::LEFT_CENTER),
        BarSide::Right => (row.right() - 4.0, "▶", Align2::RIGHT_CENTER),
    };
    let marker = Rect::from_center_size(Pos2::new(x, row.center().y), Vec2::splat(16.0)).intersect(hit_row);
    let response = ui.interact(marker, ui.id().with(("offscreen", node)), Sense::click());
    let color = if response.hovered() {
        theme::ACCENT
    } else {
        theme::TEXT_DIM
    };
    painter.text(Pos2::new(x, row.center().y), align, glyph, theme::font_small(), color);
    response.clicked()
}

fn draw_bar(painter: &Painter, bar: &Bar, rect: Rect, label: &str, is_selected: bool) {
    let mut color = theme::bar_color(bar.depth);
    if bar.loading {
        color = color.gamma_multiply(0.45);
    }
    painter.rect_filled(rect.translate(Vec2::new(1.0, 1.5)), theme::BAR_ROUNDING, Color32::from_black_alpha(35));
    painter.rect_filled(rect, theme::BAR_ROUNDING, color);

    if is_selected {
        painter.rect_stroke(
            rect.expand(1.5),
            theme::BAR_ROUNDING + 1.5,
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
        let handle_h = rect.height() + 4.0;
        for x in [rect.left() - 1.5, rect.right() - 2.5] {
            let handle = Rect::from_min_size(Pos2::new(x, rect.center().y - handle_h / 2.0), Vec2::new(4.0, handle_h));
            painter.rect_filled(handle, 2.0, theme::HANDLE_COLOR);
        }
    }

    let text = if bar.loading {
        format!("{label} (saving…)")
    } else {
        label.to_string()
    };
    painter.text(
        Pos2::new(rect.right() + 8.0, rect.center().y),
        Align2::LEFT_CENTER,
        text,
        theme::font_small(),
        theme::TEXT_SECONDARY,
    );
}

fn draw_axis(engine: &GanttEngine, painter: &Painter, header: Rect, body: Rect, pan: f64) {
    painter.rect_filled(header, 0.0, theme::BG_HEADER);
    let mid = header.center().y;
    let to_screen = |px: f64| header.left() + (px - pan) as f32;

    for bucket in engine.minor_buckets() {
        let x = to_screen(bucket.left);
        let width = bucket.width as f32;
        if bucket.is_rest_day {
            painter.rect_filled(
                Rect::from_min_max(Pos2::new(x, mid), Pos2::new(x + width, body.bottom())),
                0.0,
                theme::BG_REST_DAY,
            );
        }
        painter.line_segment(
            [Pos2::new(x, mid), Pos2::new(x, body.bottom())],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        if width >= 14.0 {
            let color = if bucket.is_rest_day {
                theme::TEXT_DIM
            } else {
                theme::TEXT_SECONDARY
            };
            painter.text(
                Pos2::new(x + width / 2.0, (mid + header.bottom()) / 2.0),
                Align2::CENTER_CENTER,
                &bucket.label,
                theme::font_sub(),
                color,
            );
        }
    }

    for bucket in engine.major_buckets() {
        let x = to_screen(bucket.left);
        painter.line_segment(
            [Pos2::new(x, header.top()), Pos2::new(x, mid)],
            Stroke::new(1.0, theme::BORDER_SUBTLE),
        );
        painter.text(
            Pos2::new(x + 6.0, (header.top() + mid) / 2.0),
            Align2::LEFT_CENTER,
            &bucket.label,
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
    }

    painter.line_segment(
        [Pos2::new(header.left(), mid), Pos2::new(header.right(), mid)],
        Stroke::new(0.5, theme::BORDER_SUBTLE),
    );
    painter.line_segment(
        [header.left_bottom(), header.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
}

fn draw_today_line(engine: &GanttEngine, painter: &Painter, body: Rect, pan: f64) {
    let timeline = engine.timeline();
    let now = timeline.calendar().now();
    let x = body.left() + (timeline.time_to_px(now) - pan) as f32;
    painter.line_segment(
        [Pos2::new(x, body.top()), Pos2::new(x, body.bottom())],
        Stroke::new(1.5, theme::TODAY_LINE),
    );
}
