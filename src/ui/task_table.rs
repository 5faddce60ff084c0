use egui::{Align2, Pos2, Rect, Sense, Stroke, Ui, Vec2};
use gantt_engine::model::NodeId;
use gantt_engine::GanttEngine;

use crate::ui::theme;

/// Actions that the task table can request.
pub enum TaskTableAction {
    None,
    Select(NodeId),
    ToggleCollapse(NodeId),
}

/// Render the table pane. Only rows inside the engine's virtual window are
/// laid out; they line up with the chart rows at the same scroll offset.
pub fn show_task_table(
    engine: &GanttEngine,
    selected: Option<NodeId>,
    rect: Rect,
    ui: &mut Ui,
) -> TaskTableAction {
    let mut action = TaskTableAction::None;
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return action;
    }

    let config = engine.config();
    let header_h = config.header_height as f32;
    let row_h = config.row_height as f32;
    let top_pad = config.top_padding as f32;
    let scroll = engine.scroll_top() as f32;

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, theme::BG_PANEL);

    // Column headers
    let header = Rect::from_min_size(rect.min, Vec2::new(rect.width(), header_h));
    painter.rect_filled(header, 0.0, theme::BG_HEADER);
    painter.line_segment(
        [header.left_bottom(), header.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
    let widths = engine.column_widths();
    let mut x = rect.left();
    for (column, width) in engine.columns().iter().zip(&widths) {
        let cell = Rect::from_min_size(Pos2::new(x, header.top()), Vec2::new(*width as f32, header_h));
        painter.with_clip_rect(cell.intersect(header)).text(
            Pos2::new(x + 8.0, header.center().y),
            Align2::LEFT_CENTER,
            column.label.to_uppercase(),
            theme::font_small(),
            theme::TEXT_DIM,
        );
        x += *width as f32;
    }

    let body = Rect::from_min_max(Pos2::new(rect.left(), header.bottom() + 1.0), rect.max);
    let body_painter = painter.with_clip_rect(body);

    if let Some(top) = engine.indicator_top() {
        let y = body.top() + top as f32 - scroll;
        body_painter.rect_filled(
            Rect::from_min_size(Pos2::new(rect.left(), y), Vec2::new(rect.width(), row_h)),
            0.0,
            theme::BG_ROW_HOVER,
        );
    }

    for bar in engine.visible_bars() {
        let Some(node) = engine.tree().get(bar.node) else {
            continue;
        };
        let y = body.top() + top_pad + bar.display_index as f32 * row_h - scroll;
        let row = Rect::from_min_size(Pos2::new(rect.left(), y), Vec2::new(rect.width(), row_h));
        if row.bottom() < body.top() || row.top() > body.bottom() {
            continue;
        }

        if selected == Some(bar.node) {
            body_painter.rect_filled(row, 0.0, theme::BG_SELECTED);
        }
        body_painter.line_segment(
            [row.left_bottom(), row.right_bottom()],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );

        // Register the row before the toggle so the toggle wins the click.
        let row_response = ui.interact(row.intersect(body), ui.id().with(("task-row", bar.node)), Sense::click());
        if row_response.clicked() {
            action = TaskTableAction::Select(bar.node);
        }

        let mut x = rect.left();
        for (i, (column, width)) in engine.columns().iter().zip(&widths).enumerate() {
            let width = *width as f32;
            let cell = Rect::from_min_size(Pos2::new(x, y), Vec2::new(width, row_h)).intersect(body);
            let mut text_x = x + 8.0;

            if i == 0 {
                text_x += bar.depth as f32 * theme::INDENT;
                if bar.child_count > 0 {
                    let toggle =
                        Rect::from_center_size(Pos2::new(text_x + 5.0, row.center().y), Vec2::splat(14.0));
                    let glyph = if bar.collapsed { "▶" } else { "▼" };
                    body_painter.text(
                        toggle.center(),
                        Align2::CENTER_CENTER,
                        glyph,
                        theme::font_small(),
                        theme::TEXT_SECONDARY,
                    );
                    let toggle_response = ui.interact(
                        toggle.intersect(body),
                        ui.id().with(("collapse", bar.node)),
                        Sense::click(),
                    );
                    if toggle_response.clicked() {
                        action = TaskTableAction::ToggleCollapse(bar.node);
                    }
                }
                text_x += 16.0;
            }

            let text = node
                .field(&column.name)
                .or_else(|| (i == 0).then(|| node.key.clone()))
                .unwrap_or_default();
            body_painter.with_clip_rect(cell).text(
                Pos2::new(text_x, row.center().y),
                Align2::LEFT_CENTER,
                text,
                theme::font_row(),
                theme::TEXT_PRIMARY,
            );
            x += width;
        }
    }

    action
}
