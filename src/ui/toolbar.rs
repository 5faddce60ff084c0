use egui::{menu, RichText, Ui};
use gantt_engine::model::Sight;

use crate::app::GanttApp;
use crate::ui::theme;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_header()), |ui| {
            let has_file = app.data_path.is_some();
            if ui.add_enabled(has_file, egui::Button::new("  Reload")).clicked() {
                app.reload();
                ui.close_menu();
            }
            if ui.add_enabled(has_file, egui::Button::new("  Save")).clicked() {
                app.save();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_header()), |ui| {
            if ui.button("  Expand All").clicked() {
                app.engine.expand_all();
                ui.close_menu();
            }
            if ui.button("  Collapse All").clicked() {
                app.engine.collapse_all();
                ui.close_menu();
            }
            ui.separator();
            let table_label = if app.engine.viewport().table_collapsed() {
                "  Show Table"
            } else {
                "  Hide Table"
            };
            if ui.button(table_label).clicked() {
                app.engine.toggle_table_collapse();
                ui.close_menu();
            }
        });

        ui.separator();

        let current = app.engine.sight();
        let mut sight = current;
        for s in Sight::ALL {
            ui.selectable_value(&mut sight, s, s.label());
        }
        if sight != current {
            app.engine.switch_sight(sight);
        }

        ui.separator();
        if ui.button("Today").clicked() {
            app.engine.scroll_to_today();
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let name = app
                .data_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sample plan (unsaved)".to_string());
            ui.label(RichText::new(name).size(11.0).weak());
        });
    });
}
