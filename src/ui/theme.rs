use egui::{Color32, FontId, Stroke, Visuals};

// Palette

pub const BG_DARK: Color32 = Color32::from_rgb(22, 25, 30);
pub const BG_PANEL: Color32 = Color32::from_rgb(28, 32, 38);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 39, 46);
pub const BG_REST_DAY: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 6);
pub const BG_ROW_HOVER: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 12);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(64, 156, 168, 48);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(48, 54, 62);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(96, 190, 200);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(226, 230, 234);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(150, 160, 170);
pub const TEXT_DIM: Color32 = Color32::from_rgb(98, 108, 118);

pub const ACCENT: Color32 = Color32::from_rgb(64, 156, 168);
pub const TODAY_LINE: Color32 = Color32::from_rgb(232, 96, 76);
pub const GRID_LINE: Color32 = Color32::from_rgb(40, 45, 52);
pub const HANDLE_COLOR: Color32 = Color32::WHITE;
pub const SLOT_PREVIEW: Color32 = Color32::from_rgba_premultiplied(64, 156, 168, 70);
pub const THUMB: Color32 = Color32::from_rgb(66, 74, 84);

// Sizes

pub const HANDLE_WIDTH: f32 = 7.0;
pub const BAR_ROUNDING: f32 = 3.0;
pub const INDENT: f32 = 14.0;
pub const SPLITTER_WIDTH: f32 = 4.0;
pub const SCROLLBAR_HEIGHT: f32 = 8.0;
pub const STATUS_BAR_HEIGHT: f32 = 22.0;

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_row() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

/// Bars are tinted by tree depth.
pub fn bar_color(depth: usize) -> Color32 {
    const BY_DEPTH: [Color32; 4] = [
        Color32::from_rgb(64, 156, 168),
        Color32::from_rgb(120, 132, 220),
        Color32::from_rgb(200, 140, 70),
        Color32::from_rgb(110, 170, 100),
    ];
    BY_DEPTH[depth % BY_DEPTH.len()]
}

/// Dark visuals with the chart's panel colours. Set once at startup.
pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    ctx.set_visuals(visuals);
}
