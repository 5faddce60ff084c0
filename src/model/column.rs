use serde::{Deserialize, Serialize};

/// A table column. Columns with a fixed `width` keep it; the rest of the
/// table width is shared by `flex` weight (1 when unset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Record field shown in the column.
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub flex: Option<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            width: None,
            flex: None,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_flex(mut self, flex: f64) -> Self {
        self.flex = Some(flex);
        self
    }
}

/// Pixel width of each column for a table `table_width` pixels wide.
pub fn column_widths(columns: &[Column], table_width: f64) -> Vec<f64> {
    let fixed: f64 = columns.iter().filter_map(|c| c.width).sum();
    let total_flex: f64 = columns
        .iter()
        .filter(|c| c.width.is_none())
        .map(|c| c.flex.unwrap_or(1.0))
        .sum();
    let rest = (table_width - fixed).max(0.0);
    columns
        .iter()
        .map(|c| match c.width {
            Some(width) => width,
            None if total_flex > 0.0 => rest * c.flex.unwrap_or(1.0) / total_flex,
            None => 0.0,
        })
        .collect()
}
