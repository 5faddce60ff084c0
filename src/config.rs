//! Chart configuration, persisted as JSON in the OS config directory.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::bar::BarLayout;
use crate::model::scrollbar::ScrollbarMetrics;
use crate::model::window::RowPadding;
use crate::model::{Calendar, DateKeys, Sight};

const APP_NAME: &str = "gantt-engine";
const CONFIG_FILE: &str = "config.json";

/// Layout constants and behaviour knobs for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartConfig {
    pub row_height: f64,
    pub bar_height: f64,
    pub header_height: f64,
    pub top_padding: f64,
    /// Table width restored when the pane split is reset.
    pub table_width: f64,
    pub min_chart_width: f64,
    /// Minimum share of the total width kept for the chart pane.
    pub min_view_rate: f64,
    pub lookahead_rows: usize,
    pub back_padding_rows: usize,
    pub scrollbar_track: f64,
    pub min_thumb_width: f64,
    pub scroll_margin: f64,
    /// Pixel floor for bar width.
    pub min_bar_px: f64,
    /// The zoom anchor sits this many days before "now".
    pub anchor_days: i64,
    /// Offset of the chart's calendar from UTC, in minutes.
    pub utc_offset_minutes: i32,
    pub start_date_key: String,
    pub end_date_key: String,
    pub unit: Sight,
    /// Coalescing interval for wheel and scroll input.
    pub input_throttle_ms: u64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        let keys = DateKeys::default();
        Self {
            row_height: 28.0,
            bar_height: 8.0,
            header_height: 56.0,
            top_padding: 0.0,
            table_width: 500.0,
            min_chart_width: 200.0,
            min_view_rate: 0.38,
            lookahead_rows: 10,
            back_padding_rows: 5,
            scrollbar_track: 160.0,
            min_thumb_width: 30.0,
            scroll_margin: 200.0,
            min_bar_px: 11.0,
            anchor_days: 10,
            utc_offset_minutes: 0,
            start_date_key: keys.start,
            end_date_key: keys.end,
            unit: Sight::Day,
            input_throttle_ms: 100,
        }
    }
}

impl ChartConfig {
    /// `<config dir>/gantt-engine/config.json`, or the working directory when
    /// the platform has no config directory.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Read a config file. A missing file yields the defaults; a malformed
    /// one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let config = serde_json::from_str(&json)?;
                info!("loaded chart config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn date_keys(&self) -> DateKeys {
        DateKeys {
            start: self.start_date_key.clone(),
            end: self.end_date_key.clone(),
        }
    }

    pub fn calendar(&self) -> Calendar {
        Calendar::with_offset_minutes(self.utc_offset_minutes)
    }

    pub fn bar_layout(&self) -> BarLayout {
        BarLayout {
            row_height: self.row_height,
            bar_height: self.bar_height,
            top_padding: self.top_padding,
        }
    }

    pub fn row_padding(&self) -> RowPadding {
        RowPadding {
            lookahead: self.lookahead_rows,
            back: self.back_padding_rows,
        }
    }

    pub fn scrollbar(&self) -> ScrollbarMetrics {
        ScrollbarMetrics {
            track_length: self.scrollbar_track,
            min_thumb_width: self.min_thumb_width,
            margin: self.scroll_margin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GanttError;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChartConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ChartConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "rowHeight": 40, "unit": "quarter", "startDateKey": "from" }"#)
            .unwrap();
        let config = ChartConfig::load(&path).unwrap();
        assert_eq!(config.row_height, 40.0);
        assert_eq!(config.unit, Sight::Quarter);
        assert_eq!(config.date_keys().start, "from");
        assert_eq!(config.date_keys().end, "endDate");
        assert_eq!(config.min_view_rate, 0.38);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ChartConfig {
            utc_offset_minutes: 120,
            unit: Sight::HalfYear,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ChartConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ rowHeight: ").unwrap();
        assert!(matches!(ChartConfig::load(&path), Err(GanttError::Json(_))));
    }
}
