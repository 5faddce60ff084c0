use crate::config::ChartConfig;

/// Limits applied whenever the table/chart split is recomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneLimits {
    pub default_table_width: f64,
    pub min_chart_width: f64,
    /// Minimum share of the total width reserved for the chart pane.
    pub min_view_rate: f64,
    pub header_height: f64,
}

impl PaneLimits {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            default_table_width: config.table_width,
            min_chart_width: config.min_chart_width,
            min_view_rate: config.min_view_rate,
            header_height: config.header_height,
        }
    }
}

/// Outer size of the chart and how it is split between table and timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub total_width: f64,
    pub table_width: f64,
    pub chart_width: f64,
    pub total_height: f64,
    pub row_height: f64,
    table_collapsed: bool,
    limits: PaneLimits,
}

impl Viewport {
    pub fn new(limits: PaneLimits, row_height: f64) -> Self {
        let mut viewport = Self {
            total_width: 1320.0,
            table_width: limits.default_table_width,
            chart_width: 0.0,
            total_height: 418.0,
            row_height,
            table_collapsed: false,
            limits,
        };
        viewport.init_width();
        viewport
    }

    /// Apply a container size. Returns false when nothing changed.
    ///
    /// A zero or non-finite dimension means the container is not laid out
    /// yet and is ignored.
    pub fn sync_size(&mut self, width: f64, height: f64) -> bool {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return false;
        }
        let mut changed = false;
        if self.total_height != height {
            self.total_height = height;
            changed = true;
        }
        if self.total_width != width {
            self.total_width = width;
            if self.table_collapsed {
                self.apply_split(0.0);
            } else {
                self.init_width();
            }
            changed = true;
        }
        changed
    }

    /// Reset the split to the default table width.
    pub fn init_width(&mut self) {
        self.table_collapsed = false;
        self.apply_split(self.limits.default_table_width);
    }

    /// Splitter drag.
    pub fn resize_table(&mut self, width: f64) {
        self.table_collapsed = false;
        self.apply_split(width);
    }

    pub fn toggle_table_collapse(&mut self) {
        if self.table_collapsed || self.table_width <= 0.0 {
            self.init_width();
        } else {
            self.table_collapsed = true;
            self.apply_split(0.0);
        }
    }

    pub fn table_collapsed(&self) -> bool {
        self.table_collapsed
    }

    /// Height of the scrollable body under the header (1px border).
    pub fn body_height(&self) -> f64 {
        (self.total_height - self.limits.header_height - 1.0).max(0.0)
    }

    fn apply_split(&mut self, table_width: f64) {
        let total = self.total_width.max(0.0);
        let table = if table_width.is_finite() {
            table_width.max(0.0)
        } else {
            self.limits.default_table_width
        };
        let mut chart = total - table;
        if chart < self.limits.min_view_rate * total {
            chart = self.limits.min_view_rate * total;
        }
        if chart < self.limits.min_chart_width {
            chart = self.limits.min_chart_width;
        }
        self.chart_width = chart;
        self.table_width = (total - chart).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(PaneLimits::from_config(&ChartConfig::default()), 28.0)
    }

    #[test]
    fn default_split_keeps_table_width() {
        let mut v = viewport();
        assert!(v.sync_size(1400.0, 600.0));
        assert_eq!(v.table_width, 500.0);
        assert_eq!(v.chart_width, 900.0);
        assert!(!v.sync_size(1400.0, 600.0));
    }

    #[test]
    fn chart_never_drops_below_floor_or_ratio() {
        let mut v = viewport();
        for total in [200.0, 250.0, 400.0, 640.0, 801.0, 1000.0, 3000.0] {
            v.sync_size(total, 400.0);
            for requested in [0.0, 100.0, 500.0, 2000.0, 1e9] {
                v.resize_table(requested);
                assert!(v.chart_width >= 200.0, "{total}/{requested}");
                assert!(v.chart_width >= 0.38 * total - 1e-9, "{total}/{requested}");
                assert!(v.table_width >= 0.0);
                assert!((v.table_width + v.chart_width - total).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn tiny_container_keeps_minimum_chart() {
        let mut v = viewport();
        v.sync_size(120.0, 400.0);
        assert_eq!(v.chart_width, 200.0);
        assert_eq!(v.table_width, 0.0);
    }

    #[test]
    fn collapse_gives_the_chart_everything() {
        let mut v = viewport();
        v.sync_size(1400.0, 600.0);
        v.toggle_table_collapse();
        assert_eq!(v.table_width, 0.0);
        assert_eq!(v.chart_width, 1400.0);
        v.sync_size(1600.0, 600.0);
        assert_eq!(v.chart_width, 1600.0);
        v.toggle_table_collapse();
        assert_eq!(v.table_width, 500.0);
    }

    #[test]
    fn ignores_unlaid_out_container() {
        let mut v = viewport();
        let before = v.clone();
        assert!(!v.sync_size(0.0, 400.0));
        assert!(!v.sync_size(800.0, f64::NAN));
        assert_eq!(v, before);
        assert_eq!(v.body_height(), 418.0 - 56.0 - 1.0);
    }
}
