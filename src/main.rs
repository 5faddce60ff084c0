#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gantt_engine::io::load_records;
use gantt_engine::model::Sight;
use gantt_engine::ChartConfig;

#[derive(Debug, Parser)]
#[command(name = "gantt-engine", version, about = "Interactive Gantt timeline")]
struct Args {
    /// JSON array of task records. A sample plan is shown when omitted.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Chart config file [default: <config dir>/gantt-engine/config.json]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial zoom: day, week, month, quarter or halfYear.
    #[arg(long)]
    unit: Option<Sight>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(ChartConfig::default_path);
    let mut config = ChartConfig::load(&config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?;
    if let Some(unit) = args.unit {
        config.unit = unit;
    }

    let records = match &args.data {
        Some(path) => load_records(path).with_context(|| format!("reading tasks {}", path.display()))?,
        None => app::sample_records(&config.calendar()),
    };
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Gantt Engine"),
        ..Default::default()
    };

    eframe::run_native(
        "Gantt Engine",
        options,
        Box::new(move |cc| Ok(Box::new(app::GanttApp::new(cc, config, records, args.data, runtime)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
