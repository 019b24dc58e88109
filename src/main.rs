mod app;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use app::ComparisonApp;
use clap::Parser;
use eframe::egui;
use map_compare::chart::{ComparisonChart, XTickStart};
use map_compare::{config, export, pipeline};

/// Compare mAP50 and mAP50-95 curves of the training runs listed in a config file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// YAML list of `file_path` / `model_name` entries.
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Write the chart to this .png or .svg file instead of opening a window.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exported image width in pixels.
    #[arg(long, default_value_t = export::DEFAULT_SIZE.0)]
    width: u32,

    /// Exported image height in pixels.
    #[arg(long, default_value_t = export::DEFAULT_SIZE.1)]
    height: u32,

    /// Epoch the x-axis ticks start from.
    #[arg(long, value_enum, default_value_t = XTickStart::LastSeries)]
    x_tick_start: XTickStart,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let entries = config::load(&args.config)?;
    if entries.is_empty() {
        println!("{}", config::NO_ENTRIES_MESSAGE);
        return Ok(());
    }

    let series = pipeline::load_series(&entries)?;
    let chart = ComparisonChart::build(&series, args.x_tick_start)?;
    let size = (args.width, args.height);

    match &args.output {
        Some(path) => export::write_chart(path, &chart, size),
        None => run_viewer(chart, size),
    }
}

/// Show the chart in a window; returns once the window is closed.
fn run_viewer(chart: ComparisonChart, export_size: (u32, u32)) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "mAP Compare – Training Runs",
        options,
        Box::new(move |_cc| Ok(Box::new(ComparisonApp::new(chart, export_size)))),
    )
    .map_err(|e| anyhow::anyhow!("chart viewer failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_defaults() {
        let args = Args::try_parse_from(["map-compare"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.yaml"));
        assert!(args.output.is_none());
        assert_eq!((args.width, args.height), export::DEFAULT_SIZE);
        assert_eq!(args.x_tick_start, XTickStart::LastSeries);
    }

    #[test]
    fn flags_are_parsed() {
        let args = Args::try_parse_from([
            "map-compare",
            "-c",
            "runs.yaml",
            "--output",
            "cmp.svg",
            "--x-tick-start",
            "global-min",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("runs.yaml"));
        assert_eq!(args.output, Some(PathBuf::from("cmp.svg")));
        assert_eq!(args.x_tick_start, XTickStart::GlobalMin);
    }
}
