use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use forcebubble::app::{ChartDemoApp, sample_records};
use forcebubble::{BubbleChart, ChartOptions, DataRecord};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Initial canvas width in pixels.
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Initial canvas height in pixels.
    #[arg(long, default_value_t = 840.0)]
    height: f32,

    /// JSON file holding an array of flat records; the bundled sample
    /// dataset is used when omitted.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Comma-separated fields forming a record's unique key.
    #[arg(long, value_delimiter = ',', default_value = "name")]
    identity: Vec<String>,

    /// Comma-separated fields joined into the hover tooltip.
    #[arg(long, value_delimiter = ',', default_value = "name,downloads")]
    tooltip: Vec<String>,

    /// Field grouping bubbles into regions.
    #[arg(long, default_value = "category")]
    classifier: String,

    /// Field driving bubble size.
    #[arg(long, default_value = "downloads")]
    size: String,

    /// Field driving bubble color.
    #[arg(long, default_value = "license")]
    color: String,
}

fn load_records(path: &Path) -> anyhow::Result<Vec<DataRecord>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).context("dataset must be a JSON array of flat records")
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let records = match &args.data {
        Some(path) => match load_records(path) {
            Ok(records) => records,
            Err(error) => {
                eprintln!("failed to load dataset: {error:#}");
                std::process::exit(2);
            }
        },
        None => sample_records(),
    };

    let options = ChartOptions {
        width: args.width,
        height: args.height,
        data: records.clone(),
        identity_fields: args.identity.clone(),
        tooltip_fields: args.tooltip.clone(),
        classifier_field: args.classifier.clone(),
        size_field: args.size.clone(),
        color_field: args.color.clone(),
        ..ChartOptions::default()
    };
    let chart = match BubbleChart::new(options) {
        Ok(chart) => chart,
        Err(error) => {
            eprintln!("invalid chart configuration: {error}");
            std::process::exit(2);
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([args.width, args.height + 40.0]),
        ..Default::default()
    };

    let tooltip_fields = args.tooltip.clone();
    eframe::run_native(
        "forcebubble",
        native_options,
        Box::new(move |_cc| Ok(Box::new(ChartDemoApp::new(chart, records, tooltip_fields)))),
    )
}
