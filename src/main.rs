mod app;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trustline_canvas::config::{ViewConfig, load_config};
use trustline_canvas::layout::LayoutMode;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ModeArg {
    Force,
    Ring,
}

impl From<ModeArg> for LayoutMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Force => LayoutMode::Force,
            ModeArg::Ring => LayoutMode::Ring,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON view configuration; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON snapshot to display instead of the simulated network.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Seed for the simulated network.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    #[arg(long, default_value_t = 40)]
    participants: usize,

    /// Interval between simulated network updates.
    #[arg(long, default_value_t = 900.0)]
    tick_ms: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ViewConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.layout.mode = mode.into();
    }

    let source = match args.snapshot {
        Some(path) => app::SnapshotSource::File(path),
        None => app::SnapshotSource::Simulated {
            seed: args.seed,
            participants: args.participants,
        },
    };
    let tick_ms = args.tick_ms.max(16.0);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 840.0]),
        ..Default::default()
    };

    eframe::run_native(
        "trustline-canvas",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::TrustlineApp::new(
                cc, source, config, tick_ms,
            )))
        }),
    )
    .map_err(|error| anyhow::anyhow!("{error}"))
    .context("window event loop failed")
}
