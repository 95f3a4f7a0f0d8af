#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use transformer_hmi::logbuf::{LogBuffer, LogBufferLayer};
use transformer_hmi::{Args, Dashboard, DashboardConfig};

fn init_logging(buf: LogBuffer) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(LogBufferLayer::new(buf))
        .try_init()
        .context("install tracing subscriber")
}

// -----------------------------
// main
// -----------------------------
fn main() -> Result<()> {
    let cfg = DashboardConfig::from(Args::parse());

    let logs = LogBuffer::default();
    init_logging(logs.clone())?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Transformer Monitoring Unit")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([820.0, 560.0]),
        ..Default::default()
    };

    let run = eframe::run_native(
        "Transformer Monitoring Unit",
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(Dashboard::new(&cfg, logs))
        }),
    );

    run.map_err(|e| anyhow::anyhow!("eframe failed: {e}"))
}
