//! Monitor command - live status until Ctrl-C.

use super::client;
use anyhow::Result;
use ollamakit::services::monitor::{render_status, Monitor, DEFAULT_PROBE_MODEL};
use ollamakit::Settings;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

pub(crate) async fn run(settings: &Settings, interval: u64, model: Option<&str>) -> Result<ExitCode> {
    if interval == 0 {
        anyhow::bail!("Interval must be at least one second");
    }

    let probe_model = model
        .or(settings.ollama.model.as_deref())
        .unwrap_or(DEFAULT_PROBE_MODEL);
    let mut monitor = Monitor::new(client(settings)?, probe_model);

    println!("🚀 Starting Ollama monitor...");
    println!("📊 Update interval: {} seconds", interval);
    println!("Press Ctrl+C to stop");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = monitor.snapshot().await;
                // Clear screen and move the cursor home
                print!("\x1B[2J\x1B[H");
                println!("{}", render_status(&snapshot, monitor.stats()));
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n🛑 Monitoring stopped by user");
                info!("Monitor stopped after {} probes", monitor.stats().queries + monitor.stats().errors);
                return Ok(ExitCode::SUCCESS);
            }
        }
    }
}
