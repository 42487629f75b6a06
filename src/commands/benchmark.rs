//! Benchmark command - compare model latency.

use super::{client, rule};
use anyhow::{Context, Result};
use ollamakit::config::ToolkitConfig;
use ollamakit::services::benchmark::{best_configurations, render_report, Benchmark};
use ollamakit::utils::error::ErrorContext;
use ollamakit::Settings;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

pub(crate) async fn run(settings: &Settings, models: &[String], output: &Path) -> Result<ExitCode> {
    println!("🎯 Ollama Benchmark Tool");
    println!("{}", rule());

    let config = ToolkitConfig::load_default().context("Failed to load toolkit configuration")?;
    let client = client(settings)?;

    let models: Vec<String> = if models.is_empty() {
        match client.list_models().await {
            Ok(installed) => installed.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                eprintln!("{}", e.user_message());
                return Ok(ExitCode::FAILURE);
            }
        }
    } else {
        models.to_vec()
    };

    if models.is_empty() {
        eprintln!("❌ No models found");
        return Ok(ExitCode::FAILURE);
    }
    println!("📋 Models: {}", models.join(", "));

    let benchmark = Benchmark::new(Arc::new(client));
    let results = benchmark.run(&models, &config.benchmark_cases).await;

    std::fs::write(output, render_report(&results))
        .filesystem_context(&format!("Failed to write report to {}", output.display()))?;

    println!();
    println!("{}", rule());
    println!("✅ Benchmark complete");
    println!("📊 Report saved: {}", output.display());
    println!();
    println!("🏆 Best configurations:");
    for best in best_configurations(&results) {
        println!(
            "  {}: {} ({:.0}ms, {:.1}%)",
            best.case, best.model, best.avg_time, best.success_rate
        );
    }

    Ok(ExitCode::SUCCESS)
}
