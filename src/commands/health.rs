//! Health command - check the Ollama service.

use super::client;
use anyhow::Result;
use ollamakit::Settings;
use std::process::ExitCode;

pub(crate) async fn run(settings: &Settings) -> Result<ExitCode> {
    let health = client(settings)?.health().await;

    if health.is_healthy() {
        println!("🟢 Ollama is healthy at {}", settings.ollama.host);
        println!("   Response time: {:.0}ms", health.response_time_ms);
        println!("   Models ({}):", health.models_count);
        for model in &health.models {
            println!("     - {}", model);
        }
        Ok(ExitCode::SUCCESS)
    } else {
        println!("🔴 Ollama is unhealthy at {}", settings.ollama.host);
        if let Some(error) = &health.error {
            println!("   Error: {}", error);
        }
        Ok(ExitCode::FAILURE)
    }
}
