//! Info command - show toolkit and environment information.

use anyhow::Result;
use ollamakit::Settings;
use std::process::ExitCode;

pub(crate) fn run(settings: &Settings) -> Result<ExitCode> {
    println!("{}", ollamakit::version_info());
    println!("{}", "=".repeat(50));
    println!();

    println!("Platform: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    match std::env::current_dir() {
        Ok(dir) => println!("Working directory: {}", dir.display()),
        Err(e) => println!("Working directory: unavailable ({})", e),
    }
    println!();

    println!("Environment:");
    for var in ["OLLAMA_HOST", "OLLAMA_ORIGINS", "OLLAMA_MODEL"] {
        let value = std::env::var(var).unwrap_or_else(|_| "(not set)".to_string());
        println!("  {}: {}", var, value);
    }
    println!();

    println!("Settings:");
    println!("  Ollama host: {}", settings.ollama.host);
    println!(
        "  Cache: {} ({}, max age {}h)",
        if settings.cache.enabled { "enabled" } else { "disabled" },
        settings.cache.dir.display(),
        settings.cache.max_age_hours
    );
    println!(
        "  Retries: {} attempts, {}ms base delay",
        settings.retry.max_retries, settings.retry.base_delay_ms
    );
    println!("  Error log: {}", settings.files.error_log.display());
    println!("  Response log: {}", settings.files.response_log.display());

    Ok(ExitCode::SUCCESS)
}
