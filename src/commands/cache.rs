//! Cache command - inspect and clean the response cache.

use anyhow::{Context, Result};
use ollamakit::cache::ResponseCache;
use ollamakit::config::settings::max_age_from_hours;
use ollamakit::Settings;
use std::process::ExitCode;

fn open(settings: &Settings) -> ResponseCache {
    ResponseCache::new(&settings.cache.dir, settings.cache_max_age())
}

pub(crate) fn stats(settings: &Settings) -> Result<ExitCode> {
    let stats = open(settings).stats();
    let rendered = serde_json::to_string_pretty(&stats).context("Failed to render cache statistics")?;
    println!("📦 Cache statistics");
    println!("{}", rendered);
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn clear(settings: &Settings, max_age_hours: Option<f64>) -> Result<ExitCode> {
    let max_age = max_age_hours.map(max_age_from_hours).transpose()?;

    let cleared = open(settings).clear(max_age);
    println!("🧹 Cleared {} cache entries", cleared);
    Ok(ExitCode::SUCCESS)
}
