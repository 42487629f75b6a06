//! Ask command - answer a question about project files.

use super::{client, error_handler, rule};
use anyhow::Result;
use ollamakit::config::ToolkitConfig;
use ollamakit::services::context::{gather_context, ContextLimits};
use ollamakit::services::ModelSelection;
use ollamakit::utils::error::OllamaError;
use ollamakit::utils::error_handler::ErrorHandler;
use ollamakit::utils::validation::{validate_file_path, validate_model, validate_question};
use ollamakit::{OllamaClient, QueryService, Settings};
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;

pub(crate) struct AskOptions<'a> {
    pub model: Option<&'a str>,
    pub no_cache: bool,
    pub by_priority: bool,
}

pub(crate) async fn run(settings: &Settings, question: &str, path: &str, options: AskOptions<'_>) -> Result<ExitCode> {
    let AskOptions {
        model,
        no_cache,
        by_priority,
    } = options;
    let errors = error_handler(settings);

    let validated = validate_question(question)
        .and_then(|_| validate_file_path(path))
        .and_then(|_| model.map_or(Ok(()), validate_model));
    if let Err(e) = validated {
        return Ok(fail(&errors, &e, json!({"command": "ask", "path": path})));
    }

    let client = client(settings)?;
    let config = match ToolkitConfig::load_default() {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring toolkit configuration: {:#}", e);
            ToolkitConfig::default()
        }
    };

    println!("🔌 Checking Ollama connection...");
    let selection = if by_priority {
        ModelSelection::Priority(&config)
    } else {
        ModelSelection::Largest
    };
    let model = match resolve_model(settings, &client, model, selection).await {
        Ok(model) => model,
        Err(e) => return Ok(fail(&errors, &e, json!({"command": "ask", "function": "check_connection"}))),
    };
    println!("✅ Ollama connected - using model: {}", model);

    println!("🔍 Gathering project context...");
    let gathered = gather_context(Path::new(path), &ContextLimits::default(), &errors);
    let context = if gathered.is_empty() {
        println!("⚠️ No files found to analyze in: {}", path);
        format!("No files found in {}", path)
    } else {
        println!("📁 Found context from {} files", gathered.file_count);
        gathered.text
    };

    let cache = if no_cache { None } else { settings.response_cache() };
    let service = QueryService::new(Arc::new(client), settings.retry_policy())
        .with_cache(cache)
        .with_transcript(&settings.files.response_log);

    let options = config.options_for(&model);

    println!("🤖 Querying Ollama...");
    let answer = match service.ask_with_options(question, &context, &model, options).await {
        Ok(answer) => answer,
        Err(e) => {
            let code = fail(
                &errors,
                &e,
                json!({
                    "command": "ask",
                    "model": model,
                    "context_length": context.chars().count(),
                }),
            );
            print_stats(&service, &errors);
            return Ok(code);
        }
    };

    println!();
    println!("{}", rule());
    println!("{}", if answer.cached { "RESPONSE (CACHED):" } else { "RESPONSE:" });
    println!("{}", rule());
    println!();
    println!("{}", answer.text);
    println!();
    println!("{}", rule());
    println!("⏱️ {:.1}s with {}", answer.elapsed.as_secs_f64(), answer.model);

    print_stats(&service, &errors);
    Ok(ExitCode::SUCCESS)
}

/// Explicit model, then OLLAMA_MODEL, then an installed model picked by `selection`
async fn resolve_model(
    settings: &Settings,
    client: &OllamaClient,
    model: Option<&str>,
    selection: ModelSelection<'_>,
) -> Result<String, OllamaError> {
    if let Some(model) = model.or(settings.ollama.model.as_deref()) {
        // Still confirm the service is up before spending time on context
        client.list_models().await?;
        return Ok(model.to_string());
    }
    client.check_connection(selection).await
}

fn fail(errors: &ErrorHandler, error: &OllamaError, context: serde_json::Value) -> ExitCode {
    let message = errors.handle_error(error, context);
    eprintln!("{}", message);
    ExitCode::FAILURE
}

fn print_stats(service: &QueryService, errors: &ErrorHandler) {
    println!();
    if let Some(cache) = service.cache() {
        let stats = cache.stats();
        println!(
            "📦 Cache: {} entries, {} MB in {}",
            stats.total_files,
            stats.total_size_mb,
            stats.cache_dir.display()
        );
    }

    let stats = errors.stats();
    let seen: Vec<String> = stats
        .error_types
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(kind, count)| format!("{}={}", kind, count))
        .collect();
    if seen.is_empty() {
        println!("🧾 Errors: {}", stats.total_errors);
    } else {
        println!("🧾 Errors: {} ({})", stats.total_errors, seen.join(", "));
    }
}
