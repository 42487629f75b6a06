//! ollamakit command-line interface
//!
//! Asks a local Ollama server questions about a project, with response
//! caching, benchmarking and monitoring helpers

use clap::{Parser, Subcommand};
use ollamakit::utils::logging::init_logging;
use ollamakit::Settings;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};

mod commands;

/// Query, cache, benchmark and monitor a local Ollama server
#[derive(Parser)]
#[command(name = "ollamakit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question about the files under a path
    Ask {
        /// The question
        question: String,
        /// File or directory to analyze
        #[arg(default_value = ".")]
        path: String,
        /// Model to use (default: OLLAMA_MODEL or the largest installed model)
        #[arg(short, long)]
        model: Option<String>,
        /// Skip the response cache
        #[arg(long)]
        no_cache: bool,
        /// Without --model or OLLAMA_MODEL, prefer the highest-priority model profile
        #[arg(long)]
        by_priority: bool,
    },

    /// Inspect or clean the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Measure generation latency across models
    Benchmark {
        /// Comma-separated models (default: every installed model)
        #[arg(long, value_delimiter = ',')]
        models: Vec<String>,
        /// Report file
        #[arg(short, long, default_value = "benchmark_report.md")]
        output: PathBuf,
    },

    /// Show live service, system and GPU status
    Monitor {
        /// Seconds between updates
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
        /// Model used for probe queries
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Check that the Ollama service answers
    Health,

    /// Show toolkit and environment information
    Info,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache statistics
    Stats,
    /// Delete entries older than the given age
    Clear {
        /// Age threshold in hours (default: CACHE_MAX_AGE_HOURS)
        #[arg(long)]
        max_age_hours: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = Settings::new();
    let (level, format) = match &settings {
        Ok(s) => (s.logging.level.clone(), s.logging.format.clone()),
        Err(_) => ("info".to_string(), "text".to_string()),
    };
    init_logging(if cli.verbose { "debug" } else { level.as_str() }, &format);

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings: {:#}", e);
            eprintln!("❌ Invalid configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!("Settings loaded: {:?}", settings);

    let result = match cli.command {
        Commands::Ask {
            question,
            path,
            model,
            no_cache,
            by_priority,
        } => {
            let options = commands::ask::AskOptions {
                model: model.as_deref(),
                no_cache,
                by_priority,
            };
            commands::ask::run(&settings, &question, &path, options).await
        }
        Commands::Cache { action } => match action {
            CacheAction::Stats => commands::cache::stats(&settings),
            CacheAction::Clear { max_age_hours } => commands::cache::clear(&settings, max_age_hours),
        },
        Commands::Benchmark { models, output } => commands::benchmark::run(&settings, &models, &output).await,
        Commands::Monitor { interval, model } => {
            commands::monitor::run(&settings, interval, model.as_deref()).await
        }
        Commands::Health => commands::health::run(&settings).await,
        Commands::Info => commands::info::run(&settings),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
