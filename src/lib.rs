//! Ollama toolkit library
//!
//! Response caching, error classification, retrying and validation for
//! querying a local Ollama server, plus context gathering, benchmarking and
//! monitoring built on top of them

pub mod cache;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// Re-export common types
pub use cache::{CacheStats, ResponseCache};
pub use config::{Settings, ToolkitConfig};
pub use services::{Generator, OllamaClient, QueryService, RetryPolicy};
pub use utils::error::{AppResult, ErrorKind, OllamaError};
pub use utils::error_handler::ErrorHandler;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
