//! Service layer module
//!
//! Contains the Ollama HTTP client, retry driver, question answering,
//! context gathering, benchmarking and monitoring

pub mod benchmark;
pub mod client;
pub mod context;
pub mod monitor;
pub mod query;
pub mod retry;

pub use benchmark::{best_configurations, render_report, Benchmark, CaseResult};
pub use client::{Generator, ModelSelection, OllamaClient, ServiceHealth};
pub use context::{gather_context, ContextLimits, ProjectContext};
pub use monitor::Monitor;
pub use query::{Answer, QueryService};
pub use retry::{retry_operation, RetryPolicy};
