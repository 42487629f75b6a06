//! CLI commands.

use ollamakit::utils::error_handler::ErrorHandler;
use ollamakit::{OllamaClient, Settings};

pub mod ask;
pub mod benchmark;
pub mod cache;
pub mod health;
pub mod info;
pub mod monitor;

pub(crate) fn error_handler(settings: &Settings) -> ErrorHandler {
    ErrorHandler::new(&settings.files.error_log)
}

pub(crate) fn client(settings: &Settings) -> anyhow::Result<OllamaClient> {
    OllamaClient::new(settings)
}

pub(crate) fn rule() -> String {
    "=".repeat(50)
}
