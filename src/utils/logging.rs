//! Logging utilities
//!
//! Shared logging configuration and helper functions

use crate::models::ollama::GenerateRequest;

/// Set to true to include full prompts in debug logs
/// Default is false to reduce log verbosity
pub const VERBOSE_REQUEST_LOGGING: bool = false;

/// Initialize logging system
///
/// `format` is either `text` (human readable) or `json` (one object per line).
pub fn init_logging(level: &str, format: &str) {
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if format == "json" {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(level)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr)
                .finish(),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(level)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .finish(),
        )
    };

    // A second initialization (tests, embedding) keeps the first subscriber
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already set");
    }
}

/// Truncate a string with a note about original length
pub fn truncate_content(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();
    if total > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars truncated)", head, total - max_chars)
    } else {
        s.to_string()
    }
}

/// Create a filtered summary of a generate request for logging
/// Keeps original structure but truncates the prompt
pub fn create_request_log_summary(request: &GenerateRequest) -> serde_json::Value {
    if VERBOSE_REQUEST_LOGGING {
        serde_json::to_value(request).unwrap_or(serde_json::json!({"error": "serialize failed"}))
    } else {
        serde_json::json!({
            "model": request.model,
            "stream": request.stream,
            "prompt": truncate_content(&request.prompt, 200),
            "options": request.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_content() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("abcdef", 3), "abc... (3 chars truncated)");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_content("ñandú", 2), "ña... (3 chars truncated)");
    }

    #[test]
    fn test_request_summary_truncates_prompt() {
        let request = GenerateRequest::new("llama2:7b", "x".repeat(500));
        let summary = create_request_log_summary(&request);
        assert_eq!(summary["model"], "llama2:7b");
        assert!(summary["prompt"].as_str().unwrap().contains("300 chars truncated"));
    }
}
