//! Error handling module
//!
//! Defines the closed error taxonomy, the raw failure type produced at call
//! boundaries and the classifier that maps one onto the other

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use thiserror::Error;

/// Error kinds used for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    Timeout,
    Authentication,
    Validation,
    RateLimit,
    ModelNotFound,
    InvalidResponse,
    FileSystem,
    Network,
    Unknown,
}

impl ErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::Connection,
        ErrorKind::Timeout,
        ErrorKind::Authentication,
        ErrorKind::Validation,
        ErrorKind::RateLimit,
        ErrorKind::ModelNotFound,
        ErrorKind::InvalidResponse,
        ErrorKind::FileSystem,
        ErrorKind::Network,
        ErrorKind::Unknown,
    ];

    /// Get error kind string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Validation => "validation",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ModelNotFound => "model_not_found",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::FileSystem => "file_system",
            ErrorKind::Network => "network",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Whether a failure of this kind is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Connection | ErrorKind::Timeout)
    }

    /// Fixed user-facing sentence for this kind
    ///
    /// Raw internal messages never reach the terminal; they go to the error log.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "❌ Cannot connect to Ollama. Check that it is running.",
            ErrorKind::Timeout => "⏰ The operation took too long. Please try again.",
            ErrorKind::Authentication => "🔐 Authentication error. Check your configuration.",
            ErrorKind::Validation => "⚠️ Validation error. Check the input data.",
            ErrorKind::RateLimit => "🚫 Too many requests. Wait a moment.",
            ErrorKind::ModelNotFound => "🤖 Model not found. Check that it is installed.",
            ErrorKind::InvalidResponse => "📡 Invalid response from the server.",
            ErrorKind::FileSystem => "📁 File system error.",
            ErrorKind::Network => "🌐 Network error. Check your connection.",
            ErrorKind::Unknown => "❓ Unexpected error. Check the logs for details.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified error
///
/// Carries one taxonomy kind, a human-readable message, diagnostic details
/// and the moment it was classified.
#[derive(Debug, Clone, Error)]
#[error("[{}] {}", .kind.as_str().to_uppercase(), .message)]
pub struct OllamaError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: BTreeMap<String, String>,
    pub timestamp: DateTime<Local>,
}

/// Serializable form of an [`OllamaError`], as written to the error log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error_type: ErrorKind,
    pub message: String,
    pub details: BTreeMap<String, String>,
    pub timestamp: String,
}

impl OllamaError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: BTreeMap::new(),
            timestamp: Local::now(),
        }
    }

    /// Attach a diagnostic key/value pair
    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.insert(key.into(), value.to_string());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn model_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ModelNotFound, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidResponse, message)
    }

    /// Whether the retry driver may try again
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Fixed sentence for the terminal
    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }

    /// Convert to the record written to the error log
    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord {
            error_type: self.kind,
            message: self.to_string(),
            details: self.details.clone(),
            timestamp: self.timestamp.to_rfc3339(),
        }
    }
}

/// Raw, not yet classified failure
///
/// Call boundaries produce one of these structured variants so that the
/// classifier can decide on type first and only fall back to message text
/// for client errors that carry nothing better.
#[derive(Debug, Error)]
pub enum Failure {
    /// A deadline elapsed
    #[error("{0}")]
    Deadline(#[from] tokio::time::error::Elapsed),

    /// HTTP client failure
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Client-layer failure that only carries a message
    #[error("{0}")]
    Client(String),

    /// File system failure
    #[error("{0}")]
    Io(#[from] io::Error),

    /// Body could not be decoded
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// Already classified upstream
    #[error("{0}")]
    Classified(#[from] OllamaError),

    /// Anything else
    #[error("{message}")]
    Other { type_name: String, message: String },
}

impl Failure {
    /// Wrap an arbitrary error, keeping its type name for diagnostics
    pub fn other<E: std::error::Error>(error: E) -> Self {
        Failure::Other {
            type_name: short_type_name::<E>().to_string(),
            message: error.to_string(),
        }
    }

    fn type_name(&self) -> &str {
        match self {
            Failure::Deadline(_) => "Elapsed",
            Failure::Http(_) => "reqwest::Error",
            Failure::Client(_) => "ClientError",
            Failure::Io(e) => match e.kind() {
                io::ErrorKind::NotFound => "FileNotFoundError",
                io::ErrorKind::PermissionDenied => "PermissionError",
                _ => "io::Error",
            },
            Failure::Decode(_) => "serde_json::Error",
            Failure::Classified(_) => "OllamaError",
            Failure::Other { type_name, .. } => type_name,
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Classify a raw failure into exactly one error kind
///
/// First matching rule wins; `Unknown` catches everything else, so this
/// never fails.
pub fn classify(failure: Failure) -> OllamaError {
    let original = failure.to_string();
    let type_name = failure.type_name().to_string();

    let base = match failure {
        Failure::Classified(error) => return error,
        Failure::Deadline(_) => {
            OllamaError::timeout("The operation took too long to complete")
        }
        Failure::Http(ref error) if error.is_timeout() => {
            OllamaError::timeout("Connection to Ollama timed out")
        }
        Failure::Http(ref error) if error.is_connect() => {
            OllamaError::connection("Cannot connect to Ollama")
        }
        Failure::Http(ref error) if error.is_decode() => {
            OllamaError::invalid_response("Could not decode the Ollama response")
        }
        Failure::Http(_) | Failure::Client(_) => classify_client_message(&original),
        Failure::Io(ref error) => match error.kind() {
            io::ErrorKind::NotFound => OllamaError::validation("File not found"),
            io::ErrorKind::PermissionDenied => OllamaError::validation("Permission error"),
            _ => OllamaError::new(ErrorKind::FileSystem, "File system operation failed"),
        },
        Failure::Decode(_) => OllamaError::invalid_response("Malformed response payload"),
        Failure::Other { .. } => {
            OllamaError::new(ErrorKind::Unknown, format!("Unexpected error: {}", original))
        }
    };

    base.with_detail("original_error", &original)
        .with_detail("error_type", type_name)
}

/// Fallback for client errors without structured flags
fn classify_client_message(message: &str) -> OllamaError {
    let lowered = message.to_lowercase();
    if lowered.contains("timeout") || lowered.contains("timed out") {
        OllamaError::timeout("Connection to Ollama timed out")
    } else if lowered.contains("connection") {
        OllamaError::connection("Cannot connect to Ollama")
    } else {
        OllamaError::new(ErrorKind::Network, "Network error talking to Ollama")
    }
}

impl From<Failure> for OllamaError {
    fn from(failure: Failure) -> Self {
        classify(failure)
    }
}

impl From<reqwest::Error> for OllamaError {
    fn from(error: reqwest::Error) -> Self {
        classify(Failure::Http(error))
    }
}

impl From<io::Error> for OllamaError {
    fn from(error: io::Error) -> Self {
        classify(Failure::Io(error))
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, OllamaError>;

/// Error context extension trait
pub trait ErrorContext<T> {
    /// Add validation error context
    fn validation_context(self, message: &str) -> AppResult<T>;

    /// Add file system error context
    fn filesystem_context(self, message: &str) -> AppResult<T>;

    /// Add invalid response error context
    fn invalid_response_context(self, message: &str) -> AppResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn validation_context(self, message: &str) -> AppResult<T> {
        self.map_err(|e| contextual(ErrorKind::Validation, message, e))
    }

    fn filesystem_context(self, message: &str) -> AppResult<T> {
        self.map_err(|e| contextual(ErrorKind::FileSystem, message, e))
    }

    fn invalid_response_context(self, message: &str) -> AppResult<T> {
        self.map_err(|e| contextual(ErrorKind::InvalidResponse, message, e))
    }
}

fn contextual<E: std::error::Error>(kind: ErrorKind, message: &str, error: E) -> OllamaError {
    OllamaError::new(kind, format!("{}: {}", message, error))
        .with_detail("original_error", &error)
        .with_detail("error_type", short_type_name::<E>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        let retryable: Vec<_> = ErrorKind::ALL.iter().filter(|k| k.is_retryable()).collect();
        assert_eq!(retryable, vec![&ErrorKind::Connection, &ErrorKind::Timeout]);
    }

    #[test]
    fn test_display_has_kind_prefix() {
        let error = OllamaError::validation("Invalid question");
        assert_eq!(error.to_string(), "[VALIDATION] Invalid question");
    }

    #[test]
    fn test_io_classification() {
        let not_found = classify(io::Error::new(io::ErrorKind::NotFound, "gone").into());
        assert_eq!(not_found.kind, ErrorKind::Validation);
        assert_eq!(not_found.details["error_type"], "FileNotFoundError");

        let denied = classify(io::Error::new(io::ErrorKind::PermissionDenied, "nope").into());
        assert_eq!(denied.kind, ErrorKind::Validation);
        assert_eq!(denied.details["original_error"], "nope");
    }

    #[test]
    fn test_client_message_fallback() {
        assert_eq!(classify(Failure::Client("read timeout".into())).kind, ErrorKind::Timeout);
        assert_eq!(
            classify(Failure::Client("Connection reset by peer".into())).kind,
            ErrorKind::Connection
        );
        assert_eq!(classify(Failure::Client("bad chunk".into())).kind, ErrorKind::Network);
    }

    #[test]
    fn test_classified_passes_through() {
        let original = OllamaError::model_not_found("no such model").with_detail("model", "x");
        let classified = classify(original.clone().into());
        assert_eq!(classified.kind, ErrorKind::ModelNotFound);
        assert_eq!(classified.details.get("model").map(String::as_str), Some("x"));
        assert!(!classified.details.contains_key("original_error"));
    }

    #[test]
    fn test_error_context() {
        let result: Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"));

        let error = result.filesystem_context("Failed to write report").unwrap_err();
        assert_eq!(error.kind, ErrorKind::FileSystem);
        assert!(error.message.contains("Failed to write report"));
        assert!(error.message.contains("disk on fire"));

        let decoded = serde_json::from_str::<serde_json::Value>("{").invalid_response_context("Bad body");
        assert_eq!(decoded.unwrap_err().kind, ErrorKind::InvalidResponse);

        let missing = std::path::Path::new("no/such/dir").metadata().validation_context("Missing");
        let error = missing.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert_eq!(error.details["error_type"], "Error");
    }
}
