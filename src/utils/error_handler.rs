//! Centralized error handling
//!
//! Classifies failures, keeps per-kind statistics and appends a structured
//! record for every handled error to the error log.

use crate::utils::error::{classify, ErrorKind, ErrorRecord, Failure, OllamaError};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error};

/// Error statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Errors handled since the last reset
    pub total_errors: u64,
    /// Count per kind; every kind is present
    pub error_types: BTreeMap<ErrorKind, u64>,
    /// Where records are appended
    pub log_file: PathBuf,
}

#[derive(Debug)]
struct Counters {
    total: u64,
    by_kind: BTreeMap<ErrorKind, u64>,
}

impl Counters {
    fn zeroed() -> Self {
        Self {
            total: 0,
            by_kind: ErrorKind::ALL.iter().map(|kind| (*kind, 0)).collect(),
        }
    }
}

/// One line of the error log
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub error: ErrorRecord,
    pub context: serde_json::Value,
    pub stack_trace: String,
}

/// Owned error handler
///
/// Construct one per process and share it by reference; counters are
/// guarded so concurrent workers never lose an increment.
#[derive(Debug)]
pub struct ErrorHandler {
    log_file: PathBuf,
    counters: Mutex<Counters>,
}

impl ErrorHandler {
    /// Create a handler logging to `log_file`
    pub fn new(log_file: impl Into<PathBuf>) -> Self {
        let log_file = log_file.into();
        if let Some(parent) = log_file.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    debug!("Could not create log directory {:?}: {}", parent, e);
                }
            }
        }

        Self {
            log_file,
            counters: Mutex::new(Counters::zeroed()),
        }
    }

    /// Classify, count and log a failure, returning the user-facing sentence
    pub fn handle(&self, failure: impl Into<Failure>, context: serde_json::Value) -> &'static str {
        let error = classify(failure.into());
        self.record(&error);
        self.write_log(&error, context);
        error.user_message()
    }

    /// Count and log an already classified error
    pub fn handle_error(&self, error: &OllamaError, context: serde_json::Value) -> &'static str {
        self.record(error);
        self.write_log(error, context);
        error.user_message()
    }

    /// Increment the total and the per-kind counter
    pub fn record(&self, error: &OllamaError) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.total += 1;
        *counters.by_kind.entry(error.kind).or_insert(0) += 1;
    }

    /// Get error statistics
    pub fn stats(&self) -> ErrorStats {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        ErrorStats {
            total_errors: counters.total,
            error_types: counters.by_kind.clone(),
            log_file: self.log_file.clone(),
        }
    }

    /// Reset every counter together
    pub fn clear_stats(&self) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        *counters = Counters::zeroed();
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    fn write_log(&self, error: &OllamaError, context: serde_json::Value) {
        let entry = ErrorLogEntry {
            error: error.to_record(),
            context,
            stack_trace: Backtrace::capture().to_string(),
        };

        let result = serde_json::to_string(&entry)
            .map_err(std::io::Error::from)
            .and_then(|json| {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.log_file)?;
                writeln!(file, "{} - {}", Local::now().to_rfc3339(), json)
            });

        if let Err(e) = result {
            error!("Error logging failed: {}", e);
            error!("Original error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_stats_start_at_zero_for_every_kind() {
        let dir = tempfile::tempdir().unwrap();
        let handler = ErrorHandler::new(dir.path().join("errors.log"));
        let stats = handler.stats();

        assert_eq!(stats.total_errors, 0);
        assert_eq!(stats.error_types.len(), ErrorKind::ALL.len());
        assert!(stats.error_types.values().all(|count| *count == 0));
    }

    #[test]
    fn test_handle_counts_and_returns_user_message() {
        let dir = tempfile::tempdir().unwrap();
        let handler = ErrorHandler::new(dir.path().join("errors.log"));

        let message = handler.handle(
            io::Error::new(io::ErrorKind::NotFound, "missing.txt"),
            serde_json::json!({"function": "gather_context"}),
        );

        assert_eq!(message, ErrorKind::Validation.user_message());
        let stats = handler.stats();
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.error_types[&ErrorKind::Validation], 1);
    }

    #[test]
    fn test_clear_stats_resets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let handler = ErrorHandler::new(dir.path().join("errors.log"));
        handler.record(&OllamaError::timeout("slow"));
        handler.record(&OllamaError::timeout("slower"));

        handler.clear_stats();

        let stats = handler.stats();
        assert_eq!(stats.total_errors, 0);
        assert_eq!(stats.error_types[&ErrorKind::Timeout], 0);
    }

    #[test]
    fn test_concurrent_records_are_all_counted() {
        let dir = tempfile::tempdir().unwrap();
        let handler = ErrorHandler::new(dir.path().join("errors.log"));

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let handler = &handler;
                scope.spawn(move || {
                    for _ in 0..250 {
                        if worker % 2 == 0 {
                            handler.record(&OllamaError::timeout("slow"));
                        } else {
                            handler.record(&OllamaError::connection("refused"));
                        }
                    }
                });
            }
        });

        let stats = handler.stats();
        assert_eq!(stats.total_errors, 2_000);
        assert_eq!(stats.error_types[&ErrorKind::Timeout], 1_000);
        assert_eq!(stats.error_types[&ErrorKind::Connection], 1_000);
    }
}
