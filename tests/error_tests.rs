//! Error classification and error handler tests

use ollamakit::utils::error::*;
use ollamakit::utils::error_handler::{ErrorHandler, ErrorLogEntry};
use serde_json::json;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("widget exploded")]
struct WidgetError;

#[test]
fn test_every_kind_has_a_distinct_user_message() {
    let messages: HashSet<&str> = ErrorKind::ALL.iter().map(|k| k.user_message()).collect();
    assert_eq!(messages.len(), ErrorKind::ALL.len());
    assert!(ErrorKind::ALL.iter().all(|k| !k.user_message().is_empty()));
}

#[test]
fn test_kind_strings() {
    let test_cases = vec![
        (ErrorKind::Connection, "connection"),
        (ErrorKind::Timeout, "timeout"),
        (ErrorKind::Authentication, "authentication"),
        (ErrorKind::Validation, "validation"),
        (ErrorKind::RateLimit, "rate_limit"),
        (ErrorKind::ModelNotFound, "model_not_found"),
        (ErrorKind::InvalidResponse, "invalid_response"),
        (ErrorKind::FileSystem, "file_system"),
        (ErrorKind::Network, "network"),
        (ErrorKind::Unknown, "unknown"),
    ];

    for (kind, expected) in test_cases {
        assert_eq!(kind.as_str(), expected);
        assert_eq!(serde_json::to_value(kind).unwrap(), json!(expected));
    }
}

#[tokio::test]
async fn test_deadline_is_timeout() {
    let elapsed = tokio::time::timeout(Duration::from_millis(1), std::future::pending::<()>())
        .await
        .unwrap_err();

    let error = classify(elapsed.into());
    assert_eq!(error.kind, ErrorKind::Timeout);
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_refused_connection_is_connection() {
    let failure = reqwest::Client::new()
        .get("http://127.0.0.1:1/api/tags")
        .send()
        .await
        .unwrap_err();

    let error = OllamaError::from(failure);
    assert_eq!(error.kind, ErrorKind::Connection);
    assert!(error.details.contains_key("original_error"));
    assert_eq!(error.details["error_type"], "reqwest::Error");
}

#[test]
fn test_unrecognized_failure_is_unknown_with_type_name() {
    let error = classify(Failure::other(WidgetError));
    assert_eq!(error.kind, ErrorKind::Unknown);
    assert_eq!(error.details["error_type"], "WidgetError");
    assert_eq!(error.details["original_error"], "widget exploded");
    assert!(error.message.contains("widget exploded"));
}

#[test]
fn test_other_io_errors_are_file_system() {
    let error = classify(io::Error::new(io::ErrorKind::Other, "disk full").into());
    assert_eq!(error.kind, ErrorKind::FileSystem);
    assert!(!error.is_retryable());
}

#[test]
fn test_decode_failure_is_invalid_response() {
    let failure = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
    assert_eq!(classify(failure.into()).kind, ErrorKind::InvalidResponse);
}

#[test]
fn test_classification_is_total() {
    let failures = vec![
        Failure::Client(String::new()),
        Failure::Client("socket hang up".into()),
        Failure::Io(io::Error::new(io::ErrorKind::Interrupted, "")),
        Failure::other(WidgetError),
        Failure::Other {
            type_name: String::new(),
            message: String::new(),
        },
    ];

    for failure in failures {
        let error = classify(failure);
        assert!(ErrorKind::ALL.contains(&error.kind));
    }
}

#[test]
fn test_error_record_shape() {
    let error = OllamaError::model_not_found("no llama").with_detail("model", "llama9");
    let record = serde_json::to_value(error.to_record()).unwrap();

    assert_eq!(record["error_type"], "model_not_found");
    assert_eq!(record["message"], "[MODEL_NOT_FOUND] no llama");
    assert_eq!(record["details"]["model"], "llama9");
    assert!(record["timestamp"].as_str().unwrap().contains('T'));
}

#[test]
fn test_handler_appends_log_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("logs").join("errors.log");
    let handler = ErrorHandler::new(&log_file);

    handler.handle(Failure::Client("connection refused".into()), json!({"function": "check"}));
    handler.handle_error(&OllamaError::validation("bad"), json!({}));

    let content = fs::read_to_string(&log_file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let (timestamp, payload) = lines[0].split_once(" - ").unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

    let entry: ErrorLogEntry = serde_json::from_str(payload).unwrap();
    assert_eq!(entry.error.error_type, ErrorKind::Connection);
    assert_eq!(entry.context["function"], "check");
}

#[test]
fn test_handler_survives_unwritable_log() {
    let dir = tempfile::tempdir().unwrap();
    // The log path is a directory, so every write fails
    let handler = ErrorHandler::new(dir.path());

    let message = handler.handle(Failure::Client("timed out".into()), json!({}));
    assert_eq!(message, ErrorKind::Timeout.user_message());
    assert_eq!(handler.stats().total_errors, 1);
}

#[test]
fn test_handler_counts_by_kind() {
    let dir = tempfile::tempdir().unwrap();
    let handler = ErrorHandler::new(dir.path().join("errors.log"));

    handler.record(&OllamaError::timeout("a"));
    handler.record(&OllamaError::timeout("b"));
    handler.record(&OllamaError::connection("c"));

    let stats = handler.stats();
    assert_eq!(stats.total_errors, 3);
    assert_eq!(stats.error_types[&ErrorKind::Timeout], 2);
    assert_eq!(stats.error_types[&ErrorKind::Connection], 1);
    assert_eq!(stats.error_types[&ErrorKind::Unknown], 0);
}
