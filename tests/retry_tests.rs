//! Retry driver tests
//!
//! Run on a paused clock so backoff waits are measured without sleeping.

use ollamakit::services::retry::{retry_operation, RetryPolicy};
use ollamakit::utils::error::{ErrorKind, Failure, OllamaError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_secs(1))
}

#[tokio::test(start_paused = true)]
async fn test_success_short_circuits() {
    let mut calls = 0;
    let start = Instant::now();

    let result = retry_operation(
        || {
            calls += 1;
            async { Ok::<_, OllamaError>("answer") }
        },
        &policy(3),
    )
    .await;

    assert_eq!(assert_ok!(result), "answer");
    assert_eq!(calls, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_then_success() {
    let mut calls = 0;
    let start = Instant::now();

    let result = retry_operation(
        || {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt < 3 {
                    Err(OllamaError::connection("refused"))
                } else {
                    Ok(attempt)
                }
            }
        },
        &policy(3),
    )
    .await;

    assert_eq!(assert_ok!(result), 3);
    // 1s before the second attempt, 2s before the third
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_returns_last_error() {
    let mut calls = 0;
    let start = Instant::now();

    let result: Result<(), _> = retry_operation(
        || {
            calls += 1;
            let attempt = calls;
            async move { Err(OllamaError::timeout("slow").with_detail("attempt", attempt)) }
        },
        &policy(3),
    )
    .await;

    let error = assert_err!(result);
    assert_eq!(error.kind, ErrorKind::Timeout);
    assert_eq!(error.details["attempt"], "3");
    assert_eq!(calls, 3);
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_fails_fast() {
    for error in [
        OllamaError::validation("bad question"),
        OllamaError::model_not_found("no model"),
        OllamaError::new(ErrorKind::RateLimit, "slow down"),
        OllamaError::new(ErrorKind::Network, "reset"),
    ] {
        let kind = error.kind;
        let mut calls = 0;
        let start = Instant::now();

        let result: Result<(), _> = retry_operation(
            || {
                calls += 1;
                let error = error.clone();
                async move { Err(error) }
            },
            &policy(5),
        )
        .await;

        assert_eq!(assert_err!(result).kind, kind);
        assert_eq!(calls, 1, "{} should not be retried", kind);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

#[tokio::test(start_paused = true)]
async fn test_raw_failures_are_classified() {
    let mut calls = 0;

    let result: Result<(), _> = retry_operation(
        || {
            calls += 1;
            async { Err(Failure::Client("connection reset".into())) }
        },
        &policy(2),
    )
    .await;

    assert_eq!(assert_err!(result).kind, ErrorKind::Connection);
    assert_eq!(calls, 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_budget_runs_once() {
    let mut calls = 0;

    let result: Result<(), _> = retry_operation(
        || {
            calls += 1;
            async { Err(OllamaError::connection("refused")) }
        },
        &policy(0),
    )
    .await;

    assert_err!(result);
    assert_eq!(calls, 1);
}

#[tokio::test(start_paused = true)]
async fn test_policy_run() {
    let policy = RetryPolicy::new(4, Duration::from_millis(100));
    let mut calls = 0;
    let start = Instant::now();

    let result: Result<(), _> = policy
        .run(|| {
            calls += 1;
            async { Err(OllamaError::timeout("slow")) }
        })
        .await;

    assert_err!(result);
    assert_eq!(calls, 4);
    // 100 + 200 + 400 ms
    assert_eq!(start.elapsed(), Duration::from_millis(700));
}
