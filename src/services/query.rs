//! Question answering service
//!
//! Ties validation, the response cache, retrying generation and the
//! response transcript together.

use crate::cache::ResponseCache;
use crate::models::ollama::{GenerateOptions, GenerateRequest};
use crate::services::client::Generator;
use crate::services::retry::{retry_operation, RetryPolicy};
use crate::utils::error::AppResult;
use crate::utils::validation::{validate_model, validate_question};
use chrono::Local;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Answer to a question
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Served from the response cache
    pub cached: bool,
    pub model: String,
    pub elapsed: Duration,
}

/// Reason a generated response looks wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityIssue {
    TooShort,
    ArithmeticError,
    Repetitive,
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QualityIssue::TooShort => "Response too short",
            QualityIssue::ArithmeticError => "Mathematical error detected",
            QualityIssue::Repetitive => "Repetitive response detected",
        })
    }
}

/// Question answering service
pub struct QueryService {
    generator: Arc<dyn Generator>,
    cache: Option<ResponseCache>,
    retry: RetryPolicy,
    transcript: Option<PathBuf>,
}

impl QueryService {
    /// Create a service without cache or transcript
    pub fn new(generator: Arc<dyn Generator>, retry: RetryPolicy) -> Self {
        Self {
            generator,
            cache: None,
            retry,
            transcript: None,
        }
    }

    pub fn with_cache(mut self, cache: Option<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Append every answer to `path`
    pub fn with_transcript(mut self, path: impl Into<PathBuf>) -> Self {
        self.transcript = Some(path.into());
        self
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Answer a question about `context` with `model`
    pub async fn ask(&self, question: &str, context: &str, model: &str) -> AppResult<Answer> {
        self.ask_with_options(question, context, model, None).await
    }

    /// Answer a question with explicit generation options
    ///
    /// Validation failures are returned before the cache or the model is
    /// touched. Cache and transcript problems never fail the call.
    pub async fn ask_with_options(
        &self,
        question: &str,
        context: &str,
        model: &str,
        options: Option<GenerateOptions>,
    ) -> AppResult<Answer> {
        validate_question(question)?;
        validate_model(model)?;

        let start = Instant::now();

        if let Some(text) = self.cache.as_ref().and_then(|c| c.get(question, context, model)) {
            info!("✅ Response served from cache");
            self.record_transcript(question, &text);
            return Ok(Answer {
                text,
                cached: true,
                model: model.to_string(),
                elapsed: start.elapsed(),
            });
        }

        let request = GenerateRequest::new(model, build_prompt(question, context)).with_options(options);
        let request_id = Uuid::new_v4();
        let span = info_span!("query", request_id = %request_id, model = %model);

        let generator = self.generator.as_ref();
        let request_ref = &request;
        let response = retry_operation(move || generator.generate(request_ref), &self.retry)
            .instrument(span)
            .await?;

        let text = response.text().to_string();
        if let Err(issue) = check_response_quality(&text) {
            warn!(request_id = %request_id, "⚠️ {}", issue);
        }

        if let Some(cache) = &self.cache {
            cache.set(question, &text, context, model);
        }
        self.record_transcript(question, &text);

        let elapsed = start.elapsed();
        info!(request_id = %request_id, "Answer generated in {:?}", elapsed);

        Ok(Answer {
            text,
            cached: false,
            model: model.to_string(),
            elapsed,
        })
    }

    fn record_transcript(&self, question: &str, answer: &str) {
        if let Some(path) = &self.transcript {
            if let Err(e) = append_transcript(path, question, answer) {
                warn!("⚠️ Could not save response to {:?}: {}", path, e);
            }
        }
    }
}

/// Default prompt sent with project context
pub fn build_prompt(question: &str, context: &str) -> String {
    format!("Project files:\n{}\n\nQuestion: {}\n\nAnswer:", context, question)
}

/// Heuristic sanity check of a generated response
pub fn check_response_quality(response: &str) -> Result<(), QualityIssue> {
    if response.trim().chars().count() < 10 {
        return Err(QualityIssue::TooShort);
    }

    if response.to_lowercase().contains("2+2") && !response.contains('4') {
        return Err(QualityIssue::ArithmeticError);
    }

    let words: Vec<&str> = response.split_whitespace().collect();
    if words.len() > 20 {
        let limit = words.len() as f64 * 0.3;
        let mut frequency: HashMap<&str, usize> = HashMap::new();
        for word in &words {
            let count = frequency.entry(*word).or_insert(0);
            *count += 1;
            if *count as f64 > limit {
                return Err(QualityIssue::Repetitive);
            }
        }
    }

    Ok(())
}

/// Append a `Q:`/`A:` block to the transcript file
pub fn append_transcript(path: &Path, question: &str, answer: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(
        file,
        "\n=== {} ===\nQ: {}\nA: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        question,
        answer
    )?;
    debug!("Response appended to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt() {
        assert_eq!(
            build_prompt("What is this?", "=== a.py ===\nprint(1)"),
            "Project files:\n=== a.py ===\nprint(1)\n\nQuestion: What is this?\n\nAnswer:"
        );
    }

    #[test]
    fn test_quality_checks() {
        assert_eq!(check_response_quality("   ok   "), Err(QualityIssue::TooShort));
        assert_eq!(
            check_response_quality("The answer to 2+2 is five."),
            Err(QualityIssue::ArithmeticError)
        );
        assert_eq!(check_response_quality("The answer to 2+2 is 4."), Ok(()));

        let repetitive = vec!["again"; 25].join(" ");
        assert_eq!(check_response_quality(&repetitive), Err(QualityIssue::Repetitive));

        let varied: String = (0..30).map(|i| format!("word{} ", i)).collect();
        assert_eq!(check_response_quality(&varied), Ok(()));
    }

    #[test]
    fn test_append_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("responses.txt");

        append_transcript(&path, "first?", "one").unwrap();
        append_transcript(&path, "second?", "two").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("\n=== "));
        assert!(content.contains("Q: first?\nA: one\n"));
        assert!(content.contains("Q: second?\nA: two\n"));
    }
}
