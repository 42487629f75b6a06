//! Input validation
//!
//! Pure checks for user-supplied questions, model names and paths. Each
//! returns a `Validation` error describing the first problem found.

use crate::utils::error::{AppResult, ErrorContext, OllamaError};
use std::path::{Component, Path};

/// Minimum question length after trimming
pub const MIN_QUESTION_CHARS: usize = 3;

/// Maximum question length
pub const MAX_QUESTION_CHARS: usize = 10_000;

/// Characters never accepted in a model name
pub const FORBIDDEN_MODEL_CHARS: [char; 8] = ['<', '>', '"', '\'', '&', '|', ';', '`'];

/// Validate question input
pub fn validate_question(question: &str) -> AppResult<()> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(OllamaError::validation("Question cannot be empty"));
    }

    if trimmed.chars().count() < MIN_QUESTION_CHARS {
        return Err(OllamaError::validation(format!(
            "Question must be at least {} characters long",
            MIN_QUESTION_CHARS
        ))
        .with_detail("length", trimmed.chars().count()));
    }

    let length = question.chars().count();
    if length > MAX_QUESTION_CHARS {
        return Err(OllamaError::validation(format!(
            "Question cannot be longer than {} characters",
            MAX_QUESTION_CHARS
        ))
        .with_detail("length", length));
    }

    Ok(())
}

/// Validate model name
pub fn validate_model(model: &str) -> AppResult<()> {
    if model.trim().is_empty() {
        return Err(OllamaError::validation("Model name cannot be empty"));
    }

    if let Some(c) = model.chars().find(|c| FORBIDDEN_MODEL_CHARS.contains(c)) {
        return Err(
            OllamaError::validation(format!("Model name contains forbidden character '{}'", c))
                .with_detail("model", model),
        );
    }

    Ok(())
}

/// Validate file path
///
/// An empty path means the current directory and is accepted as is.
pub fn validate_file_path(path: &str) -> AppResult<()> {
    if path.trim().is_empty() {
        return Ok(());
    }

    let candidate = Path::new(path);
    if candidate
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(OllamaError::validation("Path traversal is not allowed").with_detail("path", path));
    }

    if candidate.has_root() || candidate.is_absolute() {
        return Err(OllamaError::validation("Absolute paths are not allowed").with_detail("path", path));
    }

    candidate
        .metadata()
        .validation_context("Path does not exist")
        .map_err(|e| e.with_detail("path", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_trimmed_length() {
        assert!(validate_question("  ab  ").is_err());
        assert!(validate_question("  abc  ").is_ok());
    }

    #[test]
    fn test_question_counts_characters_not_bytes() {
        let question = "é".repeat(MAX_QUESTION_CHARS);
        assert!(validate_question(&question).is_ok());
    }

    #[test]
    fn test_every_forbidden_model_char() {
        for c in FORBIDDEN_MODEL_CHARS {
            let model = format!("llama{}3", c);
            assert!(validate_model(&model).is_err(), "{} should be rejected", model);
        }
        assert!(validate_model("codellama:7b-instruct").is_ok());
    }

    #[test]
    fn test_nested_traversal_rejected() {
        assert!(validate_file_path("src/../../etc").is_err());
    }
}
