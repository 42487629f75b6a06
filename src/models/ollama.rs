//! Ollama API data models
//!
//! Defines Ollama API request and response structures

use serde::{Deserialize, Serialize};

/// Generate request structure (`POST /api/generate`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model name
    pub model: String,
    /// Full prompt text
    pub prompt: String,
    /// Whether to stream response; always false here
    pub stream: bool,
    /// Sampling options (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

impl GenerateRequest {
    /// Create a non-streaming request without options
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            options: None,
        }
    }

    /// Set sampling options
    pub fn with_options(mut self, options: Option<GenerateOptions>) -> Self {
        self.options = options;
        self
    }
}

/// Sampling options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Temperature parameter (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

impl GenerateOptions {
    pub fn new(temperature: f32, num_predict: i32) -> Self {
        Self {
            temperature: Some(temperature),
            num_predict: Some(num_predict),
        }
    }
}

/// Generate response structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    #[serde(default)]
    pub response: Option<String>,
    /// Model that answered
    #[serde(default)]
    pub model: String,
    /// Whether generation finished
    #[serde(default)]
    pub done: bool,
    /// Total duration in nanoseconds (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    /// Generated token count (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    /// Error reported in a 200 body (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    /// Generated text, or a placeholder when the server sent none
    pub fn text(&self) -> &str {
        self.response.as_deref().unwrap_or("No response")
    }
}

/// Installed models list (`GET /api/tags`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Installed model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model tag, e.g. `llama2:7b`
    pub name: String,
    /// Size on disk in bytes
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ModelInfo {
    /// Size in megabytes
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

/// Error body returned with non-200 statuses
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_empty_options() {
        let request = GenerateRequest::new("llama2:7b", "hi");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json.get("options").is_none());

        let request = request.with_options(Some(GenerateOptions::new(0.1, 20)));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["options"]["num_predict"], 20);
    }

    #[test]
    fn test_response_text_placeholder() {
        let response: GenerateResponse = serde_json::from_str(r#"{"model":"m","done":true}"#).unwrap();
        assert_eq!(response.text(), "No response");
    }

    #[test]
    fn test_tags_tolerates_missing_fields() {
        let tags: TagsResponse =
            serde_json::from_str(r#"{"models":[{"name":"smollm2:135m"}]}"#).unwrap();
        assert_eq!(tags.models[0].size, 0);
    }
}
