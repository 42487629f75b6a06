//! HTTP client service
//!
//! Encapsulates HTTP communication with the Ollama API

use crate::config::{Settings, ToolkitConfig};
use crate::models::ollama::*;
use crate::utils::error::{AppResult, ErrorContext, ErrorKind, OllamaError};
use crate::utils::logging::{create_request_log_summary, truncate_content};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Anything that can answer a generate request
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse>;
}

/// How to pick a model when none is configured
#[derive(Debug, Clone, Copy)]
pub enum ModelSelection<'a> {
    /// Largest installed model by size
    Largest,
    /// Highest-priority profile among installed models
    Priority(&'a ToolkitConfig),
}

/// Service health summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// `healthy` or `unhealthy`
    pub status: String,
    pub models_count: usize,
    pub models: Vec<String>,
    /// Round trip of the tags call
    pub response_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    probe_client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a new client instance
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_timeouts(
            &settings.ollama.host,
            settings.request_timeout(),
            settings.health_timeout(),
        )
    }

    /// Create a client with explicit timeouts
    ///
    /// `request_timeout` bounds generation; `health_timeout` bounds the
    /// lightweight listing and health calls.
    pub fn with_timeouts(
        base_url: &str,
        request_timeout: Duration,
        health_timeout: Duration,
    ) -> Result<Self> {
        let user_agent = format!("ollamakit/{}", env!("CARGO_PKG_VERSION"));

        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(&user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        let probe_client = Client::builder()
            .timeout(health_timeout)
            .user_agent(&user_agent)
            .build()
            .context("Failed to create health check HTTP client")?;

        Ok(Self {
            client,
            probe_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get installed models (`GET /api/tags`)
    pub async fn list_models(&self) -> AppResult<Vec<ModelInfo>> {
        debug!("Getting installed models list");

        let url = format!("{}/api/tags", self.base_url);
        let response = self.probe_client.get(&url).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let tags: TagsResponse = serde_json::from_str(&body)
            .invalid_response_context("Invalid models list")
            .map_err(|e| e.with_detail("body", truncate_content(&body, 200)))?;

        debug!("Successfully retrieved {} models", tags.models.len());
        Ok(tags.models)
    }

    /// Send generate request (`POST /api/generate`)
    pub async fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse> {
        debug!(request = %create_request_log_summary(request), "Sending generate request");

        let url = format!("{}/api/generate", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body).with_detail("model", &request.model));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .invalid_response_context("Invalid generate response")
            .map_err(|e| e.with_detail("body", truncate_content(&body, 200)))?;

        if let Some(error) = &parsed.error {
            return Err(body_error(error).with_detail("model", &request.model));
        }

        debug!(
            model = %parsed.model,
            eval_count = ?parsed.eval_count,
            "Generate request completed"
        );
        Ok(parsed)
    }

    /// Verify the service answers and pick an installed model
    pub async fn check_connection(&self, selection: ModelSelection<'_>) -> AppResult<String> {
        let models = self.list_models().await?;

        let best = match selection {
            ModelSelection::Largest => select_largest_model(&models),
            ModelSelection::Priority(config) => config.select_by_priority(&models),
        }
        .ok_or_else(|| {
            OllamaError::model_not_found("No models are installed")
                .with_detail("hint", "ollama pull <model>")
        })?;

        info!("✅ Ollama reachable, best model: {} ({:.0} MB)", best.name, best.size_mb());
        Ok(best.name.clone())
    }

    /// Check service health
    ///
    /// Never fails; problems are reported in the returned summary.
    pub async fn health(&self) -> ServiceHealth {
        let start = Instant::now();
        let result = self.list_models().await;
        let response_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(models) => ServiceHealth {
                status: "healthy".to_string(),
                models_count: models.len(),
                models: models.into_iter().map(|m| m.name).collect(),
                response_time_ms,
                error: None,
            },
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                ServiceHealth {
                    status: "unhealthy".to_string(),
                    models_count: 0,
                    models: Vec::new(),
                    response_time_ms,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse> {
        OllamaClient::generate(self, request).await
    }
}

/// Map a non-success HTTP status to an error kind
pub fn status_error(status: StatusCode, body: &str) -> OllamaError {
    let server_message = serde_json::from_str::<OllamaErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| truncate_content(body, 200));

    let (kind, message) = match status {
        StatusCode::NOT_FOUND => (ErrorKind::ModelNotFound, "Model not found"),
        StatusCode::TOO_MANY_REQUESTS => (ErrorKind::RateLimit, "Rate limit exceeded"),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            (ErrorKind::Authentication, "Request was not authorized")
        }
        _ => (ErrorKind::Unknown, "Unexpected HTTP status"),
    };

    OllamaError::new(kind, format!("{}: {}", message, server_message))
        .with_detail("status", status.as_u16())
        .with_detail("body", server_message)
}

/// Map an error reported inside a 200 body
fn body_error(error: &str) -> OllamaError {
    if error.to_lowercase().contains("not found") {
        OllamaError::model_not_found(error.to_string())
    } else {
        OllamaError::invalid_response(format!("Ollama reported an error: {}", error))
    }
}

/// Pick the largest installed model
///
/// Models with an unknown (zero) size only win when no size is known.
pub fn select_largest_model(models: &[ModelInfo]) -> Option<&ModelInfo> {
    models
        .iter()
        .filter(|m| m.size > 0)
        .max_by_key(|m| m.size)
        .or_else(|| models.first())
}
