//! Application configuration settings
//!
//! Defines all configuration structures and loading logic

use crate::cache::ResponseCache;
use crate::services::retry::RetryPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Ollama service configuration
    pub ollama: OllamaConfig,
    /// Response cache configuration
    pub cache: CacheConfig,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Log file locations
    pub files: FileConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Ollama service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Service base URL
    pub host: String,
    /// Fixed model; when unset the largest installed model is used
    pub model: Option<String>,
    /// Generation timeout in seconds
    pub timeout: u64,
    /// Timeout for health and model listing calls in seconds
    pub health_timeout: u64,
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub max_age_hours: f64,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per operation
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each subsequent one
    pub base_delay_ms: u64,
}

/// Log file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub error_log: PathBuf,
    pub response_log: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Settings {
    /// Create a new configuration instance
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let settings = Self {
            ollama: OllamaConfig {
                host: get("OLLAMA_HOST", "http://localhost:11434")
                    .trim_end_matches('/')
                    .to_string(),
                model: lookup("OLLAMA_MODEL").filter(|m| !m.trim().is_empty()),
                timeout: get("REQUEST_TIMEOUT", "300")
                    .parse()
                    .context("Invalid request timeout")?,
                health_timeout: get("HEALTH_TIMEOUT", "5")
                    .parse()
                    .context("Invalid health timeout")?,
            },
            cache: CacheConfig {
                enabled: get("CACHE_ENABLED", "true")
                    .parse()
                    .context("Invalid cache enabled flag")?,
                dir: PathBuf::from(get("OLLAMA_CACHE_DIR", "cache")),
                max_age_hours: get("CACHE_MAX_AGE_HOURS", "24")
                    .parse()
                    .context("Invalid cache max age")?,
            },
            retry: RetryConfig {
                max_retries: get("MAX_RETRIES", "3")
                    .parse()
                    .context("Invalid maximum retries")?,
                base_delay_ms: get("RETRY_BASE_DELAY_MS", "1000")
                    .parse()
                    .context("Invalid retry base delay")?,
            },
            files: FileConfig {
                error_log: PathBuf::from(get("ERROR_LOG_FILE", "logs/errors.log")),
                response_log: PathBuf::from(get("RESPONSE_LOG_FILE", "logs/ollama_responses.txt")),
            },
            logging: LoggingConfig {
                level: get("RUST_LOG", "info"),
                format: get("LOG_FORMAT", "text"),
            },
        };

        // Validate configuration
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> Result<()> {
        // Validate URL format
        if !self.ollama.host.starts_with("http") {
            anyhow::bail!("Invalid Ollama host format, should start with 'http'");
        }

        if let Some(model) = &self.ollama.model {
            crate::utils::validation::validate_model(model)
                .map_err(|e| anyhow::anyhow!("Invalid OLLAMA_MODEL: {}", e))?;
        }

        // Validate timeout values
        if self.ollama.timeout == 0 || self.ollama.health_timeout == 0 {
            anyhow::bail!("Timeout values cannot be 0");
        }

        if !self.cache.max_age_hours.is_finite() || self.cache.max_age_hours <= 0.0 {
            anyhow::bail!("Cache max age must be a positive number of hours");
        }
        max_age_from_hours(self.cache.max_age_hours).context("Invalid CACHE_MAX_AGE_HOURS")?;

        if self.retry.max_retries == 0 {
            anyhow::bail!("Maximum retries cannot be 0");
        }

        // RUST_LOG may carry directives like "ollamakit=debug"; only bare levels are checked
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !self.logging.level.contains('=') && !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        // Validate log format
        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Configured cache lifetime
    pub fn cache_max_age(&self) -> Duration {
        max_age_from_hours(self.cache.max_age_hours).unwrap_or(Duration::MAX)
    }

    /// Cache handle, `None` when caching is disabled
    pub fn response_cache(&self) -> Option<ResponseCache> {
        self.cache
            .enabled
            .then(|| ResponseCache::new(&self.cache.dir, self.cache_max_age()))
    }

    /// Retry policy for generation calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_retries,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.timeout)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.health_timeout)
    }
}

/// Convert an hour count to a `Duration`, rejecting negative, non-finite and out-of-range values
pub fn max_age_from_hours(hours: f64) -> Result<Duration> {
    if !hours.is_finite() || hours < 0.0 {
        anyhow::bail!("Max age must be a non-negative number of hours, got {}", hours);
    }
    Duration::try_from_secs_f64(hours * 3600.0)
        .map_err(|_| anyhow::anyhow!("Max age of {} hours is too large", hours))
}
