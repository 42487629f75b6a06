//! File-based configuration loading
//!
//! Loads model profiles and benchmark cases from JSON file

use crate::models::ollama::{GenerateOptions, ModelInfo};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Toolkit configuration loaded from JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Per-model generation profiles, keyed by model tag
    #[serde(default = "default_models")]
    pub models: BTreeMap<String, ModelProfile>,

    /// Benchmark test cases
    #[serde(rename = "benchmarkCases", default = "default_benchmark_cases")]
    pub benchmark_cases: Vec<BenchmarkCase>,
}

/// Generation profile for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Lower is preferred
    pub priority: u32,

    /// Maximum tokens to generate
    #[serde(rename = "maxTokens")]
    pub max_tokens: i32,

    /// Default temperature for this model
    pub temperature: f32,
}

/// One benchmark scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkCase {
    pub name: String,
    pub prompt: String,
    pub temperature: f32,
    #[serde(rename = "maxTokens")]
    pub max_tokens: i32,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

impl BenchmarkCase {
    pub fn new(name: &str, prompt: &str, temperature: f32, max_tokens: i32, iterations: usize) -> Self {
        Self {
            name: name.to_string(),
            prompt: prompt.to_string(),
            temperature,
            max_tokens,
            iterations,
        }
    }

    /// Generation options for this case
    pub fn options(&self) -> GenerateOptions {
        GenerateOptions::new(self.temperature, self.max_tokens)
    }
}

fn default_iterations() -> usize {
    3
}

fn default_models() -> BTreeMap<String, ModelProfile> {
    let profile = |priority, max_tokens, temperature| ModelProfile {
        priority,
        max_tokens,
        temperature,
    };

    BTreeMap::from([
        ("llama2:7b".to_string(), profile(1, 2048, 0.7)),
        ("llama2:13b".to_string(), profile(2, 2048, 0.7)),
        ("codellama:7b-instruct".to_string(), profile(3, 2048, 0.3)),
        ("mistral:7b".to_string(), profile(4, 2048, 0.7)),
        ("smollm2:135m".to_string(), profile(999, 512, 0.1)),
    ])
}

fn default_benchmark_cases() -> Vec<BenchmarkCase> {
    vec![
        BenchmarkCase::new("Fast Question", "What is 2+2?", 0.1, 20, 5),
        BenchmarkCase::new(
            "Code Generation",
            "Write a Python function to calculate factorial",
            0.2,
            200,
            3,
        ),
        BenchmarkCase::new(
            "General Chat",
            "Explain the concept of recursion in programming",
            0.7,
            100,
            3,
        ),
    ]
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            benchmark_cases: default_benchmark_cases(),
        }
    }
}

impl ToolkitConfig {
    /// Load configuration from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: ToolkitConfig =
            serde_json::from_str(&content).with_context(|| "Failed to parse config JSON")?;

        config.validate()?;

        debug!(
            "Loaded {} model profiles, {} benchmark cases",
            config.models.len(),
            config.benchmark_cases.len()
        );
        Ok(config)
    }

    /// Load configuration from default locations
    /// Searches in order:
    /// 1. ~/.config/ollamakit/ollamakit.json
    /// 2. ./ollamakit.json
    ///
    /// Falls back to built-in profiles when no file is found.
    pub fn load_default() -> Result<Self> {
        // Try home config directory first
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("ollamakit").join("ollamakit.json");
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        // Try current directory
        let local_path = Path::new("ollamakit.json");
        if local_path.exists() {
            return Self::load(local_path);
        }

        debug!("No configuration file found, using built-in profiles");
        Ok(Self::default())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, profile) in &self.models {
            crate::utils::validation::validate_model(name)
                .map_err(|e| anyhow::anyhow!("Invalid model name '{}': {}", name, e))?;

            if profile.max_tokens <= 0 {
                anyhow::bail!("Model '{}' must have a positive maxTokens", name);
            }

            if !(0.0..=2.0).contains(&profile.temperature) {
                anyhow::bail!(
                    "Model '{}' temperature must be between 0 and 2, got {}",
                    name,
                    profile.temperature
                );
            }
        }

        for case in &self.benchmark_cases {
            if case.name.trim().is_empty() {
                anyhow::bail!("Benchmark case names cannot be empty");
            }
            if case.prompt.trim().is_empty() {
                anyhow::bail!("Benchmark case '{}' has an empty prompt", case.name);
            }
            if case.iterations == 0 {
                anyhow::bail!("Benchmark case '{}' must run at least once", case.name);
            }
        }

        Ok(())
    }

    /// Generation options from a model's profile, if it has one
    pub fn options_for(&self, model: &str) -> Option<GenerateOptions> {
        self.models
            .get(model)
            .map(|profile| GenerateOptions::new(profile.temperature, profile.max_tokens))
    }

    /// Pick the available model with the best profile priority
    ///
    /// Models without a profile rank last; with no profiled model installed
    /// the first available one is returned.
    pub fn select_by_priority<'a>(&self, available: &'a [ModelInfo]) -> Option<&'a ModelInfo> {
        available
            .iter()
            .enumerate()
            .min_by_key(|(index, model)| {
                let priority = self
                    .models
                    .get(&model.name)
                    .map_or(u32::MAX, |profile| profile.priority);
                (priority, *index)
            })
            .map(|(_, model)| model)
    }
}
