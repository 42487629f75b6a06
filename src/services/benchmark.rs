//! Model latency benchmark
//!
//! Runs each benchmark case a fixed number of times against every model and
//! summarizes the latencies.

use crate::config::BenchmarkCase;
use crate::models::ollama::GenerateRequest;
use crate::services::client::Generator;
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one case on one model
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseResult {
    /// Latency of each successful run, in ms
    pub times: Vec<f64>,
    pub errors: Vec<String>,
    pub iterations: usize,
}

impl CaseResult {
    /// Build from raw samples
    pub fn from_samples(times: Vec<f64>, errors: Vec<String>, iterations: usize) -> Self {
        Self {
            times,
            errors,
            iterations,
        }
    }

    /// At least one run succeeded
    pub fn success(&self) -> bool {
        !self.times.is_empty()
    }

    pub fn avg_time(&self) -> f64 {
        if self.times.is_empty() {
            return 0.0;
        }
        self.times.iter().sum::<f64>() / self.times.len() as f64
    }

    pub fn min_time(&self) -> f64 {
        self.times.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    pub fn max_time(&self) -> f64 {
        self.times.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    /// Sample standard deviation; 0 with fewer than two samples
    pub fn std_dev(&self) -> f64 {
        let n = self.times.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.avg_time();
        let variance = self.times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    }

    /// Percentage of successful runs
    pub fn success_rate(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.times.len() as f64 / self.iterations as f64 * 100.0
    }
}

/// All case results for one model, in case order
#[derive(Debug, Clone, Serialize)]
pub struct ModelResults {
    pub model: String,
    pub cases: Vec<(String, CaseResult)>,
}

/// Fastest model for a case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestConfiguration {
    pub case: String,
    pub model: String,
    pub avg_time: f64,
    pub success_rate: f64,
}

/// Benchmark runner
pub struct Benchmark {
    generator: Arc<dyn Generator>,
}

impl Benchmark {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Run one case `case.iterations` times against `model`
    pub async fn run_case(&self, model: &str, case: &BenchmarkCase) -> CaseResult {
        let request = GenerateRequest::new(model, case.prompt.as_str()).with_options(Some(case.options()));
        let mut times = Vec::with_capacity(case.iterations);
        let mut errors = Vec::new();

        for iteration in 0..case.iterations {
            let start = Instant::now();
            match self.generator.generate(&request).await {
                Ok(_) => times.push(start.elapsed().as_secs_f64() * 1000.0),
                Err(e) => {
                    debug!("Iteration {} of '{}' on {} failed: {}", iteration + 1, case.name, model, e);
                    errors.push(e.message.clone());
                }
            }
        }

        CaseResult::from_samples(times, errors, case.iterations)
    }

    /// Run every case against every model
    pub async fn run(&self, models: &[String], cases: &[BenchmarkCase]) -> Vec<ModelResults> {
        info!("🚀 Benchmarking {} models with {} cases", models.len(), cases.len());

        let mut results = Vec::with_capacity(models.len());
        for model in models {
            info!("🧪 Benchmarking model: {}", model);
            let mut model_cases = Vec::with_capacity(cases.len());

            for (index, case) in cases.iter().enumerate() {
                let result = self.run_case(model, case).await;
                if result.success() {
                    info!(
                        "   Test {}/{} {}: avg {:.0}ms (±{:.0}ms)",
                        index + 1,
                        cases.len(),
                        case.name,
                        result.avg_time(),
                        result.std_dev()
                    );
                } else {
                    warn!("   Test {}/{} {} failed: {:?}", index + 1, cases.len(), case.name, result.errors);
                }
                model_cases.push((case.name.clone(), result));
            }

            results.push(ModelResults {
                model: model.clone(),
                cases: model_cases,
            });
        }

        results
    }
}

/// Render results as a markdown report
pub fn render_report(results: &[ModelResults]) -> String {
    let mut report = String::from("# Ollama Benchmark Report\n\n");
    report.push_str(&format!("Generated: {}\n\n", Local::now().format("%Y-%m-%d %H:%M:%S")));

    report.push_str("## Performance Summary\n\n");
    report.push_str("| Model | Test | Avg Time (ms) | Min | Max | Std Dev | Success Rate |\n");
    report.push_str("|-------|------|---------------|-----|-----|---------|--------------|\n");
    for model in results {
        for (name, result) in &model.cases {
            if result.success() {
                report.push_str(&format!(
                    "| {} | {} | {:.0} | {:.0} | {:.0} | {:.0} | {:.1}% |\n",
                    model.model,
                    name,
                    result.avg_time(),
                    result.min_time(),
                    result.max_time(),
                    result.std_dev(),
                    result.success_rate()
                ));
            } else {
                report.push_str(&format!("| {} | {} | ❌ | ❌ | ❌ | ❌ | 0% |\n", model.model, name));
            }
        }
    }

    report.push_str("\n## Detailed Results\n\n");
    for model in results {
        report.push_str(&format!("### {}\n\n", model.model));
        for (name, result) in &model.cases {
            report.push_str(&format!("#### {}\n\n", name));
            if result.success() {
                let individual: Vec<String> = result.times.iter().map(|t| format!("{:.0}ms", t)).collect();
                report.push_str(&format!("- **Average Time**: {:.0}ms\n", result.avg_time()));
                report.push_str(&format!(
                    "- **Range**: {:.0}ms - {:.0}ms\n",
                    result.min_time(),
                    result.max_time()
                ));
                report.push_str(&format!("- **Standard Deviation**: {:.0}ms\n", result.std_dev()));
                report.push_str(&format!("- **Success Rate**: {:.1}%\n", result.success_rate()));
                report.push_str(&format!("- **Individual Times**: {}\n\n", individual.join(", ")));
            } else {
                report.push_str("- **Status**: Failed\n");
                report.push_str(&format!("- **Errors**: {}\n\n", result.errors.join(", ")));
            }
        }
    }

    report
}

/// Fastest successful model per case, in first-seen case order
pub fn best_configurations(results: &[ModelResults]) -> Vec<BestConfiguration> {
    let mut best: Vec<BestConfiguration> = Vec::new();

    for model in results {
        for (name, result) in model.cases.iter().filter(|(_, r)| r.success()) {
            let candidate = BestConfiguration {
                case: name.clone(),
                model: model.model.clone(),
                avg_time: result.avg_time(),
                success_rate: result.success_rate(),
            };
            match best.iter_mut().find(|b| &b.case == name) {
                Some(current) if candidate.avg_time < current.avg_time => *current = candidate,
                Some(_) => {}
                None => best.push(candidate),
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(times: &[f64], errors: usize, iterations: usize) -> CaseResult {
        CaseResult::from_samples(
            times.to_vec(),
            (0..errors).map(|i| format!("error {}", i)).collect(),
            iterations,
        )
    }

    #[test]
    fn test_statistics() {
        let result = case(&[100.0, 200.0, 300.0], 1, 4);
        assert_eq!(result.avg_time(), 200.0);
        assert_eq!(result.min_time(), 100.0);
        assert_eq!(result.max_time(), 300.0);
        assert_eq!(result.std_dev(), 100.0);
        assert_eq!(result.success_rate(), 75.0);
    }

    #[test]
    fn test_single_sample_has_zero_deviation() {
        assert_eq!(case(&[42.0], 0, 1).std_dev(), 0.0);
    }

    #[test]
    fn test_failed_case() {
        let result = case(&[], 3, 3);
        assert!(!result.success());
        assert_eq!(result.avg_time(), 0.0);
        assert_eq!(result.success_rate(), 0.0);
    }

    #[test]
    fn test_best_configurations_pick_fastest() {
        let results = vec![
            ModelResults {
                model: "slow".into(),
                cases: vec![("Fast Question".into(), case(&[500.0], 0, 1)), ("Chat".into(), case(&[], 1, 1))],
            },
            ModelResults {
                model: "fast".into(),
                cases: vec![("Fast Question".into(), case(&[50.0], 0, 1)), ("Chat".into(), case(&[], 1, 1))],
            },
        ];

        let best = best_configurations(&results);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].model, "fast");
    }

    #[test]
    fn test_report_marks_failures() {
        let results = vec![ModelResults {
            model: "llama2:7b".into(),
            cases: vec![
                ("Fast Question".into(), case(&[100.0, 120.0], 0, 2)),
                ("Code Generation".into(), case(&[], 1, 1)),
            ],
        }];

        let report = render_report(&results);
        assert!(report.starts_with("# Ollama Benchmark Report"));
        assert!(report.contains("| llama2:7b | Fast Question | 110 | 100 | 120 |"));
        assert!(report.contains("| llama2:7b | Code Generation | ❌ |"));
        assert!(report.contains("- **Individual Times**: 100ms, 120ms"));
        assert!(report.contains("- **Errors**: error 0"));
    }
}
