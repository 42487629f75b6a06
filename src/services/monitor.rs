//! Service and host monitoring
//!
//! Collects one snapshot of Ollama health, host resources, GPU state and
//! probe query latency, and keeps running statistics across snapshots.

use crate::models::ollama::{GenerateOptions, GenerateRequest};
use crate::services::client::{OllamaClient, ServiceHealth};
use crate::utils::error::{AppResult, Failure, OllamaError};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Model used for probe queries when none is configured
pub const DEFAULT_PROBE_MODEL: &str = "codellama:7b-code-q4_K_M";

const PROBE_PROMPT: &str = "Q: What is 2+2?\nA:";
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Host resource usage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemInfo {
    /// 1, 5 and 15 minute load averages
    pub load_average: Option<[f64; 3]>,
    pub memory: Option<MemoryInfo>,
    pub disk: Option<DiskInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub available_kb: u64,
}

impl MemoryInfo {
    pub fn used_percent(&self) -> f64 {
        if self.total_kb == 0 {
            return 0.0;
        }
        (self.total_kb.saturating_sub(self.available_kb)) as f64 / self.total_kb as f64 * 100.0
    }

    pub fn available_gb(&self) -> f64 {
        self.available_kb as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskInfo {
    pub total_kb: u64,
    pub used_kb: u64,
    pub available_kb: u64,
}

impl DiskInfo {
    pub fn used_percent(&self) -> f64 {
        if self.total_kb == 0 {
            return 0.0;
        }
        self.used_kb as f64 / self.total_kb as f64 * 100.0
    }

    pub fn free_gb(&self) -> f64 {
        self.available_kb as f64 / (1024.0 * 1024.0)
    }
}

/// One GPU as reported by `nvidia-smi`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuInfo {
    pub utilization: u32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
}

impl GpuInfo {
    pub fn memory_percent(&self) -> f64 {
        if self.memory_total_mb == 0 {
            return 0.0;
        }
        self.memory_used_mb as f64 / self.memory_total_mb as f64 * 100.0
    }
}

/// GPU state, from whichever source answered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuStatus {
    Gpus(Vec<GpuInfo>),
    /// Raw `ollama ps` output
    OllamaPs(String),
    Unavailable(String),
}

/// Probe query result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub success: bool,
    pub duration_ms: f64,
    pub response_length: usize,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Running statistics across snapshots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorStats {
    pub queries: u64,
    pub errors: u64,
    pub total_response_ms: f64,
    pub started_at: DateTime<Local>,
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self {
            queries: 0,
            errors: 0,
            total_response_ms: 0.0,
            started_at: Local::now(),
        }
    }
}

impl MonitorStats {
    pub fn record(&mut self, probe: &ProbeResult) {
        if probe.success {
            self.queries += 1;
            self.total_response_ms += probe.duration_ms;
        } else {
            self.errors += 1;
        }
    }

    pub fn avg_response_ms(&self) -> f64 {
        if self.queries == 0 {
            return 0.0;
        }
        self.total_response_ms / self.queries as f64
    }

    /// Failed probes as a percentage of all probes
    pub fn error_rate(&self) -> Option<f64> {
        let attempts = self.queries + self.errors;
        (attempts > 0).then(|| self.errors as f64 / attempts as f64 * 100.0)
    }

    pub fn uptime(&self) -> Duration {
        Local::now()
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Everything gathered in one monitoring pass
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Local>,
    pub health: ServiceHealth,
    pub system: SystemInfo,
    pub gpu: GpuStatus,
    pub probe: ProbeResult,
}

/// Monitor for one Ollama service
pub struct Monitor {
    client: OllamaClient,
    probe_model: String,
    stats: MonitorStats,
}

impl Monitor {
    pub fn new(client: OllamaClient, probe_model: impl Into<String>) -> Self {
        Self {
            client,
            probe_model: probe_model.into(),
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    /// Gather one snapshot and fold its probe into the statistics
    pub async fn snapshot(&mut self) -> Snapshot {
        let health = self.client.health().await;
        let system = system_info().await;
        let gpu = gpu_status().await;
        let probe = self.probe().await;

        self.stats.record(&probe);

        Snapshot {
            taken_at: Local::now(),
            health,
            system,
            gpu,
            probe,
        }
    }

    /// Send the fixed probe question and time it
    pub async fn probe(&self) -> ProbeResult {
        let request = GenerateRequest::new(&self.probe_model, PROBE_PROMPT)
            .with_options(Some(GenerateOptions::new(0.1, 20)));

        let start = Instant::now();
        let result: AppResult<_> = tokio::time::timeout(PROBE_TIMEOUT, self.client.generate(&request))
            .await
            .map_err(|elapsed| OllamaError::from(Failure::from(elapsed)))
            .and_then(|inner| inner);

        match result {
            Ok(response) => ProbeResult {
                success: true,
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                response_length: response.text().chars().count(),
                model: if response.model.is_empty() {
                    self.probe_model.clone()
                } else {
                    response.model
                },
                error: None,
            },
            Err(e) => ProbeResult {
                success: false,
                duration_ms: 0.0,
                response_length: 0,
                model: self.probe_model.clone(),
                error: Some(e.to_string()),
            },
        }
    }
}

/// Read load, memory and root disk usage
pub async fn system_info() -> SystemInfo {
    let load_average = tokio::fs::read_to_string("/proc/loadavg")
        .await
        .ok()
        .and_then(|raw| parse_loadavg(&raw));

    let memory = tokio::fs::read_to_string("/proc/meminfo")
        .await
        .ok()
        .and_then(|raw| parse_meminfo(&raw));

    let disk = run_command("df", &["-Pk", "/"])
        .await
        .and_then(|out| parse_df(&out));

    SystemInfo {
        load_average,
        memory,
        disk,
    }
}

/// Query `nvidia-smi`, falling back to `ollama ps`
pub async fn gpu_status() -> GpuStatus {
    let query = [
        "--query-gpu=utilization.gpu,memory.used,memory.total",
        "--format=csv,noheader,nounits",
    ];
    if let Some(out) = run_command("nvidia-smi", &query).await {
        return GpuStatus::Gpus(parse_nvidia_smi(&out));
    }

    match run_command("ollama", &["ps"]).await {
        Some(out) => GpuStatus::OllamaPs(out.trim().to_string()),
        None => GpuStatus::Unavailable("No GPU monitoring available".to_string()),
    }
}

async fn run_command(program: &str, args: &[&str]) -> Option<String> {
    let output = tokio::time::timeout(COMMAND_TIMEOUT, Command::new(program).args(args).output()).await;

    match output {
        Ok(Ok(output)) if output.status.success() => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        Ok(Ok(output)) => {
            debug!("{} exited with {}", program, output.status);
            None
        }
        Ok(Err(e)) => {
            debug!("Could not run {}: {}", program, e);
            None
        }
        Err(_) => {
            debug!("{} timed out", program);
            None
        }
    }
}

pub fn parse_loadavg(raw: &str) -> Option<[f64; 3]> {
    let mut fields = raw.split_whitespace().map(|f| f.parse::<f64>());
    match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(one)), Some(Ok(five)), Some(Ok(fifteen))) => Some([one, five, fifteen]),
        _ => None,
    }
}

pub fn parse_meminfo(raw: &str) -> Option<MemoryInfo> {
    let field = |name: &str| {
        raw.lines()
            .find(|line| line.starts_with(name))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|kb| kb.parse::<u64>().ok())
    };

    Some(MemoryInfo {
        total_kb: field("MemTotal:")?,
        available_kb: field("MemAvailable:").or_else(|| field("MemFree:"))?,
    })
}

/// Parse `df -Pk` output for its first filesystem line
pub fn parse_df(raw: &str) -> Option<DiskInfo> {
    let line = raw.lines().nth(1)?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return None;
    }

    Some(DiskInfo {
        total_kb: fields[1].parse().ok()?,
        used_kb: fields[2].parse().ok()?,
        available_kb: fields[3].parse().ok()?,
    })
}

/// Parse `nvidia-smi` CSV rows; malformed rows are skipped
pub fn parse_nvidia_smi(raw: &str) -> Vec<GpuInfo> {
    raw.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() < 3 {
                return None;
            }
            Some(GpuInfo {
                utilization: parts[0].parse().ok()?,
                memory_used_mb: parts[1].parse().ok()?,
                memory_total_mb: parts[2].parse().ok()?,
            })
        })
        .collect()
}

/// Human readable duration: `42s`, `3.5m`, `1.2h`
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    if seconds < 60.0 {
        format!("{:.0}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else {
        format!("{:.1}h", seconds / 3600.0)
    }
}

/// Render a snapshot for the terminal
pub fn render_status(snapshot: &Snapshot, stats: &MonitorStats) -> String {
    let mut out = String::new();
    out.push_str("🖥️  Ollama Real-time Monitor\n");
    out.push_str(&format!("{}\n", "=".repeat(50)));
    out.push_str(&format!("📅 {}\n\n", snapshot.taken_at.format("%Y-%m-%d %H:%M:%S")));

    let health = &snapshot.health;
    out.push_str("🤖 Ollama Status:\n");
    out.push_str(&format!(
        "   Status: {} {}\n",
        if health.is_healthy() { "🟢" } else { "🔴" },
        health.status
    ));
    out.push_str(&format!("   Models: {}\n", health.models_count));
    if !health.models.is_empty() {
        let shown: Vec<&str> = health.models.iter().take(3).map(String::as_str).collect();
        let more = if health.models.len() > 3 { "..." } else { "" };
        out.push_str(&format!("   Available: {}{}\n", shown.join(", "), more));
    }
    if let Some(error) = &health.error {
        out.push_str(&format!("   Error: {}\n", error));
    }
    out.push('\n');

    let system = &snapshot.system;
    out.push_str("💻 System Resources:\n");
    if let Some([one, five, fifteen]) = system.load_average {
        out.push_str(&format!("   Load: {:.2} {:.2} {:.2}\n", one, five, fifteen));
    }
    if let Some(memory) = &system.memory {
        out.push_str(&format!(
            "   Memory: {:.1}% ({:.1}GB free)\n",
            memory.used_percent(),
            memory.available_gb()
        ));
    }
    if let Some(disk) = &system.disk {
        out.push_str(&format!("   Disk: {:.1}% ({:.1}GB free)\n", disk.used_percent(), disk.free_gb()));
    }
    out.push('\n');

    match &snapshot.gpu {
        GpuStatus::Gpus(gpus) => {
            out.push_str("🎮 GPU Status:\n");
            for (i, gpu) in gpus.iter().enumerate() {
                out.push_str(&format!(
                    "   GPU {}: {}% | Memory: {:.1}% ({}MB/{}MB)\n",
                    i,
                    gpu.utilization,
                    gpu.memory_percent(),
                    gpu.memory_used_mb,
                    gpu.memory_total_mb
                ));
            }
        }
        GpuStatus::OllamaPs(ps) => {
            out.push_str("🎮 Ollama GPU:\n");
            out.push_str(&format!("   {}\n", ps));
        }
        GpuStatus::Unavailable(reason) => {
            out.push_str(&format!("🎮 GPU: {}\n", reason));
        }
    }
    out.push('\n');

    let probe = &snapshot.probe;
    out.push_str("⚡ Performance:\n");
    if probe.success {
        out.push_str(&format!("   Last Query: {:.0}ms\n", probe.duration_ms));
        out.push_str(&format!("   Response Length: {} chars\n", probe.response_length));
    } else {
        out.push_str(&format!("   Last Query: ❌ {}\n", probe.error.as_deref().unwrap_or("unknown error")));
    }
    out.push_str(&format!("   Avg Response Time: {:.0}ms\n", stats.avg_response_ms()));
    out.push_str(&format!("   Total Queries: {}\n", stats.queries));
    out.push_str(&format!("   Errors: {}\n", stats.errors));
    out.push_str(&format!("   Uptime: {}\n", format_duration(stats.uptime())));

    if let Some(rate) = stats.error_rate() {
        out.push_str(&format!("\n📊 Error Rate: {:.1}%\n", rate));
    }

    out
}
