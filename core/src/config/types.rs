use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub report: ReportConfig,

    /// Capability providers to register at startup.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// EnvFilter string, e.g. "info" or "maestro_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            level: default_logging_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Cap on simultaneously in-flight agent calls within one stage.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Per-task wall-clock budget for one agent invocation.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_max_in_flight() -> usize {
    4
}

fn default_task_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            task_timeout_secs: default_task_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_retry_strategy() -> String {
    "exponential-backoff".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_retry_strategy(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// If true, append each run's report to `path` as one JSON line.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_report_path")]
    pub path: String,
}

fn default_report_path() -> String {
    "./maestro.reports.jsonl".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_report_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub key: String,

    /// Path to a scripted-agent fixture file (see maestro-plugins).
    #[serde(default)]
    pub fixtures: Option<PathBuf>,
}

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const MAX_TIMEOUT_SECS: u64 = 60 * 60;

pub fn effective_timeout_secs(timeout: u64) -> u64 {
    timeout.clamp(1, MAX_TIMEOUT_SECS)
}
