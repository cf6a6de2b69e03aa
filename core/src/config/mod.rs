mod load;
mod types;

pub use load::{load_default, load_from_path};
pub use types::{
    effective_timeout_secs, AgentConfig, AppConfig, ExecutorConfig, LoggingConfig, ReportConfig,
    RetryConfig, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS,
};
