use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use maestro_core::agent::{Agent, AgentRegistry};
use maestro_core::config::{AppConfig, RetryConfig};
use maestro_core::executor::traits::{OutputRenderer, RetryStrategy};
use maestro_core::persist::ReportSink;

use crate::agents::ScriptedAgent;
use crate::executor::renderers::{JsonlRenderer, TextRenderer};
use crate::executor::strategies::{ExponentialBackoff, LinearBackoff};
use crate::sinks::JsonlReportSink;

pub fn build_renderer(format: &str, ascii_only: bool) -> Arc<dyn OutputRenderer> {
    match format {
        "jsonl" => Arc::new(JsonlRenderer::new(false)),
        // anything other than jsonl behaves like text
        _ => Arc::new(TextRenderer::new(ascii_only)),
    }
}

/// `None` disables retries entirely (a single attempt per task).
pub fn build_retry_strategy(cfg: &RetryConfig) -> Option<Arc<dyn RetryStrategy>> {
    if cfg.max_attempts <= 1 {
        return None;
    }
    match cfg.strategy.as_str() {
        "linear" => Some(Arc::new(LinearBackoff::new(cfg.clone()))),
        _ => Some(Arc::new(ExponentialBackoff::new(cfg.clone()))),
    }
}

pub fn build_report_sink(cfg: &AppConfig) -> Option<Arc<dyn ReportSink>> {
    if !cfg.report.enabled {
        return None;
    }
    Some(Arc::new(JsonlReportSink::new(cfg.report.path.clone())))
}

/// Registry from the `[[agents]]` config entries, each backed by a scripted
/// fixture file.
pub fn build_registry(cfg: &AppConfig) -> Result<AgentRegistry> {
    let mut registry = AgentRegistry::new();
    for agent_cfg in &cfg.agents {
        let path = agent_cfg
            .fixtures
            .as_ref()
            .with_context(|| format!("agent '{}' has no fixtures file configured", agent_cfg.key))?;
        let agent = ScriptedAgent::from_path(path)?;
        anyhow::ensure!(
            agent.key() == agent_cfg.key,
            "fixture {} declares key '{}' but config says '{}'",
            path.display(),
            agent.key(),
            agent_cfg.key
        );
        let capability = agent.capability();
        registry.register(capability, Arc::new(agent))?;
    }
    Ok(registry)
}

/// Registry from every `*.json` fixture in a directory, in file-name order.
pub fn load_fixture_dir(dir: &Path) -> Result<AgentRegistry> {
    let mut registry = AgentRegistry::new();
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("reading fixture directory {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let agent = ScriptedAgent::from_path(&path)?;
        let capability = agent.capability();
        registry.register(capability, Arc::new(agent))?;
    }
    Ok(registry)
}
