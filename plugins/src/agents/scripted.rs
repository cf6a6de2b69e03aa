use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use maestro_core::agent::{Agent, AgentError, Capability, ModeSpec, ParamMap};

/// Deterministic stand-in for a real capability provider, driven by a JSON
/// fixture file. Used by the CLI and by end-to-end tests so plans run
/// without live credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptFile {
    pub key: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub modes: BTreeMap<String, ModeScript>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeScript {
    #[serde(default)]
    pub required: Vec<String>,

    #[serde(default)]
    pub optional: Vec<String>,

    /// Returned on every successful invocation.
    #[serde(default)]
    pub response: Value,

    #[serde(default)]
    pub latency_ms: u64,

    /// Fail this many invocations before the first success.
    #[serde(default)]
    pub fail_times: u32,

    #[serde(default)]
    pub failure: ScriptedFailure,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedFailure {
    #[default]
    Transient,
    RateLimited,
    AuthRequired,
    Permanent,
}

pub struct ScriptedAgent {
    script: ScriptFile,
    calls: Mutex<BTreeMap<String, u32>>,
}

impl ScriptedAgent {
    pub fn new(script: ScriptFile) -> Self {
        Self {
            script,
            calls: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture file {}", path.display()))?;
        let script: ScriptFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing fixture file {}", path.display()))?;
        Ok(Self::new(script))
    }

    /// Capability derived from the fixture's declared modes.
    pub fn capability(&self) -> Capability {
        let mut capability = Capability::new(self.script.key.clone());
        capability.description = self.script.description.clone();
        for (mode, script) in &self.script.modes {
            capability.modes.insert(
                mode.clone(),
                ModeSpec {
                    required: script.required.clone(),
                    optional: script.optional.clone(),
                    description: None,
                },
            );
        }
        capability
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn key(&self) -> &str {
        &self.script.key
    }

    async fn invoke(&self, mode: &str, parameters: ParamMap) -> Result<Value, AgentError> {
        let Some(script) = self.script.modes.get(mode) else {
            return Err(AgentError::InvalidParameters(format!(
                "unsupported mode '{mode}'"
            )));
        };

        for name in &script.required {
            if !parameters.contains_key(name) {
                return Err(AgentError::InvalidParameters(format!(
                    "missing required parameter '{name}'"
                )));
            }
        }

        if script.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(script.latency_ms)).await;
        }

        let call = {
            let mut calls = self.calls.lock().await;
            let count = calls.entry(mode.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if call <= script.fail_times {
            return Err(match script.failure {
                ScriptedFailure::Transient => {
                    AgentError::Transient("scripted transient failure".into())
                }
                ScriptedFailure::RateLimited => AgentError::RateLimited {
                    message: "scripted rate limit".into(),
                    retry_after: Some(Duration::from_millis(20)),
                },
                ScriptedFailure::AuthRequired => {
                    AgentError::AuthRequired("scripted auth failure".into())
                }
                ScriptedFailure::Permanent => {
                    AgentError::Permanent("scripted permanent failure".into())
                }
            });
        }

        Ok(script.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn script() -> ScriptFile {
        serde_json::from_value(json!({
            "key": "repo",
            "modes": {
                "list": {
                    "required": ["org"],
                    "response": {"items": [{"name": "alpha"}]}
                },
                "flaky": {
                    "fail_times": 1,
                    "failure": "rate_limited",
                    "response": {"ok": true}
                }
            }
        }))
        .unwrap()
    }

    fn params(value: Value) -> ParamMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn returns_the_scripted_response() {
        let agent = ScriptedAgent::new(script());
        let out = agent
            .invoke("list", params(json!({"org": "acme"})))
            .await
            .unwrap();
        assert_eq!(out, json!({"items": [{"name": "alpha"}]}));
    }

    #[tokio::test]
    async fn enforces_required_parameters() {
        let agent = ScriptedAgent::new(script());
        let err = agent.invoke("list", ParamMap::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_modes() {
        let agent = ScriptedAgent::new(script());
        let err = agent.invoke("push", ParamMap::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn fails_the_scripted_number_of_times() {
        let agent = ScriptedAgent::new(script());
        let first = agent.invoke("flaky", ParamMap::new()).await.unwrap_err();
        assert!(matches!(first, AgentError::RateLimited { .. }));
        assert!(first.retryable());
        let second = agent.invoke("flaky", ParamMap::new()).await.unwrap();
        assert_eq!(second, json!({"ok": true}));
    }

    #[test]
    fn capability_mirrors_the_fixture_modes() {
        let agent = ScriptedAgent::new(script());
        let capability = agent.capability();
        assert_eq!(capability.key, "repo");
        assert!(capability.supports("list"));
        assert!(capability.supports("flaky"));
        assert_eq!(capability.modes["list"].required, vec!["org"]);
    }
}
