use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::traits::Agent;

/// Parameter contract for one operation mode.
///
/// Only structural validity is described here (names of required and
/// optional parameters); value semantics belong to the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeSpec {
    #[serde(default)]
    pub required: Vec<String>,

    #[serde(default)]
    pub optional: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// What one capability provider can do: its key and supported modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub key: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub modes: BTreeMap<String, ModeSpec>,
}

impl Capability {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: None,
            modes: BTreeMap::new(),
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>, required: &[&str]) -> Self {
        self.modes.insert(
            mode.into(),
            ModeSpec {
                required: required.iter().map(|s| s.to_string()).collect(),
                optional: Vec::new(),
                description: None,
            },
        );
        self
    }

    pub fn supports(&self, mode: &str) -> bool {
        self.modes.contains_key(mode)
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("agent '{0}' is already registered")]
    DuplicateKey(String),

    #[error("capability key '{capability}' does not match agent key '{agent}'")]
    KeyMismatch { capability: String, agent: String },
}

struct Entry {
    capability: Capability,
    agent: Arc<dyn Agent>,
}

/// Capability-keyed registry of providers behind one invocation interface.
///
/// New providers register under a new key without touching the engine.
#[derive(Default)]
pub struct AgentRegistry {
    entries: HashMap<String, Entry>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        capability: Capability,
        agent: Arc<dyn Agent>,
    ) -> Result<(), RegistryError> {
        if capability.key != agent.key() {
            return Err(RegistryError::KeyMismatch {
                capability: capability.key,
                agent: agent.key().to_string(),
            });
        }
        if self.entries.contains_key(&capability.key) {
            return Err(RegistryError::DuplicateKey(capability.key));
        }
        tracing::debug!(key = %capability.key, modes = capability.modes.len(), "registered agent");
        self.entries
            .insert(capability.key.clone(), Entry { capability, agent });
        Ok(())
    }

    pub fn agent(&self, key: &str) -> Option<Arc<dyn Agent>> {
        self.entries.get(key).map(|e| e.agent.clone())
    }

    pub fn capability(&self, key: &str) -> Option<&Capability> {
        self.entries.get(key).map(|e| &e.capability)
    }

    pub fn supports(&self, key: &str, mode: &str) -> bool {
        self.capability(key).is_some_and(|c| c.supports(mode))
    }

    pub fn mode_spec(&self, key: &str, mode: &str) -> Option<&ModeSpec> {
        self.capability(key).and_then(|c| c.modes.get(mode))
    }

    /// Registered capability keys, sorted for stable output.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
