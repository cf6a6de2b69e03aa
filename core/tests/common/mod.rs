#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use maestro_core::agent::{Agent, AgentError, AgentRegistry, Capability, ParamMap};
use maestro_core::executor::traits::RetryStrategy;
use serde_json::Value;

type Behavior = dyn Fn(&str, &ParamMap) -> Result<Value, AgentError> + Send + Sync;

/// Agent whose responses come from a closure over mode and parameters.
pub struct StubAgent {
    key: String,
    behavior: Box<Behavior>,
}

impl StubAgent {
    pub fn new<F>(key: impl Into<String>, behavior: F) -> Self
    where
        F: Fn(&str, &ParamMap) -> Result<Value, AgentError> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            behavior: Box::new(behavior),
        }
    }

    /// Always returns the same value regardless of mode or parameters.
    pub fn fixed(key: impl Into<String>, value: Value) -> Self {
        Self::new(key, move |_, _| Ok(value.clone()))
    }

    /// Always fails with a permanent error.
    pub fn broken(key: impl Into<String>, message: &str) -> Self {
        let message = message.to_string();
        Self::new(key, move |_, _| {
            Err(AgentError::Permanent(message.clone()))
        })
    }
}

#[async_trait]
impl Agent for StubAgent {
    fn key(&self) -> &str {
        &self.key
    }

    async fn invoke(&self, mode: &str, parameters: ParamMap) -> Result<Value, AgentError> {
        (self.behavior)(mode, &parameters)
    }
}

/// Fails with a transient error a fixed number of times, then succeeds.
pub struct FlakyAgent {
    key: String,
    failures_left: AtomicU32,
    response: Value,
    pub calls: AtomicU32,
}

impl FlakyAgent {
    pub fn new(key: impl Into<String>, failures: u32, response: Value) -> Self {
        Self {
            key: key.into(),
            failures_left: AtomicU32::new(failures),
            response,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Agent for FlakyAgent {
    fn key(&self) -> &str {
        &self.key
    }

    async fn invoke(&self, _mode: &str, _parameters: ParamMap) -> Result<Value, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(AgentError::Transient("upstream hiccup".into()));
        }
        Ok(self.response.clone())
    }
}

/// Tracks how many invocations overlap in time, to observe the in-flight cap.
pub struct ProbeAgent {
    key: String,
    in_flight: AtomicUsize,
    pub max_seen: AtomicUsize,
    hold: Duration,
}

impl ProbeAgent {
    pub fn new(key: impl Into<String>, hold: Duration) -> Self {
        Self {
            key: key.into(),
            in_flight: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
            hold,
        }
    }
}

#[async_trait]
impl Agent for ProbeAgent {
    fn key(&self) -> &str {
        &self.key
    }

    async fn invoke(&self, _mode: &str, _parameters: ParamMap) -> Result<Value, AgentError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Value::Null)
    }
}

/// Retry strategy with a constant delay, for fast tests.
pub struct FixedDelay {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryStrategy for FixedDelay {
    fn name(&self) -> &str {
        "fixed-delay"
    }

    fn max_attempts(&self) -> u32 {
        self.attempts
    }

    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        Some(self.delay)
    }
}

/// Registry over `(capability, agent)` pairs; panics on registration
/// conflicts, which in tests are always authoring mistakes.
pub fn registry_of(entries: Vec<(Capability, Arc<dyn Agent>)>) -> Arc<AgentRegistry> {
    let mut registry = AgentRegistry::new();
    for (capability, agent) in entries {
        registry.register(capability, agent).unwrap();
    }
    Arc::new(registry)
}
