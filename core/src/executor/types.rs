use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::AgentError;

/// Lifecycle of a single task. Every task transitions
/// Pending → Running → {Succeeded, Failed, Skipped} exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }
}

/// Why a task was skipped rather than dispatched.
///
/// "This task's own resolution failed" and "an upstream task did not
/// succeed" are distinct reasons and must never be conflated in output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum SkipReason {
    DependencyFailed { task: String },
    DependencySkipped { task: String },
    Template { detail: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependencyFailed { task } => write!(f, "dependency '{task}' failed"),
            Self::DependencySkipped { task } => write!(f, "dependency '{task}' was skipped"),
            Self::Template { detail } => write!(f, "parameter resolution failed: {detail}"),
        }
    }
}

/// Terminal failure details attached to a task result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskError {
    Agent { kind: String, message: String },
    Timeout { timeout_secs: u64 },
    Skipped { reason: SkipReason },
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent { kind, message } => write!(f, "{kind}: {message}"),
            Self::Timeout { timeout_secs } => write!(f, "timed out after {timeout_secs}s"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Terminal record of one task's execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    pub duration_ms: u64,

    /// Invocation attempts consumed, including retries. Zero for skipped
    /// tasks, which are never dispatched.
    pub attempts: u32,
}

impl TaskResult {
    pub fn succeeded(
        task_id: impl Into<String>,
        data: Value,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Succeeded,
            data: Some(data),
            error: None,
            started_at: Some(started_at),
            finished_at: Some(Utc::now()),
            duration_ms,
            attempts,
        }
    }

    pub fn failed(
        task_id: impl Into<String>,
        error: &AgentError,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            data: None,
            error: Some(TaskError::Agent {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
            started_at: Some(started_at),
            finished_at: Some(Utc::now()),
            duration_ms,
            attempts,
        }
    }

    pub fn timed_out(
        task_id: impl Into<String>,
        timeout_secs: u64,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            data: None,
            error: Some(TaskError::Timeout { timeout_secs }),
            started_at: Some(started_at),
            finished_at: Some(Utc::now()),
            duration_ms,
            attempts,
        }
    }

    pub fn skipped(task_id: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Skipped,
            data: None,
            error: Some(TaskError::Skipped { reason }),
            started_at: None,
            finished_at: None,
            duration_ms: 0,
            attempts: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }
}

/// Outcome of a whole plan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every task succeeded.
    Succeeded,
    /// At least one task succeeded; others failed or were skipped.
    PartiallySucceeded,
    /// No task succeeded.
    Failed,
    /// The run was cancelled; committed results are reported as-is.
    Cancelled,
}

/// Final report of a plan run: every task's terminal status plus aggregate
/// outcome and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub run_id: String,
    pub plan_id: String,
    pub overall: OverallStatus,
    pub results: BTreeMap<String, TaskResult>,
    pub stages: Vec<Vec<String>>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ExecutionReport {
    pub fn succeeded_count(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.status == TaskStatus::Failed)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.status == TaskStatus::Skipped)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reasons_render_distinct_messages() {
        let failed = SkipReason::DependencyFailed { task: "t1".into() };
        let skipped = SkipReason::DependencySkipped { task: "t1".into() };
        let template = SkipReason::Template {
            detail: "path 'x' not found".into(),
        };
        assert_ne!(failed.to_string(), skipped.to_string());
        assert!(failed.to_string().contains("failed"));
        assert!(skipped.to_string().contains("was skipped"));
        assert!(template.to_string().contains("resolution failed"));
    }

    #[test]
    fn skipped_results_consume_no_attempts() {
        let result = TaskResult::skipped("t2", SkipReason::DependencyFailed { task: "t1".into() });
        assert_eq!(result.attempts, 0);
        assert_eq!(result.status, TaskStatus::Skipped);
        assert!(result.started_at.is_none());
    }

    #[test]
    fn statuses_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(OverallStatus::PartiallySucceeded).unwrap(),
            serde_json::json!("partially_succeeded")
        );
        assert_eq!(
            serde_json::to_value(TaskStatus::Skipped).unwrap(),
            serde_json::json!("skipped")
        );
    }
}
