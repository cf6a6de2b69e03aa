use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::EngineError;
use crate::persist::HistoryReader;

use super::types::{TaskResult, TaskStatus};

/// Mutable store of settled task results for a single plan run.
///
/// One context per run; it is never shared across concurrent plan
/// executions, so intermediate results cannot leak between requests. The
/// engine is the only writer, and writes happen at stage boundaries, so
/// readers always see fully-settled results.
pub struct ExecutionContext {
    results: BTreeMap<String, TaskResult>,
    history: Option<Arc<dyn HistoryReader>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            results: BTreeMap::new(),
            history: None,
        }
    }

    pub fn with_history(history: Arc<dyn HistoryReader>) -> Self {
        Self {
            results: BTreeMap::new(),
            history: Some(history),
        }
    }

    /// Record a task's terminal result. Append-only: recording a
    /// non-terminal status or recording the same task twice violates the
    /// engine's settlement invariant.
    pub fn record(&mut self, result: TaskResult) -> Result<(), EngineError> {
        if !result.status.is_terminal() {
            return Err(EngineError::Internal(format!(
                "attempted to record non-terminal status {:?} for task '{}'",
                result.status, result.task_id
            )));
        }
        if self.results.contains_key(&result.task_id) {
            return Err(EngineError::Internal(format!(
                "task '{}' settled twice",
                result.task_id
            )));
        }
        tracing::trace!(task_id = %result.task_id, status = ?result.status, "recorded result");
        self.results.insert(result.task_id.clone(), result);
        Ok(())
    }

    pub fn result(&self, task_id: &str) -> Option<&TaskResult> {
        self.results.get(task_id)
    }

    pub fn results(&self) -> &BTreeMap<String, TaskResult> {
        &self.results
    }

    pub fn into_results(self) -> BTreeMap<String, TaskResult> {
        self.results
    }

    /// Prior-turn result for a task id outside this run, when a history
    /// collaborator was supplied.
    pub fn prior_result(&self, task_id: &str) -> Option<Value> {
        self.history.as_ref().and_then(|h| h.prior_result(task_id))
    }

    pub fn succeeded_ids(&self) -> Vec<&str> {
        self.ids_with_status(TaskStatus::Succeeded)
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.ids_with_status(TaskStatus::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.results
            .values()
            .any(|r| r.status == TaskStatus::Failed)
    }

    fn ids_with_status(&self, status: TaskStatus) -> Vec<&str> {
        self.results
            .values()
            .filter(|r| r.status == status)
            .map(|r| r.task_id.as_str())
            .collect()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::SkipReason;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn records_and_reads_back() {
        let mut ctx = ExecutionContext::new();
        ctx.record(TaskResult::succeeded("t1", json!({"n": 1}), Utc::now(), 5, 1))
            .unwrap();
        assert!(ctx.result("t1").unwrap().is_success());
        assert_eq!(ctx.succeeded_ids(), vec!["t1"]);
        assert!(!ctx.has_failures());
    }

    #[test]
    fn double_settlement_is_an_internal_error() {
        let mut ctx = ExecutionContext::new();
        ctx.record(TaskResult::skipped(
            "t1",
            SkipReason::Template {
                detail: "x".into(),
            },
        ))
        .unwrap();
        let err = ctx
            .record(TaskResult::succeeded("t1", json!(null), Utc::now(), 0, 1))
            .unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
    }

    #[test]
    fn non_terminal_status_is_rejected() {
        let mut ctx = ExecutionContext::new();
        let pending = TaskResult {
            task_id: "t1".into(),
            status: TaskStatus::Running,
            data: None,
            error: None,
            started_at: None,
            finished_at: None,
            duration_ms: 0,
            attempts: 0,
        };
        assert!(matches!(
            ctx.record(pending),
            Err(EngineError::Internal(_))
        ));
    }

    #[test]
    fn history_reader_supplies_prior_results() {
        struct OneShot;
        impl HistoryReader for OneShot {
            fn prior_result(&self, task_id: &str) -> Option<Value> {
                (task_id == "prev_1").then(|| json!({"count": 3}))
            }
        }

        let ctx = ExecutionContext::with_history(Arc::new(OneShot));
        assert_eq!(ctx.prior_result("prev_1"), Some(json!({"count": 3})));
        assert_eq!(ctx.prior_result("prev_2"), None);
    }
}
