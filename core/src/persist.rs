//! External persistence and conversation-history seams.
//!
//! The core writes one execution report per run through [`ReportSink`] and
//! never depends on the sink's success. [`HistoryReader`] supplies prior-turn
//! results as read-only input; intra-plan references never need it.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::executor::ExecutionReport;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink error: {0}")]
    Other(String),
}

/// Where completed (or cancelled) runs are recorded.
///
/// Called once per run; a failure here is logged by the engine and never
/// alters the execution result already computed.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn save_report(&self, plan_id: &str, report: &ExecutionReport) -> Result<(), SinkError>;
}

/// Read-only access to results from previous turns of a conversation.
///
/// Extension point for plans whose producer referenced earlier runs; the
/// validator still requires intra-plan reference targets, so this is only
/// consulted for ids outside the current plan.
pub trait HistoryReader: Send + Sync {
    fn prior_result(&self, task_id: &str) -> Option<Value>;
}
