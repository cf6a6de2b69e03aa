use thiserror::Error;

pub use crate::plan::validate::{ValidationError, Violation};

/// Errors raised while building or layering the task dependency graph.
///
/// Validation runs the same checks up front, so hitting one of these after a
/// plan passed [`crate::plan::validate`] means an engine invariant broke.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("dependency not found: task '{task_id}' depends on '{missing_dep}'")]
    DependencyNotFound {
        task_id: String,
        missing_dep: String,
    },

    #[error("circular dependency detected: {0}")]
    Cycle(String),
}

/// Top-level error type for a plan execution run.
///
/// Per-task failures (agent errors, template resolution errors) are never
/// surfaced here; they are contained in the [`crate::executor::TaskResult`]
/// of the offending task and its downstream dependents. Only structural
/// rejection before the run and internal invariant violations abort a run.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Scheduler invariant violation. The only error class that aborts an
    /// in-progress plan: results past this point cannot be trusted.
    #[error("engine internal error: {0}")]
    Internal(String),
}
