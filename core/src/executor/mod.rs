//! Stage-based execution of validated plans.
//!
//! ```text
//! ExecutionPlan
//!   ↓
//! TaskGraph::from_plan()
//!   ↓
//! TaskGraph::stages() → Vec<Vec<String>> (mutually independent sets)
//!   ↓
//! ExecutionEngine::execute() → per-stage: resolve templates, dispatch
//!   bounded-concurrent agent calls, settle results into the context
//!   ↓
//! ExecutionReport
//! ```
//!
//! The barrier between stages is absolute: no task's parameters are resolved
//! until every task in the previous stage reached a terminal state.

mod cancel;
mod context;
mod engine;
mod graph;
mod scheduler;
mod template;
pub mod traits;
pub mod types;

pub use cancel::{CancelHandle, CancelToken};
pub use context::ExecutionContext;
pub use engine::{ExecutionEngine, ExecutionEngineBuilder};
pub use graph::TaskGraph;
pub use scheduler::run_bounded;
pub use template::{resolve_parameters, TemplateError};
pub use types::{
    ExecutionReport, OverallStatus, SkipReason, TaskError, TaskResult, TaskStatus,
};
