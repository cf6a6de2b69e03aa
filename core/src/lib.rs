//! maestro-core: plan validation, dependency scheduling, and agent task
//! execution.
//!
//! The crate turns a structured execution plan (produced elsewhere by an
//! intent parser) into an ordered, parallelized series of calls against
//! registered capability providers, threading output data from earlier
//! tasks into the parameters of later ones.
//!
//! ```text
//! ExecutionPlan (JSON ingestion)
//!   ↓
//! plan::validate() → structural checks, cycle detection
//!   ↓
//! executor::TaskGraph::stages() → Vec<Vec<String>> (execution stages)
//!   ↓
//! executor::ExecutionEngine::execute() → ExecutionReport
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod executor;
pub mod persist;
pub mod plan;

pub use error::{EngineError, GraphError};
pub use executor::{ExecutionEngine, ExecutionReport};
pub use plan::ExecutionPlan;
