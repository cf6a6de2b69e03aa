//! Plan model and structural validation.
//!
//! Plans are ingested as loosely-typed JSON and parsed into a strongly
//! typed representation at the boundary; anything that does not conform is
//! rejected before it reaches the scheduler.

pub mod model;
pub mod path;
pub mod validate;

pub use model::{ExecutionPlan, ParamValue, PlanParseError, TaskSpec, TemplateRef};
pub use path::{PathError, PathExpr, PathParseError};
pub use validate::{validate, ValidationError, Violation};
