use serde_json::Value;
use thiserror::Error;

use crate::agent::ParamMap;
use crate::plan::{ParamValue, PathError, TaskSpec, TemplateRef};

use super::context::ExecutionContext;
use super::types::TaskStatus;

/// Failure to turn a task's declared parameters into concrete values.
///
/// Contained to the offending task (it becomes Skipped); never aborts the
/// plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("referenced task '{task}' has no successful result")]
    MissingDependency { task: String },

    #[error("task '{task}' output has no value at '{path}'")]
    PathNotFound { task: String, path: String },

    #[error("task '{task}' output at '{path}' is not the expected {expected}")]
    TypeMismatch {
        task: String,
        path: String,
        expected: &'static str,
    },
}

/// Resolve every parameter of `task` against settled results.
///
/// Pure with respect to the context: only reads, never mutates. Literals
/// pass through unchanged; template references require the referenced task
/// to have Succeeded and apply the reference's path expression to its
/// output data.
pub fn resolve_parameters(
    task: &TaskSpec,
    context: &ExecutionContext,
) -> Result<ParamMap, TemplateError> {
    let mut resolved = ParamMap::new();
    for (name, value) in &task.parameters {
        let concrete = match value {
            ParamValue::Literal(v) => v.clone(),
            ParamValue::Reference(reference) => resolve_reference(reference, context)?,
        };
        resolved.insert(name.clone(), concrete);
    }
    Ok(resolved)
}

fn resolve_reference(
    reference: &TemplateRef,
    context: &ExecutionContext,
) -> Result<Value, TemplateError> {
    let data = match context.result(&reference.task) {
        Some(result) if result.status == TaskStatus::Succeeded => {
            result.data.clone().unwrap_or(Value::Null)
        }
        Some(_) => {
            return Err(TemplateError::MissingDependency {
                task: reference.task.clone(),
            })
        }
        // Ids outside the current run fall through to conversation history.
        None => match context.prior_result(&reference.task) {
            Some(value) => value,
            None => {
                return Err(TemplateError::MissingDependency {
                    task: reference.task.clone(),
                })
            }
        },
    };

    reference.path.apply(&data).map_err(|err| match err {
        PathError::NotFound { .. } => TemplateError::PathNotFound {
            task: reference.task.clone(),
            path: reference.path.to_string(),
        },
        PathError::WrongType { expected, .. } => TemplateError::TypeMismatch {
            task: reference.task.clone(),
            path: reference.path.to_string(),
            expected,
        },
    })
}
