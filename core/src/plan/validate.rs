use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::agent::AgentRegistry;

use super::model::{ExecutionPlan, TaskSpec};

/// One structural rule violation, naming the offending task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("plan contains no tasks")]
    EmptyPlan,

    #[error("duplicate task id '{task}'")]
    DuplicateTaskId { task: String },

    #[error("task '{task}': unknown agent '{agent_key}'")]
    UnknownAgent { task: String, agent_key: String },

    #[error("task '{task}': agent '{agent_key}' does not support mode '{mode}'")]
    UnsupportedMode {
        task: String,
        agent_key: String,
        mode: String,
    },

    #[error("task '{task}': missing required parameter '{parameter}' for {agent_key}.{mode}")]
    MissingRequiredParameter {
        task: String,
        agent_key: String,
        mode: String,
        parameter: String,
    },

    #[error("task '{task}': depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("task '{task}': template reference targets unknown task '{target}'")]
    UnknownReferenceTarget { task: String, target: String },

    #[error("task '{task}' references itself")]
    SelfReference { task: String },

    #[error("dependency cycle: {path}")]
    DependencyCycle { path: String },
}

/// The plan is structurally invalid; execution is refused entirely.
#[derive(Error, Debug)]
#[error("plan failed validation with {} violation(s)", violations.len())]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

/// Check a plan's structural integrity against the agent registry.
///
/// Checks run in order: (a) id uniqueness; (b) agent/mode existence and
/// required parameters; (c) reference target resolvability; (d) acyclicity
/// of the induced dependency graph (explicit `dependsOn` plus implicit
/// reference-derived edges). All violations are collected, not just the
/// first.
pub fn validate(plan: &ExecutionPlan, registry: &AgentRegistry) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    // Ingestion rejects empty documents; plans built in code go through
    // here, so a run can never report success over zero tasks.
    if plan.tasks.is_empty() {
        violations.push(Violation::EmptyPlan);
    }

    // (a) id uniqueness
    let mut seen = HashSet::new();
    for task in &plan.tasks {
        if !seen.insert(task.id.as_str()) {
            violations.push(Violation::DuplicateTaskId {
                task: task.id.clone(),
            });
        }
    }
    let known_ids: HashSet<&str> = seen;

    for task in &plan.tasks {
        // (b) agent/mode pair exists; required parameters present
        match registry.capability(&task.agent_key) {
            None => violations.push(Violation::UnknownAgent {
                task: task.id.clone(),
                agent_key: task.agent_key.clone(),
            }),
            Some(capability) if !capability.supports(&task.mode) => {
                violations.push(Violation::UnsupportedMode {
                    task: task.id.clone(),
                    agent_key: task.agent_key.clone(),
                    mode: task.mode.clone(),
                });
            }
            Some(_) => {
                if let Some(spec) = registry.mode_spec(&task.agent_key, &task.mode) {
                    for parameter in &spec.required {
                        if !task.parameters.contains_key(parameter) {
                            violations.push(Violation::MissingRequiredParameter {
                                task: task.id.clone(),
                                agent_key: task.agent_key.clone(),
                                mode: task.mode.clone(),
                                parameter: parameter.clone(),
                            });
                        }
                    }
                }
            }
        }

        // (c) dependency and reference targets resolve within the plan
        for dep in &task.depends_on {
            if dep == &task.id {
                violations.push(Violation::SelfReference {
                    task: task.id.clone(),
                });
            } else if !known_ids.contains(dep.as_str()) {
                violations.push(Violation::UnknownDependency {
                    task: task.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        for reference in task.reference_targets() {
            if reference.task == task.id {
                violations.push(Violation::SelfReference {
                    task: task.id.clone(),
                });
            } else if !known_ids.contains(reference.task.as_str()) {
                violations.push(Violation::UnknownReferenceTarget {
                    task: task.id.clone(),
                    target: reference.task.clone(),
                });
            }
        }
    }

    // (d) the induced dependency graph is a DAG
    if let Some(path) = find_cycle(&plan.tasks) {
        violations.push(Violation::DependencyCycle { path });
    }

    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(count = violations.len(), "plan rejected by validator");
        Err(ValidationError { violations })
    }
}

/// Depth-first traversal with a recursion-stack membership check; any
/// back-edge to a node currently on the stack signals a cycle. Edges to
/// unknown tasks are skipped here (reported separately above).
fn find_cycle(tasks: &[TaskSpec]) -> Option<String> {
    let by_id: HashMap<&str, &TaskSpec> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();

    for task in tasks {
        if !visited.contains(task.id.as_str())
            && dfs(task.id.as_str(), &by_id, &mut visited, &mut stack)
        {
            return Some(stack.join(" -> "));
        }
    }
    None
}

fn dfs<'a>(
    node: &'a str,
    by_id: &HashMap<&'a str, &'a TaskSpec>,
    visited: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
) -> bool {
    visited.insert(node);
    stack.push(node);

    if let Some(task) = by_id.get(node) {
        for dep in task.effective_dependencies() {
            let Some((&dep_key, _)) = by_id.get_key_value(dep.as_str()) else {
                continue;
            };
            if let Some(pos) = stack.iter().position(|n| *n == dep_key) {
                stack.push(dep_key);
                *stack = stack[pos..].to_vec();
                return true;
            }
            if !visited.contains(dep_key) && dfs(dep_key, by_id, visited, stack) {
                return true;
            }
        }
    }

    stack.pop();
    false
}
