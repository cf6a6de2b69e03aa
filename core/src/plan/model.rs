use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::path::PathExpr;

/// Reference to a prior task's output inside a parameter value.
///
/// Ingested from the reserved marker shape
/// `{ "$ref": <taskId>, "$path": <expression> }`. An absent `$path` selects
/// the referenced task's whole output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRef {
    #[serde(rename = "$ref", deserialize_with = "de_task_id")]
    pub task: String,

    #[serde(rename = "$path", default, skip_serializing_if = "PathExpr::is_empty")]
    pub path: PathExpr,
}

/// A task parameter: either a literal JSON value or a template reference.
///
/// The reference shape is tried first so that the marker object is never
/// mistaken for a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Reference(TemplateRef),
    Literal(Value),
}

impl ParamValue {
    pub fn as_reference(&self) -> Option<&TemplateRef> {
        match self {
            Self::Reference(r) => Some(r),
            Self::Literal(_) => None,
        }
    }
}

/// One unit of work against one capability provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    #[serde(deserialize_with = "de_task_id")]
    pub id: String,

    /// Which capability provider handles this task; must be registered.
    pub agent_key: String,

    /// Operation requested of that provider (read, send, list, ...).
    pub mode: String,

    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,

    /// Explicitly declared dependencies (ordering without data flow).
    /// Template references add implicit dependencies on top of these.
    #[serde(default, deserialize_with = "de_task_ids")]
    pub depends_on: Vec<String>,
}

impl TaskSpec {
    pub fn new(id: impl Into<String>, agent_key: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_key: agent_key.into(),
            mode: mode.into(),
            parameters: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_literal(self, name: impl Into<String>, value: Value) -> Self {
        self.with_param(name, ParamValue::Literal(value))
    }

    pub fn with_depends_on(mut self, dep: impl Into<String>) -> Self {
        self.depends_on.push(dep.into());
        self
    }

    /// All template references appearing in this task's parameters.
    pub fn reference_targets(&self) -> impl Iterator<Item = &TemplateRef> {
        self.parameters.values().filter_map(ParamValue::as_reference)
    }

    /// Declared dependencies plus implicit reference-derived ones,
    /// deduplicated, declaration order first.
    pub fn effective_dependencies(&self) -> Vec<String> {
        let mut deps: Vec<String> = Vec::new();
        for dep in &self.depends_on {
            if !deps.contains(dep) {
                deps.push(dep.clone());
            }
        }
        for reference in self.reference_targets() {
            if !deps.contains(&reference.task) {
                deps.push(reference.task.clone());
            }
        }
        deps
    }
}

/// An ordered collection of task specs plus plan-level metadata.
/// Immutable once validated; execution only ever writes to the context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    #[serde(default = "new_plan_id")]
    pub plan_id: String,

    /// The originating command text, when the plan producer supplies it.
    #[serde(default)]
    pub command_text: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    pub tasks: Vec<TaskSpec>,
}

fn new_plan_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Error, Debug)]
pub enum PlanParseError {
    #[error("malformed plan document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plan contains no tasks")]
    Empty,
}

impl ExecutionPlan {
    pub fn new(tasks: Vec<TaskSpec>) -> Self {
        Self {
            plan_id: new_plan_id(),
            command_text: None,
            created_at: Utc::now(),
            tasks,
        }
    }

    pub fn with_command_text(mut self, text: impl Into<String>) -> Self {
        self.command_text = Some(text.into());
        self
    }

    /// Parse a plan from its JSON ingestion format.
    pub fn from_json_str(input: &str) -> Result<Self, PlanParseError> {
        let plan: Self = serde_json::from_str(input)?;
        if plan.tasks.is_empty() {
            return Err(PlanParseError::Empty);
        }
        Ok(plan)
    }

    pub fn from_json_value(value: Value) -> Result<Self, PlanParseError> {
        let plan: Self = serde_json::from_value(value)?;
        if plan.tasks.is_empty() {
            return Err(PlanParseError::Empty);
        }
        Ok(plan)
    }

    pub fn task(&self, id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// Task ids may arrive as JSON strings or integers; both map to strings.
fn de_task_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    match raw {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "task id must be a string or integer, got {other}"
        ))),
    }
}

fn de_task_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Vec::<Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|v| match v {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "dependency id must be a string or integer, got {other}"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_ingestion_format() {
        let plan = ExecutionPlan::from_json_value(json!({
            "commandText": "email me my top repos",
            "tasks": [
                {
                    "id": "task_1",
                    "agentKey": "repo",
                    "mode": "list",
                    "parameters": {"sort": "stars"}
                },
                {
                    "id": "task_2",
                    "agentKey": "mail",
                    "mode": "send",
                    "parameters": {
                        "to": "x@y.com",
                        "body": {"$ref": "task_1", "$path": "items[0..5].*.name"}
                    },
                    "dependsOn": ["task_1"]
                }
            ]
        }))
        .unwrap();

        assert_eq!(plan.tasks.len(), 2);
        let send = plan.task("task_2").unwrap();
        assert_eq!(send.agent_key, "mail");

        let body = &send.parameters["body"];
        let reference = body.as_reference().expect("body should be a reference");
        assert_eq!(reference.task, "task_1");
        assert_eq!(reference.path.to_string(), "items[0..5].*.name");

        // A literal that happens to be an object stays a literal.
        assert!(send.parameters["to"].as_reference().is_none());
    }

    #[test]
    fn numeric_task_ids_become_strings() {
        let plan = ExecutionPlan::from_json_value(json!({
            "tasks": [
                {"id": 1, "agentKey": "a", "mode": "m"},
                {"id": 2, "agentKey": "a", "mode": "m", "dependsOn": [1],
                 "parameters": {"x": {"$ref": 1}}}
            ]
        }))
        .unwrap();
        assert_eq!(plan.tasks[0].id, "1");
        assert_eq!(plan.tasks[1].depends_on, vec!["1"]);
        assert_eq!(plan.tasks[1].effective_dependencies(), vec!["1"]);
    }

    #[test]
    fn empty_plan_is_rejected() {
        let err = ExecutionPlan::from_json_value(json!({"tasks": []})).unwrap_err();
        assert!(matches!(err, PlanParseError::Empty));
    }

    #[test]
    fn effective_dependencies_merge_explicit_and_implicit() {
        let task = TaskSpec::new("t3", "mail", "send")
            .with_depends_on("t2")
            .with_param(
                "body",
                ParamValue::Reference(TemplateRef {
                    task: "t1".into(),
                    path: PathExpr::default(),
                }),
            )
            .with_param(
                "subject",
                ParamValue::Reference(TemplateRef {
                    task: "t2".into(),
                    path: PathExpr::default(),
                }),
            );

        assert_eq!(task.effective_dependencies(), vec!["t2", "t1"]);
    }

    #[test]
    fn missing_path_selects_whole_output() {
        let value: ParamValue = serde_json::from_value(json!({"$ref": "task_1"})).unwrap();
        let reference = value.as_reference().unwrap();
        assert!(reference.path.is_empty());
    }
}
