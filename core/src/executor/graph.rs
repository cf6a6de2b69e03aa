use std::collections::HashMap;

use crate::error::GraphError;
use crate::plan::{ExecutionPlan, TaskSpec};

/// Task dependency graph (DAG) over a plan's effective dependencies
/// (declared `dependsOn` plus implicit template-reference edges).
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: HashMap<String, TaskSpec>,

    /// task_id -> its dependencies
    edges: HashMap<String, Vec<String>>,

    /// task_id -> tasks that depend on it
    reverse_edges: HashMap<String, Vec<String>>,

    /// Original declaration order, for stable stage output.
    order_index: HashMap<String, usize>,
}

impl TaskGraph {
    pub fn from_plan(plan: &ExecutionPlan) -> Result<Self, GraphError> {
        let mut nodes = HashMap::new();
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut order_index = HashMap::new();

        for (position, task) in plan.tasks.iter().enumerate() {
            if nodes.contains_key(&task.id) {
                return Err(GraphError::DuplicateTaskId(task.id.clone()));
            }

            let dependencies = task.effective_dependencies();
            for dep in &dependencies {
                reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id.clone());
            }

            edges.insert(task.id.clone(), dependencies);
            order_index.insert(task.id.clone(), position);
            nodes.insert(task.id.clone(), task.clone());
        }

        for (task_id, dependencies) in &edges {
            for dep in dependencies {
                if !nodes.contains_key(dep) {
                    return Err(GraphError::DependencyNotFound {
                        task_id: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
        }

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            order_index,
        })
    }

    pub fn node(&self, task_id: &str) -> Option<&TaskSpec> {
        self.nodes.get(task_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn dependencies(&self, task_id: &str) -> &[String] {
        self.edges.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Topological layering (Kahn's algorithm variant).
    ///
    /// Each returned stage is a set of task ids with no edges between them
    /// and all dependencies satisfied by strictly earlier stages. Tasks
    /// within a stage are ordered by original declaration order, making the
    /// partition deterministic.
    pub fn stages(&self) -> Result<Vec<Vec<String>>, GraphError> {
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .keys()
            .map(|id| (id.as_str(), 0))
            .collect();

        for (task_id, dependencies) in &self.edges {
            if let Some(degree) = in_degree.get_mut(task_id.as_str()) {
                *degree += dependencies.len();
            }
        }

        let mut current: Vec<String> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(id, _)| id.to_string())
            .collect();
        self.sort_by_declaration(&mut current);

        let mut stages = Vec::new();
        let mut processed = 0;

        while !current.is_empty() {
            processed += current.len();

            let mut next = Vec::new();
            for task_id in &current {
                if let Some(dependents) = self.reverse_edges.get(task_id) {
                    for dependent in dependents {
                        let Some(degree) = in_degree.get_mut(dependent.as_str()) else {
                            continue;
                        };
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(dependent.clone());
                        }
                    }
                }
            }
            self.sort_by_declaration(&mut next);

            stages.push(std::mem::replace(&mut current, next));
        }

        // Validation already rejected cycles; an incomplete layering here
        // means the graph changed underneath us.
        if processed != self.nodes.len() {
            return Err(GraphError::Cycle(
                "unable to complete topological layering".to_string(),
            ));
        }

        Ok(stages)
    }

    fn sort_by_declaration(&self, task_ids: &mut [String]) {
        task_ids.sort_by_key(|id| self.order_index.get(id).copied().unwrap_or(usize::MAX));
    }
}
