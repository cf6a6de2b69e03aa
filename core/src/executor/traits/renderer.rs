use crate::executor::types::{ExecutionReport, TaskResult};

/// Presentation seam: the engine emits events, a renderer decides how they
/// look. Without a renderer the engine stays quiet apart from tracing.
pub trait OutputRenderer: Send + Sync {
    fn name(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Progress events emitted over the course of one run.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        plan_id: String,
        total_tasks: usize,
        total_stages: usize,
    },
    Plan {
        run_id: String,
        stages: Vec<Vec<String>>,
    },
    StageStart {
        run_id: String,
        stage_id: usize,
        task_ids: Vec<String>,
    },
    TaskStart {
        run_id: String,
        stage_id: usize,
        task_id: String,
        agent_key: String,
        mode: String,
    },
    /// A task reached a terminal state (Succeeded, Failed, or Skipped).
    TaskSettled {
        run_id: String,
        stage_id: usize,
        result: TaskResult,
    },
    StageEnd {
        run_id: String,
        stage_id: usize,
    },
    RunEnd {
        run_id: String,
        report: ExecutionReport,
    },
}
