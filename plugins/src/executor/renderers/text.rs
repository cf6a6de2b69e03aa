use maestro_core::executor::traits::{OutputRenderer, RenderEvent};
use maestro_core::executor::{OverallStatus, TaskStatus};

pub struct TextRenderer {
    ascii_only: bool,
}

impl TextRenderer {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn status_word(&self, status: TaskStatus) -> &'static str {
        match (status, self.ascii_only) {
            (TaskStatus::Succeeded, true) => "OK",
            (TaskStatus::Succeeded, false) => "SUCCESS",
            (TaskStatus::Failed, true) => "FAIL",
            (TaskStatus::Failed, false) => "FAILED",
            (TaskStatus::Skipped, true) => "SKIP",
            (TaskStatus::Skipped, false) => "SKIPPED",
            // non-terminal statuses never reach a renderer
            _ => "PENDING",
        }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::RunStart {
                run_id,
                plan_id,
                total_tasks,
                total_stages,
            } => format!(
                "RUN START {} (plan {}, tasks: {}, stages: {})",
                run_id, plan_id, total_tasks, total_stages
            ),
            RenderEvent::Plan { run_id, stages } => {
                let mut out = format!("PLAN {}:", run_id);
                for (idx, stage) in stages.iter().enumerate() {
                    out.push_str(&format!("\n  stage {}: {}", idx, stage.join(", ")));
                }
                out
            }
            RenderEvent::StageStart {
                run_id,
                stage_id,
                task_ids,
            } => format!(
                "STAGE START {} (stage {}, tasks: {})",
                run_id,
                stage_id,
                task_ids.len()
            ),
            RenderEvent::TaskStart {
                run_id,
                stage_id,
                task_id,
                agent_key,
                mode,
            } => format!(
                "TASK START {} (stage {}, task {}, {}.{})",
                run_id, stage_id, task_id, agent_key, mode
            ),
            RenderEvent::TaskSettled {
                run_id,
                stage_id,
                result,
            } => {
                let mut line = format!(
                    "TASK END {} (stage {}, task {}, status {}, duration {}ms, attempts {})",
                    run_id,
                    stage_id,
                    result.task_id,
                    self.status_word(result.status),
                    result.duration_ms,
                    result.attempts
                );
                if let Some(error) = &result.error {
                    line.push_str(&format!(": {}", error));
                }
                line
            }
            RenderEvent::StageEnd { run_id, stage_id } => {
                format!("STAGE END {} (stage {})", run_id, stage_id)
            }
            RenderEvent::RunEnd { run_id, report } => format!(
                "RUN END {} ({}, ok {}, failed {}, skipped {}, duration {}ms)",
                run_id,
                overall_word(report.overall),
                report.succeeded_count(),
                report.failed_count(),
                report.skipped_count(),
                report.duration_ms
            ),
        }
    }
}

fn overall_word(overall: OverallStatus) -> &'static str {
    match overall {
        OverallStatus::Succeeded => "succeeded",
        OverallStatus::PartiallySucceeded => "partially succeeded",
        OverallStatus::Failed => "failed",
        OverallStatus::Cancelled => "cancelled",
    }
}

impl OutputRenderer for TextRenderer {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn render(&self, event: &RenderEvent) {
        println!("{}", self.format_event(event));
    }
}
