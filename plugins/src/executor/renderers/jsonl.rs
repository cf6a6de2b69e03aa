use chrono::Local;
use maestro_core::executor::traits::{OutputRenderer, RenderEvent};
use serde_json::{json, Value};

pub struct JsonlRenderer {
    pretty_print: bool,
}

impl JsonlRenderer {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                plan_id,
                total_tasks,
                total_stages,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "plan_id": plan_id,
                "metadata": {
                    "total_tasks": total_tasks,
                    "total_stages": total_stages,
                }
            }),
            RenderEvent::Plan { run_id, stages } => {
                let total_tasks: usize = stages.iter().map(|s| s.len()).sum();
                json!({
                    "v": 1,
                    "event_type": "executor.plan",
                    "ts": ts,
                    "run_id": run_id,
                    "metadata": {
                        "stages": stages,
                        "total_tasks": total_tasks,
                    }
                })
            }
            RenderEvent::StageStart {
                run_id,
                stage_id,
                task_ids,
            } => json!({
                "v": 1,
                "event_type": "stage.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "stage_id": stage_id,
                    "tasks": task_ids,
                }
            }),
            RenderEvent::TaskStart {
                run_id,
                stage_id,
                task_id,
                agent_key,
                mode,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "stage_id": stage_id,
                    "agent_key": agent_key,
                    "mode": mode,
                }
            }),
            RenderEvent::TaskSettled {
                run_id,
                stage_id,
                result,
            } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": result.task_id,
                "status": result.status,
                "metadata": {
                    "stage_id": stage_id,
                    "duration_ms": result.duration_ms,
                    "attempts": result.attempts,
                    "error": result.error,
                }
            }),
            RenderEvent::StageEnd { run_id, stage_id } => json!({
                "v": 1,
                "event_type": "stage.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "stage_id": stage_id,
                }
            }),
            RenderEvent::RunEnd { run_id, report } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "plan_id": report.plan_id,
                "overall": report.overall,
                "metadata": {
                    "succeeded": report.succeeded_count(),
                    "failed": report.failed_count(),
                    "skipped": report.skipped_count(),
                    "duration_ms": report.duration_ms,
                }
            }),
        }
    }
}

impl OutputRenderer for JsonlRenderer {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into())
            );
        } else {
            println!(
                "{}",
                serde_json::to_string(&value).unwrap_or_else(|_| "{}".into())
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maestro_core::executor::TaskResult;
    use serde_json::json;

    #[test]
    fn run_start_event_type() {
        let renderer = JsonlRenderer::new(false);
        let event = RenderEvent::RunStart {
            run_id: "run".to_string(),
            plan_id: "plan".to_string(),
            total_tasks: 2,
            total_stages: 1,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "run.start");
        assert_eq!(value["metadata"]["total_tasks"], 2);
    }

    #[test]
    fn settled_task_carries_status_and_attempts() {
        let renderer = JsonlRenderer::new(false);
        let event = RenderEvent::TaskSettled {
            run_id: "run".to_string(),
            stage_id: 0,
            result: TaskResult::succeeded("t1", json!({"ok": true}), Utc::now(), 12, 2),
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "task.end");
        assert_eq!(value["status"], "succeeded");
        assert_eq!(value["metadata"]["attempts"], 2);
    }
}
