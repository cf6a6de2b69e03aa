use std::path::Path;

use serde_json::json;

use maestro_core::config::AppConfig;
use maestro_core::error::EngineError;
use maestro_core::executor::TaskGraph;

use super::cli::{OutputFormat, PlanArgs};
use crate::CliError;

pub fn plan(fixtures: Option<&Path>, args: PlanArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let plan = super::read_plan(&args.input)?;
    let registry = super::build_registry(fixtures, cfg)?;
    maestro_core::plan::validate(&plan, &registry)
        .map_err(|e| CliError::InvalidPlan(e.to_string()))?;

    let graph = TaskGraph::from_plan(&plan).map_err(EngineError::from)?;
    let stages = graph.stages().map_err(EngineError::from)?;

    match args.format {
        OutputFormat::Text => {
            println!("plan {} ({} tasks, {} stages)", plan.plan_id, plan.tasks.len(), stages.len());
            for (idx, stage) in stages.iter().enumerate() {
                println!("  stage {}: {}", idx, stage.join(", "));
            }
        }
        OutputFormat::Jsonl => {
            let line = serde_json::to_string(&json!({
                "plan_id": plan.plan_id,
                "stages": stages,
            }))?;
            println!("{line}");
        }
    }
    Ok(0)
}
