pub mod cli;
pub mod plan;
pub mod run;
pub mod validate;

use std::io::Read;
use std::path::Path;

use maestro_core::agent::AgentRegistry;
use maestro_core::config::AppConfig;
use maestro_core::plan::ExecutionPlan;
use maestro_plugins::factory;

use crate::CliError;

pub fn read_plan(input: &cli::PlanInput) -> Result<ExecutionPlan, CliError> {
    let raw = if input.plan == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&input.plan)?
    };
    ExecutionPlan::from_json_str(&raw).map_err(|e| CliError::InvalidPlan(e.to_string()))
}

pub fn build_registry(
    fixtures: Option<&Path>,
    cfg: &AppConfig,
) -> Result<AgentRegistry, CliError> {
    if let Some(dir) = fixtures {
        return Ok(factory::load_fixture_dir(dir)?);
    }
    if !cfg.agents.is_empty() {
        return Ok(factory::build_registry(cfg)?);
    }
    Err(CliError::Config(
        "no agents configured: pass --fixtures or add [[agents]] to maestro.toml".to_string(),
    ))
}
