use std::path::Path;

use maestro_core::config::AppConfig;

use super::cli::ValidateArgs;
use crate::CliError;

pub fn validate(
    fixtures: Option<&Path>,
    args: ValidateArgs,
    cfg: &AppConfig,
) -> Result<i32, CliError> {
    let plan = super::read_plan(&args.input)?;
    let registry = super::build_registry(fixtures, cfg)?;

    match maestro_core::plan::validate(&plan, &registry) {
        Ok(()) => {
            println!("plan {} ok ({} tasks)", plan.plan_id, plan.tasks.len());
            Ok(0)
        }
        Err(err) => {
            for violation in &err.violations {
                eprintln!("{violation}");
            }
            Ok(12)
        }
    }
}
