use std::path::Path;
use std::sync::Arc;

use maestro_core::config::AppConfig;
use maestro_core::executor::{CancelHandle, ExecutionEngine, OverallStatus};
use maestro_core::persist::ReportSink;
use maestro_plugins::factory;
use maestro_plugins::sinks::JsonlReportSink;

use super::cli::RunArgs;
use crate::CliError;

pub async fn run(fixtures: Option<&Path>, args: RunArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let plan = super::read_plan(&args.input)?;
    let registry = Arc::new(super::build_registry(fixtures, cfg)?);

    let mut exec_cfg = cfg.executor.clone();
    if let Some(max_parallel) = args.max_parallel {
        exec_cfg.max_in_flight = max_parallel;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        exec_cfg.task_timeout_secs = timeout_secs;
    }

    let renderer = factory::build_renderer(args.format.as_str(), args.ascii);
    let mut builder = ExecutionEngine::builder(registry)
        .config(exec_cfg.clone())
        .renderer(renderer);
    if let Some(strategy) = factory::build_retry_strategy(&exec_cfg.retry) {
        builder = builder.retry_strategy(strategy);
    }
    let sink: Option<Arc<dyn ReportSink>> = match &args.report {
        Some(path) => Some(Arc::new(JsonlReportSink::new(path.clone()))),
        None => factory::build_report_sink(cfg),
    };
    if let Some(sink) = sink {
        builder = builder.report_sink(sink);
    }
    let engine = builder.build();

    let (handle, token) = CancelHandle::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received; cancelling after the current stage");
            handle.cancel();
        }
    });

    let report = engine.execute_with_cancel(&plan, token).await?;
    Ok(match report.overall {
        OverallStatus::Succeeded => 0,
        OverallStatus::PartiallySucceeded | OverallStatus::Failed => 13,
        OverallStatus::Cancelled => 14,
    })
}
