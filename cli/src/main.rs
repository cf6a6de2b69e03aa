use clap::Parser;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::cli;
use maestro_core::config::{self, AppConfig, LoggingConfig};
use maestro_core::error::EngineError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = match &args.config {
        Some(path) => config::load_from_path(path),
        None => config::load_default(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    dispatch(args, cfg).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 11: config error
    // 12: invalid plan
    // 13: run finished with failures (returned as a normal exit code)
    // 14: run cancelled (normal exit code)
    // 20: IO error
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::InvalidPlan(_) => 12,
        CliError::Io(_) => 20,
        CliError::Serialize(_) => 50,
        CliError::Engine(engine) => match engine {
            EngineError::Validation(_) | EngineError::Graph(_) => 12,
            EngineError::Internal(_) => 50,
        },
        CliError::Other(_) => 50,
    }
}

async fn dispatch(args: cli::Args, cfg: AppConfig) -> Result<i32, CliError> {
    let fixtures = args.fixtures.clone();
    match args.command {
        cli::Commands::Run(run_args) => {
            commands::run::run(fixtures.as_deref(), run_args, &cfg).await
        }
        cli::Commands::Validate(validate_args) => {
            commands::validate::validate(fixtures.as_deref(), validate_args, &cfg)
        }
        cli::Commands::Plan(plan_args) => {
            commands::plan::plan(fixtures.as_deref(), plan_args, &cfg)
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled || !logging.console {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
