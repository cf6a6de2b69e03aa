use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "maestro",
    about = "Dependency-aware execution of multi-agent task plans",
    version
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file; defaults to ./maestro.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of scripted-agent fixture files; overrides the config's
    /// [[agents]] entries.
    #[arg(long, global = true)]
    pub fixtures: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanInput {
    /// Plan JSON file, or '-' for stdin.
    #[arg(long, default_value = "-")]
    pub plan: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: PlanInput,

    /// Cap on concurrent agent calls within one stage.
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Per-task timeout override in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// ASCII-only status words in text output.
    #[arg(long, default_value_t = false)]
    pub ascii: bool,

    /// Append the final report to this JSONL file.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: PlanInput,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: PlanInput,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a plan against the registered agents.
    Run(RunArgs),
    /// Check a plan without executing anything.
    Validate(ValidateArgs),
    /// Show the stage layering a plan would execute with.
    Plan(PlanArgs),
}
