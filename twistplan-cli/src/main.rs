//! twistplan CLI - plan generation, validation, and reporting.
//!
//! # Usage
//!
//! ```bash
//! # Run the planning driver against the configured vision model
//! twistplan plan --task "Tighten Bolt"
//!
//! # Offline validation of an existing plan file
//! twistplan validate results/Tighten_Bolt__raw.json --objects objects \
//!     --object wrench --object bolt
//!
//! # Before/after comparison of a validated task
//! twistplan report "Tighten Bolt"
//!
//! # World-frame twist analysis of a validated plan
//! twistplan transform "Tighten Bolt"
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use twistplan::config::Config;

#[derive(Parser)]
#[command(name = "twistplan")]
#[command(version)]
#[command(about = "Manipulation plan validation and planning driver", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a plan with the vision model and validate it
    Plan(commands::plan::PlanArgs),

    /// Validate an existing plan file offline
    Validate(commands::validate::ValidateArgs),

    /// Compare a task's raw and validated plans
    Report(commands::report::ReportArgs),

    /// Map a validated plan's twists into the world frame
    Transform(commands::transform::TransformArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let config = Config::load_or_default(cli.config.as_deref())?;
    tracing::debug!(
        "configuration loaded (results dir: {})",
        config.paths.results_dir.display()
    );

    match cli.command {
        Commands::Plan(args) => commands::plan::execute(&config, args).await,
        Commands::Validate(args) => commands::validate::execute(&config, args),
        Commands::Report(args) => commands::report::execute(&config, args),
        Commands::Transform(args) => commands::transform::execute(&config, args),
    }
}
