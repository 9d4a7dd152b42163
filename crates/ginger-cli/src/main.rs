//! Ginger CLI - Serverless deployments from a local project
//!
//! This CLI lets developers:
//! - Scaffold a project and its functions
//! - Declare routes, integrations, schedulers and stages locally
//! - Converge the provider towards the local declaration with `deploy`
//! - Tail function logs
//!
//! Exit status: 0 when everything converged, 1 on a hard error, 2 when a
//! deploy finished with per-entity failures.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;
mod session;

use commands::{deploy, function, init, integrate, resource, schedule, stage};
use output::print_error;
use session::GlobalArgs;

/// Ginger CLI application
#[derive(Parser)]
#[command(name = "ginger")]
#[command(about = "Ginger - Serverless application deployment CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Project directory (defaults to the nearest directory containing Ginger.toml)
    #[arg(short = 'C', long, env = "GINGER_PROJECT")]
    project: Option<PathBuf>,

    /// Provider credentials profile
    #[arg(long, env = "GINGER_PROFILE")]
    profile: Option<String>,

    /// Provider region
    #[arg(long, env = "GINGER_REGION")]
    region: Option<String>,

    /// Rehearse against an in-memory cloud; local state is not written
    #[arg(long)]
    offline: bool,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Create a new project in the current (or -C) directory
    Init(init::InitArgs),

    /// Manage routable resources
    Resource {
        #[command(subcommand)]
        command: resource::ResourceCommands,
    },

    /// Bind resources to functions or storage
    Integrate {
        #[command(subcommand)]
        command: integrate::IntegrateCommands,
    },

    /// Manage functions
    Function {
        #[command(subcommand)]
        command: function::FunctionCommands,
    },

    /// Manage scheduled rules
    #[command(alias = "scheduler")]
    Schedule {
        #[command(subcommand)]
        command: schedule::ScheduleCommands,
    },

    /// Manage stages
    Stage {
        #[command(subcommand)]
        command: stage::StageCommands,
    },

    /// Deploy local state to the provider
    Deploy {
        #[command(subcommand)]
        command: deploy::DeployCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            print_error(&format!("{:#}", e));
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let args = GlobalArgs {
        project: cli.project,
        profile: cli.profile,
        region: cli.region,
        offline: cli.offline,
    };
    let format = cli.output;

    let code = match cli.command {
        Commands::Init(init_args) => {
            init::execute(init_args, &args)?;
            0
        }
        Commands::Resource { command } => resource::execute(command, &args, format).await?,
        Commands::Integrate { command } => integrate::execute(command, &args, format).await?,
        Commands::Function { command } => function::execute(command, &args, format).await?,
        Commands::Schedule { command } => schedule::execute(command, &args, format).await?,
        Commands::Stage { command } => stage::execute(command, &args, format).await?,
        Commands::Deploy { command } => deploy::execute(command, &args, format).await?,
    };
    Ok(code)
}
