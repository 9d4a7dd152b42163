//! Deploy commands

use crate::error::CliResult;
use crate::output::{self, OutputFormat};
use crate::session::{GlobalArgs, Session};
use clap::Subcommand;
use ginger_deploy::{DeployOptions, DeployReport, Orchestrator, Phase, PhaseReport};
use tracing::{info, warn};

/// Deploy subcommands
#[derive(Subcommand)]
pub enum DeployCommands {
    /// Build and deploy functions
    Function {
        /// Deploy only this function
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Deploy the routing tree and its integrations
    Resource {
        /// Snapshot the tree into this stage afterwards
        #[arg(short, long)]
        stage: Option<String>,

        /// Description attached to the stage snapshot
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Upload the storage directory to the project bucket
    Storage,

    /// Deploy scheduled rules and their targets
    #[command(alias = "scheduler")]
    Schedule,

    /// Run every phase in order
    All {
        /// Snapshot the routing tree into this stage at the end
        #[arg(short, long)]
        stage: Option<String>,

        /// Description attached to the stage snapshot
        #[arg(short, long)]
        message: Option<String>,
    },
}

/// Execute a deploy command; returns the process exit code
pub async fn execute(
    command: DeployCommands,
    args: &GlobalArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut session = Session::load(args)?;
    let orchestrator = session.orchestrator().await?;
    info!(
        project = %session.state.document.project.name,
        region = %session.region(),
        offline = session.is_offline(),
        "Starting deploy"
    );

    // deploy_all runs the hook itself
    if !matches!(command, DeployCommands::All { .. }) {
        if let Some(code) = hook_or_abort(&orchestrator, &session, format).await {
            return Ok(code);
        }
    }

    let (phase, result) = match command {
        DeployCommands::Function { name } => {
            let options = DeployOptions {
                function: name,
                ..DeployOptions::default()
            };
            let pb = output::spinner("Building and deploying functions...");
            let result = orchestrator
                .deploy_functions(&mut session.state, &options)
                .await;
            pb.finish_and_clear();
            (Phase::Functions, result)
        }
        DeployCommands::Resource { stage, message } => {
            let options = DeployOptions {
                stage,
                message,
                ..DeployOptions::default()
            };
            let pb = output::spinner("Deploying resources...");
            let result = orchestrator
                .deploy_resources(&mut session.state, &options)
                .await;
            pb.finish_and_clear();
            (Phase::Resources, result)
        }
        DeployCommands::Storage => {
            let pb = output::spinner("Uploading storage...");
            let result = orchestrator.deploy_storage(&session.state).await;
            pb.finish_and_clear();
            (Phase::Storage, result)
        }
        DeployCommands::Schedule => {
            let pb = output::spinner("Deploying schedulers...");
            let result = orchestrator.deploy_schedulers(&mut session.state).await;
            pb.finish_and_clear();
            (Phase::Schedulers, result)
        }
        DeployCommands::All { stage, message } => {
            let options = DeployOptions {
                stage,
                message,
                ..DeployOptions::default()
            };
            let pb = output::spinner("Deploying project...");
            let report = orchestrator.deploy_all(&mut session.state, &options).await;
            pb.finish_and_clear();
            return conclude(&session, report, format);
        }
    };

    finish(&session, phase, result, format)
}

/// Run the pre-deploy hook; on failure print the aborted report and return
/// the exit code to stop with
pub(crate) async fn hook_or_abort(
    orchestrator: &Orchestrator,
    session: &Session,
    format: OutputFormat,
) -> Option<i32> {
    match orchestrator.run_hook(&session.state).await {
        Ok(()) => None,
        Err(e) => {
            let mut report = DeployReport::new();
            report.abort(Phase::Hook, e);
            output::print_report(&report, format);
            Some(report.status().exit_code())
        }
    }
}

/// Turn a single-phase result into a report, then persist and print it
pub(crate) fn finish(
    session: &Session,
    phase: Phase,
    result: ginger_deploy::Result<PhaseReport>,
    format: OutputFormat,
) -> CliResult<i32> {
    let report = match result {
        Ok(phase_report) => DeployReport::from(phase_report),
        Err(e) => {
            let mut report = DeployReport::new();
            report.abort(phase, e);
            report
        }
    };
    conclude(session, report, format)
}

/// Persist whatever converged, even when the run failed part way
fn conclude(session: &Session, report: DeployReport, format: OutputFormat) -> CliResult<i32> {
    if let Err(e) = session.persist(format) {
        warn!(error = %e, "Failed to persist local state");
        output::print_report(&report, format);
        return Err(e);
    }
    output::print_report(&report, format);
    Ok(report.status().exit_code())
}
