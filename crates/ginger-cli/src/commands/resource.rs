//! Resource commands

use crate::commands::deploy;
use crate::error::{CliError, CliResult};
use crate::output::{self, print_error, print_success, OutputFormat, PromptConfirm};
use crate::session::{GlobalArgs, Session};
use clap::Subcommand;
use ginger_deploy::{DeployError, DeployOptions, Phase};
use ginger_types::{path, Resource};
use serde::Serialize;
use tabled::Tabled;

/// Resource subcommands
#[derive(Subcommand)]
pub enum ResourceCommands {
    /// Declare a routable path
    Create {
        /// Resource path, e.g. /users/{id}
        #[arg(short, long)]
        path: String,
    },

    /// Delete a path and everything under it
    Delete {
        /// Resource path
        #[arg(short, long)]
        path: String,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// List declared resources
    List {
        /// Include paths discovered during deploy
        #[arg(short, long)]
        all: bool,
    },

    /// Deploy the routing tree
    Deploy {
        /// Snapshot the tree into this stage afterwards
        #[arg(short, long)]
        stage: Option<String>,

        /// Description attached to the stage snapshot
        #[arg(short, long)]
        message: Option<String>,
    },
}

/// Table row for resource display
#[derive(Debug, Serialize, Tabled)]
struct ResourceRow {
    path: String,
    id: String,
    origin: String,
    integrations: String,
}

impl From<&Resource> for ResourceRow {
    fn from(r: &Resource) -> Self {
        let integrations = r
            .integrations
            .iter()
            .map(|(method, integration)| format!("{} {}", method, integration.target()))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            path: r.path.clone(),
            id: r
                .remote_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            origin: if r.user_defined { "declared" } else { "discovered" }.to_string(),
            integrations,
        }
    }
}

/// Execute a resource command; returns the process exit code
pub async fn execute(
    command: ResourceCommands,
    args: &GlobalArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut session = Session::load(args)?;

    match command {
        ResourceCommands::Create { path: raw } => {
            let normalized = path::normalize(&raw);
            let resources = &mut session.state.document.resources;
            match resources.find_mut(&normalized) {
                Ok(existing) if existing.user_defined => {
                    return Err(CliError::InvalidInput(format!(
                        "Resource {} is already defined",
                        normalized
                    )));
                }
                Ok(existing) => existing.user_defined = true,
                Err(_) => {
                    resources.insert(Resource::new(&normalized))?;
                }
            }
            session.persist(format)?;
            print_success(&format!("Resource {} defined", normalized));
            Ok(0)
        }

        ResourceCommands::Delete { path: raw, force } => {
            let orchestrator = session.orchestrator().await?;
            let result = orchestrator
                .delete_resource(&mut session.state, &raw, force, &PromptConfirm)
                .await;
            match result {
                Err(DeployError::Cancelled) => {
                    print_error("Aborted");
                    Ok(0)
                }
                other => deploy::finish(&session, Phase::Delete, other, format),
            }
        }

        ResourceCommands::List { all } => {
            let rows: Vec<ResourceRow> = session
                .state
                .document
                .resources
                .iter()
                .filter(|r| all || r.user_defined)
                .map(ResourceRow::from)
                .collect();
            output::print_output(rows, format);
            Ok(0)
        }

        ResourceCommands::Deploy { stage, message } => {
            let options = DeployOptions {
                stage,
                message,
                ..DeployOptions::default()
            };
            let orchestrator = session.orchestrator().await?;
            if let Some(code) = deploy::hook_or_abort(&orchestrator, &session, format).await {
                return Ok(code);
            }

            let pb = output::spinner("Deploying resources...");
            let result = orchestrator
                .deploy_resources(&mut session.state, &options)
                .await;
            pb.finish_and_clear();
            deploy::finish(&session, Phase::Resources, result, format)
        }
    }
}
