//! Stage commands
//!
//! Stages are plain definition files. `deploy resource --stage <name>`
//! snapshots the routing tree into one.

use crate::commands::deploy;
use crate::error::{CliError, CliResult};
use crate::output::{self, confirm, print_error, print_success, OutputFormat};
use crate::session::{GlobalArgs, Session};
use clap::Subcommand;
use ginger_deploy::Phase;
use ginger_types::function::validate_name;
use ginger_types::Stage;
use serde::Serialize;
use tabled::Tabled;

/// Stage subcommands
#[derive(Subcommand)]
pub enum StageCommands {
    /// Create a stage definition
    Create {
        /// Stage name
        #[arg(short, long)]
        name: String,

        /// Stage variable as KEY=VALUE (repeatable)
        #[arg(long = "var", value_parser = parse_variable)]
        variables: Vec<(String, String)>,
    },

    /// Delete a stage definition and, if deployed, the remote stage
    Delete {
        /// Stage name
        #[arg(short, long)]
        name: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List stage definitions
    List,
}

/// Table row for stage display
#[derive(Debug, Serialize, Tabled)]
struct StageRow {
    name: String,
    variables: String,
}

impl From<Stage> for StageRow {
    fn from(stage: Stage) -> Self {
        let variables = stage
            .variables
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            name: stage.name,
            variables,
        }
    }
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

/// Execute a stage command; returns the process exit code
pub async fn execute(
    command: StageCommands,
    args: &GlobalArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut session = Session::load(args)?;
    let stages = session.state.stage_dir();

    match command {
        StageCommands::Create { name, variables } => {
            validate_name("stage name", &name)?;
            let mut stage = Stage::new(&name);
            stage.variables.extend(variables);
            stages.create(&stage)?;
            print_success(&format!("Stage {} created", name));
        }

        StageCommands::Delete { name, yes } => {
            if !stages.exists(&name) {
                return Err(CliError::NotFound(format!("stage {}", name)));
            }
            if !yes && !confirm(&format!("Delete stage {}?", name)) {
                print_error("Aborted");
                return Ok(0);
            }

            let orchestrator = if session.state.document.project.api_id.is_some() {
                session.orchestrator().await?
            } else {
                session.local_orchestrator()
            };
            let result = orchestrator.delete_stage(&session.state, &name).await;
            return deploy::finish(&session, Phase::Delete, result, format);
        }

        StageCommands::List => {
            let rows: Vec<StageRow> = stages
                .load_all()?
                .into_iter()
                .map(StageRow::from)
                .collect();
            output::print_output(rows, format);
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variable() {
        assert_eq!(
            parse_variable("LOG_LEVEL=debug").unwrap(),
            ("LOG_LEVEL".to_string(), "debug".to_string())
        );
        assert_eq!(
            parse_variable("URL=a=b").unwrap(),
            ("URL".to_string(), "a=b".to_string())
        );
        assert!(parse_variable("novalue").is_err());
        assert!(parse_variable("=x").is_err());
    }
}
