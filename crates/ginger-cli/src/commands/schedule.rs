//! Scheduler commands

use crate::commands::deploy;
use crate::error::{CliError, CliResult};
use crate::output::{self, confirm, print_error, print_info, print_success, OutputFormat};
use crate::session::{GlobalArgs, Session};
use clap::Subcommand;
use ginger_deploy::Phase;
use ginger_types::Scheduler;
use serde::Serialize;
use tabled::Tabled;

/// Scheduler subcommands
#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Declare a scheduled rule
    Create {
        /// Scheduler name
        #[arg(short, long)]
        name: String,

        /// Schedule expression, e.g. "rate(5 minutes)" or "cron(0 12 * * ? *)"
        #[arg(short, long)]
        expression: String,

        /// Create the rule disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Trigger a function from a scheduler
    Attach {
        /// Scheduler name
        #[arg(short, long)]
        name: String,

        /// Function name
        #[arg(short, long)]
        function: String,
    },

    /// Stop triggering a function from a scheduler
    Detach {
        /// Scheduler name
        #[arg(short, long)]
        name: String,

        /// Function name
        #[arg(short, long)]
        function: String,
    },

    /// Delete a scheduler locally and, if deployed, remotely
    Delete {
        /// Scheduler name
        #[arg(short, long)]
        name: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List schedulers
    List,
}

/// Table row for scheduler display
#[derive(Debug, Serialize, Tabled)]
struct SchedulerRow {
    name: String,
    expression: String,
    enabled: bool,
    functions: String,
    arn: String,
}

impl From<&Scheduler> for SchedulerRow {
    fn from(s: &Scheduler) -> Self {
        Self {
            name: s.name.clone(),
            expression: s.expression.clone(),
            enabled: s.enabled,
            functions: s.functions.join(", "),
            arn: s
                .remote_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Execute a scheduler command; returns the process exit code
pub async fn execute(
    command: ScheduleCommands,
    args: &GlobalArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut session = Session::load(args)?;

    match command {
        ScheduleCommands::Create {
            name,
            expression,
            disabled,
        } => {
            let mut scheduler = Scheduler::new(&name, expression);
            scheduler.enabled = !disabled;
            scheduler.validate()?;
            session.state.scheduler_dir().create(&scheduler)?;
            print_success(&format!("Scheduler {} created", name));
            Ok(0)
        }

        ScheduleCommands::Attach { name, function } => {
            let attached = session.state.attach_function(&name, &function)?;
            session.persist(format)?;
            if attached {
                print_success(&format!("{} now triggers {}", name, function));
            } else {
                print_info(&format!("{} already triggers {}", name, function));
            }
            Ok(0)
        }

        ScheduleCommands::Detach { name, function } => {
            if !session.state.detach_function(&name, &function)? {
                return Err(CliError::NotFound(format!(
                    "{} is not attached to {}",
                    function, name
                )));
            }
            session.persist(format)?;
            print_success(&format!("{} no longer triggers {}", name, function));
            Ok(0)
        }

        ScheduleCommands::Delete { name, yes } => {
            let deployed = session.state.scheduler(&name)?.remote_id.is_some();
            if !yes && !confirm(&format!("Delete scheduler {}?", name)) {
                print_error("Aborted");
                return Ok(0);
            }

            if deployed {
                let orchestrator = session.orchestrator().await?;
                let result = orchestrator
                    .delete_scheduler(&mut session.state, &name)
                    .await;
                return deploy::finish(&session, Phase::Delete, result, format);
            }

            session.state.remove_scheduler(&name);
            session.state.scheduler_dir().delete(&name)?;
            session.persist(format)?;
            print_success(&format!("Scheduler {} removed", name));
            Ok(0)
        }

        ScheduleCommands::List => {
            let rows: Vec<SchedulerRow> = session
                .state
                .schedulers
                .iter()
                .map(SchedulerRow::from)
                .collect();
            output::print_output(rows, format);
            Ok(0)
        }
    }
}
