//! Function commands

use crate::commands::deploy;
use crate::error::{CliError, CliResult};
use crate::output::{self, confirm, print_error, print_info, print_success, OutputFormat};
use crate::session::{GlobalArgs, Session};
use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use colored::*;
use ginger_build::{render_handler, BuildReport};
use ginger_deploy::{LogTailer, Phase};
use ginger_types::function::validate_name;
use ginger_types::{EventSource, Function};
use serde::Serialize;
use tabled::Tabled;
use tokio::sync::watch;

/// Function subcommands
#[derive(Subcommand)]
pub enum FunctionCommands {
    /// Declare a function and scaffold its handler
    Create {
        /// Function name
        #[arg(short, long)]
        name: String,

        /// Memory in MB (at least 128, a multiple of 64)
        #[arg(short, long, default_value = "128")]
        memory: u32,

        /// Timeout in seconds
        #[arg(short, long, default_value = "3")]
        timeout: u32,

        /// Event source the handler is generated for
        /// (default, apigateway, s3, cloudwatch, sqs, kinesis)
        #[arg(short, long, default_value = "default")]
        event: EventSource,

        /// Execution role (defaults to the project role)
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Delete a function locally and, if deployed, remotely
    Delete {
        /// Function name
        #[arg(short, long)]
        name: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List declared functions
    List,

    /// Compile functions locally without deploying them
    Build {
        /// Only this function (default: all)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Invoke a deployed function and print its response
    Invoke {
        /// Function name
        #[arg(short, long)]
        name: String,

        /// Event payload as JSON, or @path to read it from a file
        #[arg(short, long)]
        payload: Option<String>,
    },

    /// Tail a function's logs until interrupted
    Log {
        /// Function name
        #[arg(short, long)]
        name: String,

        /// Provider-side filter pattern
        #[arg(short, long)]
        filter: Option<String>,

        /// Start this many minutes in the past
        #[arg(short, long, default_value = "5")]
        since: i64,
    },
}

/// Table row for function display
#[derive(Debug, Serialize, Tabled)]
struct FunctionRow {
    name: String,
    memory: u32,
    timeout: u32,
    event: String,
    role: String,
    arn: String,
}

impl From<&Function> for FunctionRow {
    fn from(f: &Function) -> Self {
        Self {
            name: f.name.clone(),
            memory: f.memory_size,
            timeout: f.timeout,
            event: f.event_source.to_string(),
            role: f.role.clone().unwrap_or_else(|| "(default)".to_string()),
            arn: f
                .remote_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Table row for one function's build outcome
#[derive(Debug, Serialize, Tabled)]
struct BuildRow {
    function: String,
    status: String,
    detail: String,
}

impl BuildRow {
    fn rows(report: &BuildReport) -> Vec<Self> {
        let built = report.artifacts.iter().map(|(name, path)| Self {
            function: name.clone(),
            status: "built".to_string(),
            detail: path.display().to_string(),
        });
        let failed = report.failures.iter().map(|(name, e)| Self {
            function: name.clone(),
            status: "failed".to_string(),
            detail: e.to_string(),
        });
        let mut rows: Vec<Self> = built.chain(failed).collect();
        rows.sort_by(|a, b| a.function.cmp(&b.function));
        rows
    }
}

/// Payload bytes from `--payload`: inline JSON, or `@path` to a file
fn read_payload(raw: Option<&str>) -> CliResult<Vec<u8>> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => match raw.strip_prefix('@') {
            Some(path) => std::fs::read(path).map_err(|e| {
                CliError::InvalidInput(format!("cannot read payload file {}: {}", path, e))
            }),
            None => Ok(raw.as_bytes().to_vec()),
        },
    }
}

/// Execute a function command; returns the process exit code
pub async fn execute(
    command: FunctionCommands,
    args: &GlobalArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut session = Session::load(args)?;

    match command {
        FunctionCommands::Create {
            name,
            memory,
            timeout,
            event,
            role,
        } => {
            validate_name("function name", &name)?;
            let mut function = Function::new(&name)
                .with_memory_size(memory)
                .with_timeout(timeout)
                .with_event_source(event);
            if let Some(role) = role {
                function = function.with_role(role);
            }
            session.state.document.add_function(function)?;

            let dir = session.state.layout.function_dir(&name);
            let handler = dir.join("main.go");
            if handler.exists() {
                print_info(&format!("Keeping existing {}", handler.display()));
            } else {
                std::fs::create_dir_all(&dir)?;
                std::fs::write(&handler, render_handler(&name, event))?;
            }

            session.persist(format)?;
            print_success(&format!("Function {} created", name));
            Ok(0)
        }

        FunctionCommands::Delete { name, yes } => {
            let deployed = session.state.document.function(&name)?.is_deployed();
            if !yes && !confirm(&format!("Delete function {}?", name)) {
                print_error("Aborted");
                return Ok(0);
            }

            if deployed {
                let orchestrator = session.orchestrator().await?;
                let result = orchestrator
                    .delete_function(&mut session.state, &name)
                    .await;
                let removed = result.is_ok();
                let code = deploy::finish(&session, Phase::Delete, result, format)?;
                if removed {
                    remove_sources(&session, &name)?;
                }
                return Ok(code);
            }

            session.state.document.remove_function(&name)?;
            for scheduler in &mut session.state.schedulers {
                scheduler.detach(&name);
            }
            session.persist(format)?;
            remove_sources(&session, &name)?;
            print_success(&format!("Function {} removed", name));
            Ok(0)
        }

        FunctionCommands::List => {
            let rows: Vec<FunctionRow> = session
                .state
                .document
                .functions
                .iter()
                .map(FunctionRow::from)
                .collect();
            output::print_output(rows, format);
            Ok(0)
        }

        FunctionCommands::Build { name } => {
            let orchestrator = session.local_orchestrator();
            let pb = output::spinner("Building functions...");
            let result = orchestrator
                .build_functions(&session.state, name.as_deref())
                .await;
            pb.finish_and_clear();
            let report = result?;

            output::print_output(BuildRow::rows(&report), format);
            if report.is_complete() {
                print_success(&format!("{} function(s) built", report.artifacts.len()));
                Ok(0)
            } else {
                print_error(&format!("{} function(s) failed to build", report.failures.len()));
                Ok(1)
            }
        }

        FunctionCommands::Invoke { name, payload } => {
            let payload = read_payload(payload.as_deref())?;
            let orchestrator = session.orchestrator().await?;
            let invocation = orchestrator
                .invoke_function(&session.state, &name, payload)
                .await?;

            println!("{}", String::from_utf8_lossy(&invocation.payload));
            match invocation.function_error {
                Some(error) => {
                    print_error(&format!("{} raised {}", name, error));
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        FunctionCommands::Log {
            name,
            filter,
            since,
        } => {
            let window = Duration::try_minutes(since)
                .filter(|d| *d >= Duration::zero())
                .ok_or_else(|| {
                    CliError::InvalidInput(format!("--since {} is out of range", since))
                })?;
            session.state.document.function(&name)?;
            let gateways = session.gateways().await?;
            let start = (Utc::now() - window).timestamp_millis();

            let (cancel_tx, cancel_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = cancel_tx.send(true);
                }
            });

            print_info(&format!("Tailing {} (Ctrl-C to stop)", name));
            let delivered = LogTailer::new(gateways.logs)
                .tail(&name, filter.as_deref(), start, cancel_rx, |event| {
                    let time = DateTime::<Utc>::from_timestamp_millis(event.timestamp)
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
                        .unwrap_or_else(|| event.timestamp.to_string());
                    println!("{} {}", time.dimmed(), event.message.trim_end());
                })
                .await?;
            print_info(&format!("{} event(s) shown", delivered));
            Ok(0)
        }
    }
}

/// Remove `functions/<name>/`; offline rehearsals leave sources alone
fn remove_sources(session: &Session, name: &str) -> CliResult<()> {
    if session.is_offline() {
        return Ok(());
    }
    let dir = session.state.layout.function_dir(name);
    if dir.is_dir() {
        std::fs::remove_dir_all(&dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_payload_inline_and_from_file() {
        assert!(read_payload(None).unwrap().is_empty());
        assert_eq!(read_payload(Some(r#"{"a":1}"#)).unwrap(), br#"{"a":1}"#.to_vec());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, b"{\"b\":2}").unwrap();
        let arg = format!("@{}", path.display());
        assert_eq!(read_payload(Some(&arg)).unwrap(), b"{\"b\":2}".to_vec());

        let missing = format!("@{}", dir.path().join("nope.json").display());
        assert!(matches!(
            read_payload(Some(&missing)),
            Err(CliError::InvalidInput(_))
        ));
    }
}
