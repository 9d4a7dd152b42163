//! Integration commands
//!
//! Bindings are recorded locally; `deploy resource` wires them remotely.
//! Removing a binding also unwires a deployed route.

use crate::commands::deploy;
use crate::error::CliResult;
use crate::output::{confirm, print_error, print_success, OutputFormat};
use crate::session::{GlobalArgs, Session};
use clap::Subcommand;
use ginger_deploy::Phase;
use ginger_types::{path, HttpMethod, Integration};

/// Integration subcommands
#[derive(Subcommand)]
pub enum IntegrateCommands {
    /// Route a path to a function through a catch-all proxy
    Function {
        /// Resource path
        #[arg(short, long)]
        path: String,

        /// Function name
        #[arg(short, long)]
        name: String,

        /// HTTP method (ANY, GET, POST, ...)
        #[arg(short, long, default_value = "ANY")]
        method: HttpMethod,

        /// Replace an existing binding without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Serve a path straight from the storage bucket
    Storage {
        /// Resource path
        #[arg(short, long)]
        path: String,

        /// Bucket (defaults to the project bucket)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Key prefix inside the bucket
        #[arg(long, default_value = "")]
        prefix: String,

        /// Replace an existing binding without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a binding, unwiring it remotely when deployed
    Remove {
        /// Resource path
        #[arg(short, long)]
        path: String,

        /// HTTP method
        #[arg(short, long)]
        method: HttpMethod,
    },
}

/// Execute an integration command; returns the process exit code
pub async fn execute(
    command: IntegrateCommands,
    args: &GlobalArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut session = Session::load(args)?;

    match command {
        IntegrateCommands::Function {
            path: raw,
            name,
            method,
            force,
        } => {
            session.state.document.function(&name)?;
            let integration = Integration::function(name);
            if !bind(&mut session, &raw, method, integration, force)? {
                return Ok(0);
            }
        }

        IntegrateCommands::Storage {
            path: raw,
            bucket,
            prefix,
            force,
        } => {
            let bucket = bucket.unwrap_or_else(|| session.state.document.project.bucket_name());
            let integration = Integration::storage(bucket, prefix);
            if !bind(&mut session, &raw, HttpMethod::Get, integration, force)? {
                return Ok(0);
            }
        }

        IntegrateCommands::Remove { path: raw, method } => {
            let deployed = session.state.document.project.api_id.is_some()
                && session.state.document.resources.remote_id(&raw).is_some();
            let orchestrator = if deployed {
                session.orchestrator().await?
            } else {
                session.local_orchestrator()
            };
            let result = orchestrator
                .remove_integration(&mut session.state, &raw, method)
                .await;
            return deploy::finish(&session, Phase::Delete, result, format);
        }
    }

    session.persist(format)?;
    Ok(0)
}

/// How a new binding relates to whatever the method is bound to already
#[derive(Debug, PartialEq, Eq)]
enum Rebind {
    Fresh,
    /// Same target: the recorded binding, proxy id included, is kept
    Unchanged,
    /// Different target: replacing it needs confirmation
    Conflict,
}

fn rebind(existing: Option<&Integration>, integration: &Integration) -> Rebind {
    match existing {
        None => Rebind::Fresh,
        Some(existing) if existing.target() == integration.target() => Rebind::Unchanged,
        Some(_) => Rebind::Conflict,
    }
}

/// Record `integration` on the resource at `raw`; returns false when the
/// operator declined to replace an existing binding
fn bind(
    session: &mut Session,
    raw: &str,
    method: HttpMethod,
    integration: Integration,
    force: bool,
) -> CliResult<bool> {
    let normalized = path::normalize(raw);
    let resource = session.state.document.resources.find_mut(&normalized)?;

    let existing = resource.integration(method);
    match rebind(existing, &integration) {
        Rebind::Fresh => {}
        Rebind::Unchanged => {
            print_success(&format!(
                "{} {} already bound to {}",
                method,
                normalized,
                integration.target()
            ));
            return Ok(false);
        }
        Rebind::Conflict => {
            let current = existing.map(Integration::target).unwrap_or_default();
            let prompt = format!(
                "{} {} is bound to {}. Replace it with {}?",
                method,
                normalized,
                current,
                integration.target()
            );
            if !force && !confirm(&prompt) {
                print_error("Aborted");
                return Ok(false);
            }
        }
    }

    let target = integration.target();
    resource.add_integration(method, integration);
    print_success(&format!("{} {} bound to {}", method, normalized, target));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ginger_types::RemoteId;

    #[test]
    fn test_rebinding_same_function_keeps_recorded_proxy() {
        let deployed = Integration::Function {
            function: "hello".to_string(),
            proxy_resource_id: Some(RemoteId::new("res-000007")),
        };

        assert_eq!(rebind(None, &Integration::function("hello")), Rebind::Fresh);
        assert_eq!(
            rebind(Some(&deployed), &Integration::function("hello")),
            Rebind::Unchanged
        );
        assert_eq!(
            rebind(Some(&deployed), &Integration::function("other")),
            Rebind::Conflict
        );
        assert_eq!(
            rebind(Some(&deployed), &Integration::storage("hello", "")),
            Rebind::Conflict
        );
        assert_eq!(
            rebind(
                Some(&Integration::storage("bucket", "/assets/")),
                &Integration::storage("bucket", "assets")
            ),
            Rebind::Unchanged
        );
    }
}
