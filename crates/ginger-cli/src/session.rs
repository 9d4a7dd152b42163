//! Per-invocation context
//!
//! Loads local state once, resolves the effective region and profile, and
//! hands out gateways. Offline sessions run against an in-memory cloud and
//! never write remote ids back to disk.

use crate::error::CliResult;
use crate::output::{self, print_info, OutputFormat};
use ginger_deploy::Orchestrator;
use ginger_gateway::{CallRecord, Gateways, InMemoryCloud};
use ginger_store::{LocalState, ProjectLayout, StateWriter};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;
use tracing::debug;

/// Account reported by the offline cloud
const OFFLINE_ACCOUNT: &str = "000000000000";

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub project: Option<PathBuf>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub offline: bool,
}

impl GlobalArgs {
    /// Directory commands start from
    pub fn start_dir(&self) -> CliResult<PathBuf> {
        match &self.project {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

pub struct Session {
    pub state: LocalState,
    region: String,
    profile: Option<String>,
    offline: Option<Arc<InMemoryCloud>>,
    touched_remote: bool,
}

impl Session {
    pub fn load(args: &GlobalArgs) -> CliResult<Self> {
        let layout = ProjectLayout::discover(&args.start_dir()?)?;
        let state = LocalState::load(layout)?;

        let project = &state.document.project;
        let region = args.region.clone().unwrap_or_else(|| project.region.clone());
        let profile = args.profile.clone().or_else(|| project.profile.clone());
        let offline = args
            .offline
            .then(|| Arc::new(InMemoryCloud::with_identity(region.clone(), OFFLINE_ACCOUNT)));
        debug!(
            root = %state.layout.root().display(),
            region = %region,
            profile = ?profile,
            offline = args.offline,
            "Session loaded"
        );

        Ok(Self {
            state,
            region,
            profile,
            offline,
            touched_remote: false,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn is_offline(&self) -> bool {
        self.offline.is_some()
    }

    pub async fn gateways(&mut self) -> CliResult<Gateways> {
        self.touched_remote = true;
        if let Some(cloud) = &self.offline {
            return Ok(Gateways::in_memory(Arc::clone(cloud)));
        }
        self.connect().await
    }

    #[cfg(feature = "aws")]
    async fn connect(&self) -> CliResult<Gateways> {
        Ok(ginger_gateway::aws::connect(&self.region, self.profile.as_deref()).await)
    }

    #[cfg(not(feature = "aws"))]
    async fn connect(&self) -> CliResult<Gateways> {
        Err(crate::error::CliError::Config(format!(
            "no provider backend compiled in (region {}, profile {}); rebuild with `--features aws` or pass --offline",
            self.region,
            self.profile.as_deref().unwrap_or("default")
        )))
    }

    pub async fn orchestrator(&mut self) -> CliResult<Orchestrator> {
        Ok(Orchestrator::new(self.gateways().await?))
    }

    /// Orchestrator for work that never leaves the machine, such as builds.
    ///
    /// Its gateways point at a throwaway in-memory cloud.
    pub fn local_orchestrator(&self) -> Orchestrator {
        Orchestrator::new(Gateways::in_memory(Arc::new(InMemoryCloud::new())))
    }

    /// Write local state back, unless this was an offline rehearsal that
    /// touched the (fake) remote side
    pub fn persist(&self, format: OutputFormat) -> CliResult<()> {
        if let (Some(cloud), true) = (&self.offline, self.touched_remote) {
            print_journal(cloud.calls(), format);
            print_info("Offline rehearsal: local state left untouched");
            return Ok(());
        }
        StateWriter::new().persist(&self.state)?;
        Ok(())
    }
}

/// Table row for one journaled call
#[derive(Debug, Serialize, Tabled)]
struct CallRow {
    service: String,
    operation: String,
    target: String,
}

impl From<CallRecord> for CallRow {
    fn from(call: CallRecord) -> Self {
        Self {
            service: call.service.to_string(),
            operation: call.operation.to_string(),
            target: call.target,
        }
    }
}

fn print_journal(calls: Vec<CallRecord>, format: OutputFormat) {
    print_info(&format!("Offline rehearsal issued {} call(s)", calls.len()));
    output::print_output(calls.into_iter().map(CallRow::from).collect(), format);
}
