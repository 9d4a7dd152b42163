//! Deployment Orchestrator - Entry point for reconciliation
//!
//! The orchestrator owns no local state. Each operation borrows the
//! [`LocalState`] loaded for the current command, mutates it in place as
//! remote ids become known, and leaves persisting it to the caller.

use crate::error::Result;
use crate::hook;
use crate::options::DeployOptions;
use crate::report::{DeployReport, Phase};
use ginger_build::{BuildPipeline, CommandCompiler, Compiler, Packager, DEFAULT_MAX_PARALLEL};
use ginger_gateway::Gateways;
use ginger_store::LocalState;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Drives every deploy phase against one set of gateways
pub struct Orchestrator {
    /// Remote control plane
    pub(crate) gateways: Gateways,
    /// Compiler used by the function phase
    pub(crate) compiler: Arc<dyn Compiler>,
    /// Wraps artifacts into uploadable archives
    pub(crate) packager: Packager,
    /// Concurrent compiles
    pub(crate) max_parallel: usize,
}

impl Orchestrator {
    pub fn new(gateways: Gateways) -> Self {
        Self {
            gateways,
            compiler: Arc::new(CommandCompiler::default()),
            packager: Packager::new(),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn Compiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn gateways(&self) -> &Gateways {
        &self.gateways
    }

    pub(crate) fn pipeline(&self, state: &LocalState) -> BuildPipeline {
        BuildPipeline::new(
            Arc::clone(&self.compiler),
            state.layout.functions_dir(),
            state.layout.build_dir(),
        )
        .with_max_parallel(self.max_parallel)
    }

    /// Run the configured pre-deploy hook, if any
    pub async fn run_hook(&self, state: &LocalState) -> Result<()> {
        match state.document.project.hook() {
            Some(command) => hook::run_hook(command, state.layout.root()).await,
            None => Ok(()),
        }
    }

    /// Hook, functions, storage, schedulers, then routing and the optional
    /// stage snapshot.
    ///
    /// Never returns an error: a hard error stops the run and is recorded on
    /// the report, entity-level failures are recorded and the run continues.
    #[instrument(skip(self, state, options), fields(project = %state.document.project.name))]
    pub async fn deploy_all(&self, state: &mut LocalState, options: &DeployOptions) -> DeployReport {
        let mut report = DeployReport::new();

        // 1. Hook, once
        if let Err(e) = self.run_hook(state).await {
            error!(error = %e, "Pre-deploy hook failed, nothing deployed");
            report.abort(Phase::Hook, e);
            return report;
        }

        // 2. Functions
        match self.deploy_functions(state, options).await {
            Ok(phase) => report.push(phase),
            Err(e) => {
                error!(phase = %Phase::Functions, error = %e, "Deploy aborted");
                report.abort(Phase::Functions, e);
                return report;
            }
        }

        // 3. Storage
        match self.deploy_storage(state).await {
            Ok(phase) => report.push(phase),
            Err(e) => {
                error!(phase = %Phase::Storage, error = %e, "Deploy aborted");
                report.abort(Phase::Storage, e);
                return report;
            }
        }

        // 4. Schedulers
        match self.deploy_schedulers(state).await {
            Ok(phase) => report.push(phase),
            Err(e) => {
                error!(phase = %Phase::Schedulers, error = %e, "Deploy aborted");
                report.abort(Phase::Schedulers, e);
                return report;
            }
        }

        // 5. Routing, then the stage snapshot
        match self.deploy_resources(state, options).await {
            Ok(phase) => report.push(phase),
            Err(e) => {
                error!(phase = %Phase::Resources, error = %e, "Deploy aborted");
                report.abort(Phase::Resources, e);
                return report;
            }
        }

        info!(status = ?report.status(), "Deploy finished");
        report
    }
}
