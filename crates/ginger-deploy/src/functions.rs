//! Function phase

use crate::error::{DeployError, Result};
use crate::options::DeployOptions;
use crate::orchestrator::Orchestrator;
use crate::report::{EntityKind, Outcome, Phase, PhaseReport};
use ginger_build::BuildReport;
use ginger_gateway::{unqualified_arn, FunctionSpec, GatewayError, Invocation};
use ginger_store::LocalState;
use ginger_types::{Function, RemoteId};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

impl Orchestrator {
    /// Build, package and upload functions.
    ///
    /// Validation runs over every targeted function before anything is
    /// built. Missing roles, build failures and upload failures only fail
    /// the function concerned.
    #[instrument(skip(self, state, options), fields(only = ?options.function))]
    pub async fn deploy_functions(
        &self,
        state: &mut LocalState,
        options: &DeployOptions,
    ) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(Phase::Functions);

        // 1. Select and validate
        let targets: Vec<Function> = match &options.function {
            Some(name) => vec![state.document.function(name)?.clone()],
            None => state.document.functions.clone(),
        };
        if targets.is_empty() {
            info!("No functions to deploy");
            return Ok(report);
        }
        for function in &targets {
            function.validate()?;
        }

        // 2. Resolve execution roles
        let project = state.document.project.clone();
        let mut roles = HashMap::new();
        let mut buildable = Vec::with_capacity(targets.len());
        for function in targets {
            match function.effective_role(project.default_role.as_deref()) {
                Ok(role) => {
                    roles.insert(function.name.clone(), role);
                    buildable.push(function);
                }
                Err(e) => {
                    warn!(function = %function.name, error = %e, "Skipping function");
                    report.fail(EntityKind::Function, &function.name, e);
                }
            }
        }

        // 3. Build
        let build = self.pipeline(state).build(&buildable).await;

        // 4. Package and upload whatever built
        for function in &buildable {
            let name = function.name.as_str();
            if let Some(e) = build.failures.get(name) {
                report.fail(EntityKind::Function, name, format!("build failed: {}", e));
                continue;
            }
            let Some(artifact) = build.artifact(name) else {
                report.fail(EntityKind::Function, name, "build produced no artifact");
                continue;
            };

            let archive = match self.packager.package(name, artifact) {
                Ok(archive) => archive,
                Err(e) => {
                    report.fail(EntityKind::Function, name, format!("packaging failed: {}", e));
                    continue;
                }
            };

            let role = roles.remove(name).unwrap_or_default();
            let spec = FunctionSpec::from_function(function, role, &project.runtime);
            match self.upsert_function(function, &spec, archive).await {
                Ok((arn, outcome)) => {
                    info!(function = %name, arn = %arn, outcome = outcome.label(), "Function converged");
                    state.document.function_mut(name)?.remote_id = Some(arn);
                    report.record(EntityKind::Function, name, outcome);
                }
                Err(e) => {
                    warn!(function = %name, error = %e, "Function upload failed");
                    report.fail(EntityKind::Function, name, e);
                }
            }
        }

        Ok(report)
    }

    /// Compile functions without packaging or uploading them.
    ///
    /// Build failures land on the returned report, not in the error.
    #[instrument(skip(self, state))]
    pub async fn build_functions(
        &self,
        state: &LocalState,
        only: Option<&str>,
    ) -> Result<BuildReport> {
        let targets: Vec<Function> = match only {
            Some(name) => vec![state.document.function(name)?.clone()],
            None => state.document.functions.clone(),
        };
        for function in &targets {
            function.validate()?;
        }

        let build = self.pipeline(state).build(&targets).await;
        if build.is_complete() {
            info!(built = build.artifacts.len(), "Build complete");
        } else {
            warn!(
                built = build.artifacts.len(),
                failed = build.failures.len(),
                "Build finished with failures"
            );
        }
        Ok(build)
    }

    /// Invoke a deployed function once and return its response
    #[instrument(skip(self, state, payload), fields(bytes = payload.len()))]
    pub async fn invoke_function(
        &self,
        state: &LocalState,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<Invocation> {
        state.document.function(name)?;
        let invocation = self
            .gateways
            .compute
            .invoke(name, payload)
            .await
            .map_err(|e| DeployError::remote(format!("function {}", name), e))?;
        if let Some(error) = &invocation.function_error {
            warn!(function = %name, error = %error, "Function returned an error");
        }
        Ok(invocation)
    }

    /// Update when the function is known to exist, otherwise create.
    ///
    /// A recorded arn whose function vanished remotely is recreated.
    async fn upsert_function(
        &self,
        function: &Function,
        spec: &FunctionSpec,
        archive: Vec<u8>,
    ) -> std::result::Result<(RemoteId, Outcome), GatewayError> {
        let compute = &self.gateways.compute;
        let exists = match function.remote_id {
            Some(_) => true,
            None => compute.lookup(&function.name).await?.is_some(),
        };

        if exists {
            match compute.update(spec, archive.clone()).await {
                Ok(arn) => return Ok((arn, Outcome::Updated)),
                Err(e) if e.is_not_found() && function.remote_id.is_some() => {
                    warn!(function = %function.name, "Recorded function is gone remotely, recreating");
                }
                Err(e) => return Err(e),
            }
        }

        let arn = compute.create(spec, archive).await?;
        Ok((arn, Outcome::Created))
    }

    /// Unqualified arn of a project function: the recorded one, else a live
    /// lookup.
    ///
    /// The error is the reason the dependent entity fails.
    pub(crate) async fn function_arn(
        &self,
        state: &LocalState,
        name: &str,
    ) -> std::result::Result<RemoteId, String> {
        let function = state
            .document
            .function(name)
            .map_err(|_| format!("function '{}' is not defined in this project", name))?;
        if let Some(arn) = &function.remote_id {
            return Ok(RemoteId::from(unqualified_arn(arn.as_str())));
        }
        match self.gateways.compute.lookup(name).await {
            Ok(Some(arn)) => Ok(RemoteId::from(unqualified_arn(arn.as_str()))),
            Ok(None) => Err(format!("function '{}' is not deployed", name)),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Delete a function remotely and locally, detaching it from schedulers.
    ///
    /// A function already gone remotely is only removed locally.
    #[instrument(skip(self, state))]
    pub async fn delete_function(&self, state: &mut LocalState, name: &str) -> Result<PhaseReport> {
        state.document.function(name)?;
        let mut report = PhaseReport::new(Phase::Delete);

        match self.gateways.compute.delete(name).await {
            Ok(()) => info!(function = %name, "Function deleted remotely"),
            Err(e) if e.is_not_found() => {
                warn!(function = %name, "Function not found remotely, removing local record only");
            }
            Err(e) => return Err(DeployError::remote(format!("function {}", name), e)),
        }

        state.document.remove_function(name)?;
        for scheduler in &mut state.schedulers {
            if scheduler.detach(name) {
                info!(function = %name, scheduler = %scheduler.name, "Detached from scheduler");
            }
        }
        report.record(EntityKind::Function, name, Outcome::Deleted);
        Ok(report)
    }
}
