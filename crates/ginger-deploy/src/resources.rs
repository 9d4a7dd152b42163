//! Routing phase
//!
//! Resources are visited parents first. A resource with a recorded id is
//! checked remotely: confirmed absence clears the id and recreates it, an
//! inconclusive check fails it (and everything below it) without creating
//! anything. Creation walks the ancestor chain and adopts whatever already
//! exists.

use crate::confirm::Confirmation;
use crate::error::{DeployError, Result};
use crate::options::DeployOptions;
use crate::orchestrator::Orchestrator;
use crate::report::{EntityKind, Outcome, Phase, PhaseReport};
use ginger_gateway::{InvokeGrant, Wiring};
use ginger_store::{LocalState, StoreError};
use ginger_types::path::{self, ROOT};
use ginger_types::resource::PROXY_SEGMENT;
use ginger_types::{HttpMethod, Integration, RemoteId};
use tracing::{debug, info, instrument, warn};

/// Reason an entity failed, carried into the report
type EntityResult<T> = std::result::Result<T, String>;

impl Orchestrator {
    /// Converge the routing tree, wire integrations, then snapshot the
    /// requested stage.
    ///
    /// An empty store makes no remote calls at all.
    #[instrument(skip(self, state, options), fields(resources = state.document.resources.len()))]
    pub async fn deploy_resources(
        &self,
        state: &mut LocalState,
        options: &DeployOptions,
    ) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(Phase::Resources);
        if state.document.resources.is_empty() {
            info!("No resources to deploy");
            if let Some(stage) = &options.stage {
                report.record(
                    EntityKind::Stage,
                    stage,
                    Outcome::Skipped("no resources defined".into()),
                );
            }
            return Ok(report);
        }

        // 1. Container
        let container = self.ensure_container(state, &mut report).await?;

        // 2. Root
        self.adopt_root(state, &container, &mut report).await?;

        // 3. Resources, parents first
        state.document.resources.sort_by_depth();
        let mut failed: Vec<String> = Vec::new();
        for resource_path in state.document.resources.paths_by_depth() {
            if path::is_root(&resource_path) {
                continue;
            }
            let failed_ancestor = path::prefixes(&resource_path)
                .into_iter()
                .find(|prefix| failed.contains(prefix));
            if let Some(ancestor) = failed_ancestor {
                report.record(
                    EntityKind::Resource,
                    &resource_path,
                    Outcome::Skipped(format!("ancestor {} failed", ancestor)),
                );
                failed.push(resource_path);
                continue;
            }

            match self.reconcile_resource(state, &container, &resource_path).await {
                Ok(outcome) => {
                    debug!(path = %resource_path, outcome = outcome.label(), "Resource converged");
                    report.record(EntityKind::Resource, &resource_path, outcome);
                }
                Err(reason) => {
                    warn!(path = %resource_path, reason = %reason, "Resource failed");
                    report.fail(EntityKind::Resource, &resource_path, reason);
                    failed.push(resource_path);
                }
            }
        }

        // 4. Integrations
        self.wire_integrations(state, &container, &failed, &mut report)
            .await;

        // 5. Stage snapshot
        if let Some(stage) = &options.stage {
            match self
                .deploy_stage(state, stage, options.message.as_deref())
                .await
            {
                Ok(_) => report.record(EntityKind::Stage, stage, Outcome::Created),
                Err(e) => {
                    warn!(stage = %stage, error = %e, "Stage deployment failed");
                    report.fail(EntityKind::Stage, stage, e);
                }
            }
        }

        info!(
            container = %container,
            failed = report.failures().count(),
            "Routing converged"
        );
        Ok(report)
    }

    /// Recorded container if it still exists, else a new one.
    ///
    /// Replacing a vanished container invalidates every recorded resource id.
    async fn ensure_container(
        &self,
        state: &mut LocalState,
        report: &mut PhaseReport,
    ) -> Result<RemoteId> {
        let routing = &self.gateways.routing;

        if let Some(id) = state.document.project.api_id.clone() {
            match routing.container_exists(&id).await {
                Ok(true) => {
                    report.record(EntityKind::Container, id.as_str(), Outcome::Unchanged);
                    return Ok(id);
                }
                Ok(false) => {
                    warn!(container = %id, "Recorded routing container is gone, creating a new one");
                    state.document.resources.clear_remote_ids();
                }
                Err(e) => return Err(DeployError::remote(format!("container {}", id), e)),
            }
        }

        let name = state.document.project.name.clone();
        let id = routing
            .create_container(&name)
            .await
            .map_err(|e| DeployError::remote(format!("container {}", name), e))?;
        info!(container = %id, "Routing container created");
        state.document.project.api_id = Some(id.clone());
        report.record(EntityKind::Container, id.as_str(), Outcome::Created);
        Ok(id)
    }

    /// The provider creates the root with the container; record its id
    async fn adopt_root(
        &self,
        state: &mut LocalState,
        container: &RemoteId,
        report: &mut PhaseReport,
    ) -> Result<()> {
        let routing = &self.gateways.routing;

        if let Some(id) = state.document.resources.remote_id(ROOT).cloned() {
            match routing.resource_exists(container, &id).await {
                Ok(true) => {
                    report.record(EntityKind::Resource, ROOT, Outcome::Unchanged);
                    return Ok(());
                }
                Ok(false) => warn!(id = %id, "Recorded root resource is gone, rediscovering"),
                Err(e) => return Err(DeployError::remote("resource /", e)),
            }
        }

        let root = routing
            .list_resources(container)
            .await
            .map_err(|e| DeployError::remote("resource /", e))?
            .into_iter()
            .find(|r| path::is_root(&r.path))
            .ok_or_else(|| DeployError::MissingRoot(container.to_string()))?;
        state.document.resources.record_remote_id(ROOT, root.id);
        report.record(EntityKind::Resource, ROOT, Outcome::Adopted);
        Ok(())
    }

    async fn reconcile_resource(
        &self,
        state: &mut LocalState,
        container: &RemoteId,
        resource_path: &str,
    ) -> EntityResult<Outcome> {
        if let Some(id) = state.document.resources.remote_id(resource_path).cloned() {
            match self.gateways.routing.resource_exists(container, &id).await {
                Ok(true) => return Ok(Outcome::Unchanged),
                Ok(false) => {
                    warn!(path = %resource_path, id = %id, "Resource is gone remotely, recreating");
                    forget_remote_ids(state, resource_path);
                }
                Err(e) => return Err(format!("could not verify remote state: {}", e)),
            }
        }
        self.ensure_path(state, container, resource_path).await
    }

    /// Create every missing prefix of `resource_path`, adopting prefixes that
    /// already exist remotely. Returns the outcome for the path itself.
    async fn ensure_path(
        &self,
        state: &mut LocalState,
        container: &RemoteId,
        resource_path: &str,
    ) -> EntityResult<Outcome> {
        let mut outcome = Outcome::Unchanged;
        let prefixes = path::prefixes(resource_path);

        for pair in prefixes.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            if state.document.resources.remote_id(child).is_some() {
                continue;
            }
            let parent_id = state
                .document
                .resources
                .remote_id(parent)
                .cloned()
                .ok_or_else(|| format!("parent {} has no remote id", parent))?;
            let segment = path::last_segment(child).unwrap_or_default();

            let (id, created) = match self
                .gateways
                .routing
                .create_resource(container, &parent_id, segment)
                .await
            {
                Ok(id) => (id, Outcome::Created),
                Err(e) if e.is_already_exists() => {
                    (self.adopt_existing(container, child).await?, Outcome::Adopted)
                }
                Err(e) => return Err(format!("failed to create {}: {}", child, e)),
            };
            state.document.resources.record_remote_id(child, id);
            if child == resource_path {
                outcome = created;
            }
        }
        Ok(outcome)
    }

    /// Id of an existing remote resource by path
    async fn adopt_existing(&self, container: &RemoteId, resource_path: &str) -> EntityResult<RemoteId> {
        let remote = self
            .gateways
            .routing
            .list_resources(container)
            .await
            .map_err(|e| format!("could not list resources: {}", e))?;
        remote
            .into_iter()
            .find(|r| r.path == resource_path)
            .map(|r| {
                debug!(path = %resource_path, id = %r.id, "Adopted existing resource");
                r.id
            })
            .ok_or_else(|| format!("{} reported as existing but not listed", resource_path))
    }

    async fn wire_integrations(
        &self,
        state: &mut LocalState,
        container: &RemoteId,
        failed: &[String],
        report: &mut PhaseReport,
    ) {
        // Planned up front: wiring writes proxy ids back into the store
        let mut plan = Vec::new();
        for resource in state.document.resources.iter() {
            for entry in resource.methods() {
                match entry {
                    Ok((method, integration)) => {
                        plan.push((resource.path.clone(), method, integration.clone()))
                    }
                    Err(e) => report.fail(EntityKind::Integration, &resource.path, e),
                }
            }
        }

        let mut account = None;
        for (resource_path, method, integration) in plan {
            let name = format!("{} {}", method, resource_path);
            if failed.contains(&resource_path) {
                report.record(
                    EntityKind::Integration,
                    name,
                    Outcome::Skipped("resource not converged".into()),
                );
                continue;
            }
            let Some(resource_id) = state.document.resources.remote_id(&resource_path).cloned()
            else {
                report.record(
                    EntityKind::Integration,
                    name,
                    Outcome::Skipped("resource not deployed".into()),
                );
                continue;
            };

            let result = match &integration {
                Integration::Function { function, .. } => {
                    self.wire_function(
                        state,
                        container,
                        &resource_path,
                        &resource_id,
                        method,
                        function,
                        &mut account,
                    )
                    .await
                }
                Integration::Storage { bucket, prefix } => {
                    self.wire_storage(state, container, &resource_id, method, bucket, prefix)
                        .await
                }
            };

            match result {
                Ok(()) => {
                    debug!(integration = %name, target = %integration.target(), "Integration wired");
                    report.record(EntityKind::Integration, name, Outcome::Updated);
                }
                Err(reason) => {
                    warn!(integration = %name, reason = %reason, "Integration failed");
                    report.fail(EntityKind::Integration, name, reason);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn wire_function(
        &self,
        state: &mut LocalState,
        container: &RemoteId,
        resource_path: &str,
        resource_id: &RemoteId,
        method: HttpMethod,
        function: &str,
        account: &mut Option<String>,
    ) -> EntityResult<()> {
        let routing = &self.gateways.routing;
        let function_arn = self.function_arn(state, function).await?;
        let wiring = Wiring::ComputeProxy { function_arn };

        routing
            .put_method(container, resource_id, method)
            .await
            .map_err(|e| e.to_string())?;
        routing
            .put_integration(container, resource_id, method, &wiring)
            .await
            .map_err(|e| e.to_string())?;

        // Catch-all child proxying every sub-path to the same function
        let proxy_path = path::normalize(&format!("{}/{}", resource_path, PROXY_SEGMENT));
        let proxy_id = self
            .ensure_proxy(state, container, resource_path, resource_id, method, &proxy_path)
            .await?;
        routing
            .put_method(container, &proxy_id, HttpMethod::Any)
            .await
            .map_err(|e| e.to_string())?;
        routing
            .put_integration(container, &proxy_id, HttpMethod::Any, &wiring)
            .await
            .map_err(|e| e.to_string())?;

        let account = self.account_id(account).await?;
        for (grant_method, grant_path) in [(method, resource_path), (HttpMethod::Any, proxy_path.as_str())] {
            let source_arn = routing.source_arn(&account, container, grant_method, grant_path);
            let grant = InvokeGrant::new(function, InvokeGrant::ROUTING_PRINCIPAL, source_arn)
                .with_source_account(account.as_str());
            self.gateways
                .compute
                .grant_invoke(&grant)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    async fn ensure_proxy(
        &self,
        state: &mut LocalState,
        container: &RemoteId,
        resource_path: &str,
        resource_id: &RemoteId,
        method: HttpMethod,
        proxy_path: &str,
    ) -> EntityResult<RemoteId> {
        let routing = &self.gateways.routing;

        let recorded = state
            .document
            .resources
            .find(resource_path)
            .ok()
            .and_then(|r| match r.integration(method) {
                Some(Integration::Function {
                    proxy_resource_id, ..
                }) => proxy_resource_id.clone(),
                _ => None,
            });
        if let Some(id) = recorded {
            match routing.resource_exists(container, &id).await {
                Ok(true) => return Ok(id),
                Ok(false) => warn!(path = %proxy_path, "Proxy resource is gone remotely, recreating"),
                Err(e) => return Err(format!("could not verify proxy resource: {}", e)),
            }
        }

        let id = match routing
            .create_resource(container, resource_id, PROXY_SEGMENT)
            .await
        {
            Ok(id) => id,
            Err(e) if e.is_already_exists() => self.adopt_existing(container, proxy_path).await?,
            Err(e) => return Err(format!("failed to create {}: {}", proxy_path, e)),
        };

        if let Ok(resource) = state.document.resources.find_mut(resource_path) {
            if let Some(Integration::Function {
                proxy_resource_id, ..
            }) = resource.integrations.get_mut(method.as_str())
            {
                *proxy_resource_id = Some(id.clone());
            }
        }
        Ok(id)
    }

    async fn wire_storage(
        &self,
        state: &LocalState,
        container: &RemoteId,
        resource_id: &RemoteId,
        method: HttpMethod,
        bucket: &str,
        prefix: &str,
    ) -> EntityResult<()> {
        let credentials = state
            .document
            .project
            .storage_role()
            .map_err(|e| e.to_string())?
            .to_string();
        let wiring = Wiring::BlobPassthrough {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            credentials,
        };

        let routing = &self.gateways.routing;
        routing
            .put_method(container, resource_id, method)
            .await
            .map_err(|e| e.to_string())?;
        routing
            .put_integration(container, resource_id, method, &wiring)
            .await
            .map_err(|e| e.to_string())
    }

    /// Caller account, fetched once per run
    async fn account_id(&self, cache: &mut Option<String>) -> EntityResult<String> {
        if let Some(account) = cache {
            return Ok(account.clone());
        }
        let account = self
            .gateways
            .identity
            .caller_account_id()
            .await
            .map_err(|e| format!("could not resolve caller account: {}", e))?;
        *cache = Some(account.clone());
        Ok(account)
    }

    /// Delete the resource at `path` and every resource whose path starts
    /// with it, deepest first.
    ///
    /// Remote deletions that report "not found" count as done. Any other
    /// remote failure keeps the local record so a re-run can retry.
    #[instrument(skip(self, state, confirm))]
    pub async fn delete_resource(
        &self,
        state: &mut LocalState,
        resource_path: &str,
        force: bool,
        confirm: &dyn Confirmation,
    ) -> Result<PhaseReport> {
        let resource_path = path::normalize(resource_path);
        state.document.resources.find(&resource_path)?;

        let mut subtree: Vec<(String, Option<RemoteId>)> = state
            .document
            .resources
            .find_subtree(&resource_path)
            .into_iter()
            .map(|r| (r.path.clone(), r.remote_id.clone()))
            .collect();

        if !force {
            let prompt = format!(
                "Delete {} and {} resource(s) under it?",
                resource_path,
                subtree.len().saturating_sub(1)
            );
            if !confirm.confirm(&prompt) {
                return Err(DeployError::Cancelled);
            }
        }

        subtree.sort_by_key(|(p, _)| std::cmp::Reverse(path::depth(p)));
        let container = state.document.project.api_id.clone();
        let mut report = PhaseReport::new(Phase::Delete);

        let mut kept: Vec<String> = Vec::new();
        for (target, remote_id) in subtree {
            // Ancestors of a kept resource stay too, so a re-run retries the chain
            let kept_descendant = kept
                .iter()
                .find(|p| path::prefixes(p).contains(&target))
                .cloned();
            if let Some(descendant) = kept_descendant {
                report.fail(
                    EntityKind::Resource,
                    &target,
                    format!("descendant {} was not deleted", descendant),
                );
                kept.push(target);
                continue;
            }

            // The root belongs to the container and is never deleted remotely
            if let (Some(container), Some(id), false) =
                (&container, &remote_id, path::is_root(&target))
            {
                match self.gateways.routing.delete_resource(container, id).await {
                    Ok(()) => debug!(path = %target, "Resource deleted remotely"),
                    Err(e) if e.is_not_found() => {
                        warn!(path = %target, "Resource not found remotely, removing local record only")
                    }
                    Err(e) => {
                        warn!(path = %target, error = %e, "Remote delete failed, keeping local record");
                        report.fail(EntityKind::Resource, &target, e);
                        kept.push(target);
                        continue;
                    }
                }
            }
            state.document.resources.delete(&target)?;
            report.record(EntityKind::Resource, target, Outcome::Deleted);
        }

        info!(
            path = %resource_path,
            deleted = report.entities.len() - report.failures().count(),
            "Resource subtree deleted"
        );
        Ok(report)
    }

    /// Remove the `method` binding from the resource at `path`.
    ///
    /// A deployed resource has its remote method (and with it the wiring)
    /// deleted first. The catch-all proxy goes too once no function binding
    /// on the resource needs it. Anything already gone remotely counts as
    /// removed; any other remote failure keeps the local binding.
    #[instrument(skip(self, state))]
    pub async fn remove_integration(
        &self,
        state: &mut LocalState,
        resource_path: &str,
        method: HttpMethod,
    ) -> Result<PhaseReport> {
        let resource_path = path::normalize(resource_path);
        let resource = state.document.resources.find(&resource_path)?;
        let integration = resource
            .integration(method)
            .cloned()
            .ok_or_else(|| StoreError::IntegrationNotFound {
                path: resource_path.clone(),
                method: method.to_string(),
            })?;
        let resource_id = resource.remote_id.clone();
        let shares_proxy = resource
            .integrations
            .iter()
            .any(|(m, i)| m != method.as_str() && matches!(i, Integration::Function { .. }));

        let name = format!("{} {}", method, resource_path);
        let mut report = PhaseReport::new(Phase::Delete);
        let routing = &self.gateways.routing;

        if let (Some(container), Some(resource_id)) =
            (state.document.project.api_id.clone(), resource_id)
        {
            match routing.delete_method(&container, &resource_id, method).await {
                Ok(()) => info!(integration = %name, "Method deleted remotely"),
                Err(e) if e.is_not_found() => {
                    warn!(integration = %name, "Method not found remotely, removing local binding only")
                }
                Err(e) => return Err(DeployError::remote(format!("integration {}", name), e)),
            }

            if let Integration::Function {
                proxy_resource_id: Some(proxy_id),
                ..
            } = &integration
            {
                if !shares_proxy {
                    match routing.delete_resource(&container, proxy_id).await {
                        Ok(()) => debug!(resource = %proxy_id, "Proxy resource deleted"),
                        Err(e) if e.is_not_found() => {}
                        Err(e) => {
                            return Err(DeployError::remote(format!("integration {}", name), e))
                        }
                    }
                }
            }
        } else {
            debug!(integration = %name, "Resource not deployed, removing local binding only");
        }

        state
            .document
            .resources
            .find_mut(&resource_path)?
            .remove_integration(method);
        report.record(EntityKind::Integration, name, Outcome::Deleted);
        Ok(report)
    }
}

/// Clear the recorded id of one resource and its proxy children
fn forget_remote_ids(state: &mut LocalState, resource_path: &str) {
    if let Ok(resource) = state.document.resources.find_mut(resource_path) {
        resource.remote_id = None;
        for integration in resource.integrations.values_mut() {
            if let Integration::Function {
                proxy_resource_id, ..
            } = integration
            {
                *proxy_resource_id = None;
            }
        }
    }
}
