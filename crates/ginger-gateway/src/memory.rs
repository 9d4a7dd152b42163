//! In-memory cloud
//!
//! Implements every gateway trait against process-local tables. Used by the
//! test suites and by `--offline` rehearsals. Every call is journaled, and
//! any call can be made to fail via [`InMemoryCloud::fail_on`].

use crate::blob::BlobGateway;
use crate::compute::{ComputeGateway, FunctionSpec, Invocation, InvokeGrant};
use crate::error::{GatewayError, Result};
use crate::identity::IdentityGateway;
use crate::logs::{LogEvent, LogsGateway};
use crate::routing::{RemoteResource, RoutingGateway, Wiring};
use crate::scheduler::SchedulerGateway;
use async_trait::async_trait;
use dashmap::DashMap;
use ginger_types::path;
use ginger_types::{HttpMethod, RemoteId};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Wildcard target for [`InMemoryCloud::fail_on`]
pub const ANY_TARGET: &str = "*";

/// Error to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Throttled,
    Unavailable,
    Rejected,
}

impl FailureKind {
    fn into_error(self, service: &'static str, operation: &'static str, target: &str) -> GatewayError {
        match self {
            FailureKind::NotFound => GatewayError::NotFound {
                service,
                operation,
                target: target.to_string(),
            },
            FailureKind::Throttled => GatewayError::Throttled {
                service,
                operation,
                message: "Rate exceeded".into(),
            },
            FailureKind::Unavailable => GatewayError::Unavailable {
                service,
                operation,
                message: "connection reset".into(),
            },
            FailureKind::Rejected => GatewayError::Rejected {
                service,
                operation,
                code: "InjectedFailure".into(),
                message: format!("injected failure for {}", target),
            },
        }
    }
}

/// One journaled call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub service: &'static str,
    pub operation: &'static str,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct StoredFunction {
    pub arn: RemoteId,
    pub spec: FunctionSpec,
    pub archive: Vec<u8>,
    pub grants: Vec<InvokeGrant>,
    /// Bumped on every update
    pub version: u32,
    /// Payloads of every invocation, oldest first
    pub invocations: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRule {
    pub arn: RemoteId,
    pub expression: String,
    pub enabled: bool,
    pub targets: Vec<RemoteId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDeployment {
    pub id: RemoteId,
    pub stage: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
struct ResourceNode {
    path: String,
    methods: BTreeMap<HttpMethod, Option<Wiring>>,
}

#[derive(Debug, Clone, Default)]
struct Container {
    name: String,
    resources: BTreeMap<RemoteId, ResourceNode>,
    deployments: Vec<StoredDeployment>,
    stages: BTreeSet<String>,
}

impl Container {
    fn path_of(&self, id: &RemoteId) -> Option<String> {
        self.resources.get(id).map(|node| node.path.clone())
    }

    fn id_of(&self, path: &str) -> Option<RemoteId> {
        self.resources
            .iter()
            .find(|(_, node)| node.path == path)
            .map(|(id, _)| id.clone())
    }
}

/// Process-local cloud implementing every gateway trait
pub struct InMemoryCloud {
    region: String,
    account: String,
    functions: DashMap<String, StoredFunction>,
    containers: DashMap<RemoteId, Container>,
    buckets: DashMap<String, BTreeMap<String, StoredObject>>,
    foreign_buckets: DashMap<String, ()>,
    rules: DashMap<String, StoredRule>,
    logs: DashMap<String, Vec<LogEvent>>,
    failures: DashMap<(&'static str, String), FailureKind>,
    journal: Mutex<Vec<CallRecord>>,
    next_id: AtomicU64,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::with_identity("us-east-1", "123456789012")
    }

    pub fn with_identity(region: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account: account.into(),
            functions: DashMap::new(),
            containers: DashMap::new(),
            buckets: DashMap::new(),
            foreign_buckets: DashMap::new(),
            rules: DashMap::new(),
            logs: DashMap::new(),
            failures: DashMap::new(),
            journal: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self, prefix: &str) -> RemoteId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        RemoteId::new(format!("{}{:06}", prefix, n))
    }

    /// Journal the call, then fail it if a matching failure was injected
    fn record(&self, service: &'static str, operation: &'static str, target: &str) -> Result<()> {
        self.journal.lock().push(CallRecord {
            service,
            operation,
            target: target.to_string(),
        });
        let injected = self
            .failures
            .get(&(operation, target.to_string()))
            .or_else(|| self.failures.get(&(operation, ANY_TARGET.to_string())))
            .map(|kind| *kind);
        match injected {
            Some(kind) => Err(kind.into_error(service, operation, target)),
            None => Ok(()),
        }
    }

    fn not_found(service: &'static str, operation: &'static str, target: &str) -> GatewayError {
        GatewayError::NotFound {
            service,
            operation,
            target: target.to_string(),
        }
    }

    // Failure injection and inspection

    /// Make every call to `operation` on `target` (or [`ANY_TARGET`]) fail
    pub fn fail_on(&self, operation: &'static str, target: &str, kind: FailureKind) {
        self.failures.insert((operation, target.to_string()), kind);
    }

    pub fn clear_failures(&self) {
        self.failures.clear();
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.journal.lock().clone()
    }

    /// Targets of every call to `operation`, in call order
    pub fn calls_to(&self, operation: &str) -> Vec<String> {
        self.journal
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .map(|c| c.target.clone())
            .collect()
    }

    pub fn clear_journal(&self) {
        self.journal.lock().clear();
    }

    pub fn function(&self, name: &str) -> Option<StoredFunction> {
        self.functions.get(name).map(|f| f.clone())
    }

    pub fn rule(&self, name: &str) -> Option<StoredRule> {
        self.rules.get(name).map(|r| r.clone())
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.contains_key(bucket)
    }

    /// Mark a bucket name as taken by another account
    pub fn add_foreign_bucket(&self, bucket: &str) {
        self.foreign_buckets.insert(bucket.to_string(), ());
    }

    /// Sorted paths of every resource in a container
    pub fn resource_paths(&self, container: &RemoteId) -> Vec<String> {
        let mut paths: Vec<String> = self
            .containers
            .get(container)
            .map(|c| c.resources.values().map(|n| n.path.clone()).collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    pub fn resource_id(&self, container: &RemoteId, path: &str) -> Option<RemoteId> {
        self.containers.get(container).and_then(|c| c.id_of(path))
    }

    pub fn wiring(&self, container: &RemoteId, path: &str, method: HttpMethod) -> Option<Wiring> {
        let container = self.containers.get(container)?;
        let id = container.id_of(path)?;
        container
            .resources
            .get(&id)
            .and_then(|node| node.methods.get(&method).cloned().flatten())
    }

    /// Whether `method` is declared on `path`, wired or not
    pub fn has_method(&self, container: &RemoteId, path: &str, method: HttpMethod) -> bool {
        self.containers
            .get(container)
            .and_then(|c| {
                let id = c.id_of(path)?;
                c.resources.get(&id).map(|node| node.methods.contains_key(&method))
            })
            .unwrap_or(false)
    }

    /// Live stage names, sorted
    pub fn stages(&self, container: &RemoteId) -> Vec<String> {
        self.containers
            .get(container)
            .map(|c| c.stages.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn deployments(&self, container: &RemoteId) -> Vec<StoredDeployment> {
        self.containers
            .get(container)
            .map(|c| c.deployments.clone())
            .unwrap_or_default()
    }

    /// Delete a resource subtree without journaling, simulating drift
    pub fn remove_out_of_band(&self, container: &RemoteId, path: &str) {
        if let Some(mut c) = self.containers.get_mut(container) {
            let path = path::normalize(path);
            let child_prefix = format!("{}/", path);
            c.resources
                .retain(|_, node| node.path != path && !node.path.starts_with(&child_prefix));
        }
    }

    /// Append a line to `group`, assigning it a fresh event id
    pub fn push_log(&self, group: &str, timestamp: i64, message: &str) {
        let event = LogEvent::new(self.next_id("evt").into_inner(), timestamp, message);
        self.logs.entry(group.to_string()).or_default().push(event);
    }

    fn function_arn(&self, name: &str) -> RemoteId {
        RemoteId::new(format!(
            "arn:aws:lambda:{}:{}:function:{}",
            self.region, self.account, name
        ))
    }
}

impl Default for InMemoryCloud {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputeGateway for InMemoryCloud {
    async fn lookup(&self, name: &str) -> Result<Option<RemoteId>> {
        self.record("compute", "get_function", name)?;
        Ok(self.functions.get(name).map(|f| f.arn.clone()))
    }

    async fn create(&self, spec: &FunctionSpec, archive: Vec<u8>) -> Result<RemoteId> {
        self.record("compute", "create_function", &spec.name)?;
        if self.functions.contains_key(&spec.name) {
            return Err(GatewayError::AlreadyExists {
                service: "compute",
                operation: "create_function",
                target: spec.name.clone(),
            });
        }
        let arn = self.function_arn(&spec.name);
        self.functions.insert(
            spec.name.clone(),
            StoredFunction {
                arn: arn.clone(),
                spec: spec.clone(),
                archive,
                grants: Vec::new(),
                version: 1,
                invocations: Vec::new(),
            },
        );
        Ok(arn)
    }

    async fn update(&self, spec: &FunctionSpec, archive: Vec<u8>) -> Result<RemoteId> {
        self.record("compute", "update_function", &spec.name)?;
        let mut function = self
            .functions
            .get_mut(&spec.name)
            .ok_or_else(|| Self::not_found("compute", "update_function", &spec.name))?;
        function.spec = spec.clone();
        function.archive = archive;
        function.version += 1;
        Ok(function.arn.clone())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.record("compute", "delete_function", name)?;
        self.functions
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::not_found("compute", "delete_function", name))
    }

    async fn grant_invoke(&self, grant: &InvokeGrant) -> Result<()> {
        self.record("compute", "add_permission", &grant.function)?;
        let mut function = self
            .functions
            .get_mut(&grant.function)
            .ok_or_else(|| Self::not_found("compute", "add_permission", &grant.function))?;
        let id = grant.statement_id();
        if !function.grants.iter().any(|g| g.statement_id() == id) {
            function.grants.push(grant.clone());
        }
        Ok(())
    }

    /// Echoes the payload back
    async fn invoke(&self, name: &str, payload: Vec<u8>) -> Result<Invocation> {
        self.record("compute", "invoke", name)?;
        let mut function = self
            .functions
            .get_mut(name)
            .ok_or_else(|| Self::not_found("compute", "invoke", name))?;
        function.invocations.push(payload.clone());
        Ok(Invocation {
            payload,
            function_error: None,
        })
    }
}

#[async_trait]
impl RoutingGateway for InMemoryCloud {
    fn region(&self) -> &str {
        &self.region
    }

    async fn create_container(&self, name: &str) -> Result<RemoteId> {
        self.record("routing", "create_rest_api", name)?;
        let id = self.next_id("api");
        let mut container = Container {
            name: name.to_string(),
            ..Container::default()
        };
        container.resources.insert(
            self.next_id("res"),
            ResourceNode {
                path: path::ROOT.to_string(),
                methods: BTreeMap::new(),
            },
        );
        self.containers.insert(id.clone(), container);
        Ok(id)
    }

    async fn container_exists(&self, container: &RemoteId) -> Result<bool> {
        self.record("routing", "get_rest_api", container.as_str())?;
        Ok(self.containers.contains_key(container))
    }

    async fn list_resources(&self, container: &RemoteId) -> Result<Vec<RemoteResource>> {
        self.record("routing", "get_resources", container.as_str())?;
        let c = self
            .containers
            .get(container)
            .ok_or_else(|| Self::not_found("routing", "get_resources", container.as_str()))?;
        Ok(c.resources
            .iter()
            .map(|(id, node)| RemoteResource {
                id: id.clone(),
                path: node.path.clone(),
            })
            .collect())
    }

    async fn resource_exists(&self, container: &RemoteId, id: &RemoteId) -> Result<bool> {
        self.record("routing", "get_resource", id.as_str())?;
        Ok(self
            .containers
            .get(container)
            .map(|c| c.resources.contains_key(id))
            .unwrap_or(false))
    }

    async fn create_resource(
        &self,
        container: &RemoteId,
        parent: &RemoteId,
        segment: &str,
    ) -> Result<RemoteId> {
        let parent_path = self
            .containers
            .get(container)
            .and_then(|c| c.path_of(parent));
        let target = match &parent_path {
            Some(p) => path::normalize(&format!("{}/{}", p, segment)),
            None => format!("{}/{}", parent, segment),
        };
        self.record("routing", "create_resource", &target)?;

        let parent_path =
            parent_path.ok_or_else(|| Self::not_found("routing", "create_resource", parent.as_str()))?;
        let id = self.next_id("res");
        let mut c = self
            .containers
            .get_mut(container)
            .ok_or_else(|| Self::not_found("routing", "create_resource", container.as_str()))?;
        if c.id_of(&target).is_some() {
            return Err(GatewayError::AlreadyExists {
                service: "routing",
                operation: "create_resource",
                target,
            });
        }
        tracing::trace!(parent = %parent_path, path = %target, "In-memory resource created");
        c.resources.insert(
            id.clone(),
            ResourceNode {
                path: target,
                methods: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    async fn delete_resource(&self, container: &RemoteId, id: &RemoteId) -> Result<()> {
        let target = self
            .containers
            .get(container)
            .and_then(|c| c.path_of(id))
            .unwrap_or_else(|| id.to_string());
        self.record("routing", "delete_resource", &target)?;

        let mut c = self
            .containers
            .get_mut(container)
            .ok_or_else(|| Self::not_found("routing", "delete_resource", container.as_str()))?;
        let path = c
            .path_of(id)
            .ok_or_else(|| Self::not_found("routing", "delete_resource", id.as_str()))?;
        let child_prefix = format!("{}/", path);
        c.resources
            .retain(|_, node| node.path != path && !node.path.starts_with(&child_prefix));
        Ok(())
    }

    async fn put_method(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
    ) -> Result<()> {
        let path = self
            .containers
            .get(container)
            .and_then(|c| c.path_of(resource))
            .unwrap_or_else(|| resource.to_string());
        self.record("routing", "put_method", &format!("{} {}", method, path))?;

        let mut c = self
            .containers
            .get_mut(container)
            .ok_or_else(|| Self::not_found("routing", "put_method", container.as_str()))?;
        let node = c
            .resources
            .get_mut(resource)
            .ok_or_else(|| Self::not_found("routing", "put_method", resource.as_str()))?;
        node.methods.entry(method).or_insert(None);
        Ok(())
    }

    async fn delete_method(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
    ) -> Result<()> {
        let path = self
            .containers
            .get(container)
            .and_then(|c| c.path_of(resource))
            .unwrap_or_else(|| resource.to_string());
        let target = format!("{} {}", method, path);
        self.record("routing", "delete_method", &target)?;

        let mut c = self
            .containers
            .get_mut(container)
            .ok_or_else(|| Self::not_found("routing", "delete_method", container.as_str()))?;
        let node = c
            .resources
            .get_mut(resource)
            .ok_or_else(|| Self::not_found("routing", "delete_method", resource.as_str()))?;
        node.methods
            .remove(&method)
            .map(|_| ())
            .ok_or_else(|| Self::not_found("routing", "delete_method", &target))
    }

    async fn put_integration(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
        wiring: &Wiring,
    ) -> Result<()> {
        let path = self
            .containers
            .get(container)
            .and_then(|c| c.path_of(resource))
            .unwrap_or_else(|| resource.to_string());
        let target = format!("{} {}", method, path);
        self.record("routing", "put_integration", &target)?;

        let mut c = self
            .containers
            .get_mut(container)
            .ok_or_else(|| Self::not_found("routing", "put_integration", container.as_str()))?;
        let node = c
            .resources
            .get_mut(resource)
            .ok_or_else(|| Self::not_found("routing", "put_integration", resource.as_str()))?;
        match node.methods.get_mut(&method) {
            Some(slot) => {
                *slot = Some(wiring.clone());
                Ok(())
            }
            None => Err(Self::not_found("routing", "put_integration", &target)),
        }
    }

    async fn create_deployment(
        &self,
        container: &RemoteId,
        stage: &str,
        message: Option<&str>,
    ) -> Result<RemoteId> {
        self.record("routing", "create_deployment", stage)?;
        let id = self.next_id("dep");
        let mut c = self
            .containers
            .get_mut(container)
            .ok_or_else(|| Self::not_found("routing", "create_deployment", container.as_str()))?;
        c.deployments.push(StoredDeployment {
            id: id.clone(),
            stage: stage.to_string(),
            message: message.map(str::to_string),
        });
        c.stages.insert(stage.to_string());
        Ok(id)
    }

    async fn delete_stage(&self, container: &RemoteId, stage: &str) -> Result<()> {
        self.record("routing", "delete_stage", stage)?;
        let mut c = self
            .containers
            .get_mut(container)
            .ok_or_else(|| Self::not_found("routing", "delete_stage", container.as_str()))?;
        if c.stages.remove(stage) {
            Ok(())
        } else {
            Err(Self::not_found("routing", "delete_stage", stage))
        }
    }
}

#[async_trait]
impl BlobGateway for InMemoryCloud {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        self.record("blob", "head_bucket", bucket)?;
        Ok(self.buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.record("blob", "create_bucket", bucket)?;
        if self.foreign_buckets.contains_key(bucket) {
            return Err(GatewayError::AlreadyExists {
                service: "blob",
                operation: "create_bucket",
                target: bucket.to_string(),
            });
        }
        self.buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.record("blob", "put_object", &format!("{}/{}", bucket, key))?;
        let mut objects = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::not_found("blob", "put_object", bucket))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                data,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl SchedulerGateway for InMemoryCloud {
    async fn put_rule(&self, name: &str, expression: &str, enabled: bool) -> Result<RemoteId> {
        self.record("scheduler", "put_rule", name)?;
        let arn = RemoteId::new(format!(
            "arn:aws:events:{}:{}:rule/{}",
            self.region, self.account, name
        ));
        let mut rule = self.rules.entry(name.to_string()).or_insert_with(|| StoredRule {
            arn: arn.clone(),
            expression: String::new(),
            enabled,
            targets: Vec::new(),
        });
        rule.expression = expression.to_string();
        rule.enabled = enabled;
        Ok(arn)
    }

    async fn put_target(&self, rule: &str, target_arn: &RemoteId) -> Result<()> {
        self.record("scheduler", "put_targets", rule)?;
        let mut stored = self
            .rules
            .get_mut(rule)
            .ok_or_else(|| Self::not_found("scheduler", "put_targets", rule))?;
        if !stored.targets.contains(target_arn) {
            stored.targets.push(target_arn.clone());
        }
        Ok(())
    }

    async fn delete_rule(&self, name: &str) -> Result<()> {
        self.record("scheduler", "delete_rule", name)?;
        self.rules
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::not_found("scheduler", "delete_rule", name))
    }
}

#[async_trait]
impl IdentityGateway for InMemoryCloud {
    async fn caller_account_id(&self) -> Result<String> {
        self.record("identity", "get_caller_identity", "")?;
        Ok(self.account.clone())
    }
}

#[async_trait]
impl LogsGateway for InMemoryCloud {
    async fn filter_events(
        &self,
        group: &str,
        filter: Option<&str>,
        start_time: i64,
    ) -> Result<Vec<LogEvent>> {
        self.record("logs", "filter_log_events", group)?;
        let events = self
            .logs
            .get(group)
            .ok_or_else(|| Self::not_found("logs", "filter_log_events", group))?;
        Ok(events
            .iter()
            .filter(|e| e.timestamp >= start_time)
            .filter(|e| filter.map_or(true, |f| e.message.contains(f)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ginger_types::Function;

    fn spec(name: &str) -> FunctionSpec {
        FunctionSpec::from_function(&Function::new(name), "arn:role", "go1.x")
    }

    #[tokio::test]
    async fn test_container_has_implicit_root() {
        let cloud = InMemoryCloud::new();
        let api = cloud.create_container("shop").await.unwrap();
        let resources = cloud.list_resources(&api).await.unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].path, "/");
    }

    #[tokio::test]
    async fn test_create_resource_requires_parent_and_rejects_duplicates() {
        let cloud = InMemoryCloud::new();
        let api = cloud.create_container("shop").await.unwrap();
        let root = cloud.resource_id(&api, "/").unwrap();

        let users = cloud.create_resource(&api, &root, "users").await.unwrap();
        assert!(cloud.resource_exists(&api, &users).await.unwrap());
        assert!(cloud
            .create_resource(&api, &root, "users")
            .await
            .unwrap_err()
            .is_already_exists());
        assert!(cloud
            .create_resource(&api, &RemoteId::new("nope"), "x")
            .await
            .unwrap_err()
            .is_not_found());

        cloud.create_resource(&api, &users, "{id}").await.unwrap();
        assert_eq!(cloud.resource_paths(&api), vec!["/", "/users", "/users/{id}"]);

        cloud.delete_resource(&api, &users).await.unwrap();
        assert_eq!(cloud.resource_paths(&api), vec!["/"]);
        assert!(!cloud.resource_exists(&api, &users).await.unwrap());
    }

    #[tokio::test]
    async fn test_integration_requires_method() {
        let cloud = InMemoryCloud::new();
        let api = cloud.create_container("shop").await.unwrap();
        let root = cloud.resource_id(&api, "/").unwrap();
        let wiring = Wiring::ComputeProxy {
            function_arn: RemoteId::new("arn:fn"),
        };

        assert!(cloud
            .put_integration(&api, &root, HttpMethod::Get, &wiring)
            .await
            .is_err());
        cloud.put_method(&api, &root, HttpMethod::Get).await.unwrap();
        cloud.put_method(&api, &root, HttpMethod::Get).await.unwrap();
        cloud
            .put_integration(&api, &root, HttpMethod::Get, &wiring)
            .await
            .unwrap();
        assert_eq!(cloud.wiring(&api, "/", HttpMethod::Get), Some(wiring));

        cloud.delete_method(&api, &root, HttpMethod::Get).await.unwrap();
        assert!(!cloud.has_method(&api, "/", HttpMethod::Get));
        assert_eq!(cloud.wiring(&api, "/", HttpMethod::Get), None);
        assert!(cloud
            .delete_method(&api, &root, HttpMethod::Get)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_deleting_a_stage_keeps_its_deployments() {
        let cloud = InMemoryCloud::new();
        let api = cloud.create_container("shop").await.unwrap();
        cloud.create_deployment(&api, "prod", None).await.unwrap();
        cloud.create_deployment(&api, "dev", Some("wip")).await.unwrap();
        assert_eq!(cloud.stages(&api), vec!["dev", "prod"]);

        cloud.delete_stage(&api, "dev").await.unwrap();
        assert_eq!(cloud.stages(&api), vec!["prod"]);
        assert_eq!(cloud.deployments(&api).len(), 2);
        assert!(cloud.delete_stage(&api, "dev").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_bucket_create_is_idempotent() {
        let cloud = InMemoryCloud::new();
        cloud.create_bucket("assets").await.unwrap();
        cloud.create_bucket("assets").await.unwrap();
        assert!(cloud.bucket_exists("assets").await.unwrap());

        cloud.add_foreign_bucket("taken");
        assert!(cloud
            .create_bucket("taken")
            .await
            .unwrap_err()
            .is_already_exists());
    }

    #[tokio::test]
    async fn test_function_lifecycle() {
        let cloud = InMemoryCloud::new();
        assert_eq!(cloud.lookup("hello").await.unwrap(), None);
        assert!(cloud.update(&spec("hello"), vec![1]).await.unwrap_err().is_not_found());

        let arn = cloud.create(&spec("hello"), vec![1]).await.unwrap();
        assert!(cloud.exists("hello").await.unwrap());
        assert_eq!(cloud.update(&spec("hello"), vec![2]).await.unwrap(), arn);
        assert_eq!(cloud.function("hello").unwrap().version, 2);

        let grant = InvokeGrant::new("hello", InvokeGrant::ROUTING_PRINCIPAL, "arn:src");
        cloud.grant_invoke(&grant).await.unwrap();
        cloud.grant_invoke(&grant).await.unwrap();
        assert_eq!(cloud.function("hello").unwrap().grants.len(), 1);

        let invocation = cloud.invoke("hello", b"{}".to_vec()).await.unwrap();
        assert_eq!(invocation.payload, b"{}");
        assert_eq!(invocation.function_error, None);
        assert_eq!(cloud.function("hello").unwrap().invocations, vec![b"{}".to_vec()]);

        cloud.delete("hello").await.unwrap();
        assert!(cloud.delete("hello").await.unwrap_err().is_not_found());
        assert!(cloud.invoke("hello", Vec::new()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_failure_injection_and_journal() {
        let cloud = InMemoryCloud::new();
        cloud.fail_on("head_bucket", ANY_TARGET, FailureKind::Throttled);
        let err = cloud.bucket_exists("assets").await.unwrap_err();
        assert!(err.is_transient());

        cloud.clear_failures();
        assert!(!cloud.bucket_exists("assets").await.unwrap());
        assert_eq!(cloud.calls_to("head_bucket"), vec!["assets", "assets"]);
        assert_eq!(cloud.calls().len(), 2);
        cloud.clear_journal();
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rules_and_logs() {
        let cloud = InMemoryCloud::new();
        let arn = cloud.put_rule("nightly", "rate(1 day)", true).await.unwrap();
        assert_eq!(cloud.put_rule("nightly", "rate(2 days)", false).await.unwrap(), arn);
        let target = RemoteId::new("arn:fn");
        cloud.put_target("nightly", &target).await.unwrap();
        cloud.put_target("nightly", &target).await.unwrap();
        let rule = cloud.rule("nightly").unwrap();
        assert!(!rule.enabled);
        assert_eq!(rule.targets.len(), 1);
        cloud.delete_rule("nightly").await.unwrap();
        assert!(cloud.rule("nightly").is_none());

        cloud.push_log("/aws/lambda/hello", 10, "START");
        cloud.push_log("/aws/lambda/hello", 20, "ERROR boom");
        let events = cloud
            .filter_events("/aws/lambda/hello", Some("ERROR"), 0)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(cloud.filter_events("/aws/lambda/hello", None, 15).await.unwrap().len() == 1);
    }
}
