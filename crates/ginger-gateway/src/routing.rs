//! Routing (HTTP API) service

use crate::error::Result;
use async_trait::async_trait;
use ginger_types::{HttpMethod, RemoteId};

/// A resource as the remote side reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResource {
    pub id: RemoteId,
    pub path: String,
}

/// Backend wiring for one method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wiring {
    /// Proxy every request to a function
    ComputeProxy { function_arn: RemoteId },
    /// Pass requests through to objects under `bucket/prefix`
    BlobPassthrough {
        bucket: String,
        prefix: String,
        credentials: String,
    },
}

#[async_trait]
pub trait RoutingGateway: Send + Sync {
    /// Region used when building ARNs
    fn region(&self) -> &str;

    /// Create a routing container; the provider creates its root implicitly
    async fn create_container(&self, name: &str) -> Result<RemoteId>;

    async fn container_exists(&self, container: &RemoteId) -> Result<bool>;

    async fn list_resources(&self, container: &RemoteId) -> Result<Vec<RemoteResource>>;

    async fn resource_exists(&self, container: &RemoteId, id: &RemoteId) -> Result<bool>;

    async fn create_resource(
        &self,
        container: &RemoteId,
        parent: &RemoteId,
        segment: &str,
    ) -> Result<RemoteId>;

    /// Removes the resource and everything below it
    async fn delete_resource(&self, container: &RemoteId, id: &RemoteId) -> Result<()>;

    /// Declare a method; declaring an existing method succeeds
    async fn put_method(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
    ) -> Result<()>;

    /// Remove a declared method together with its backend wiring
    async fn delete_method(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
    ) -> Result<()>;

    /// Create or replace the backend wiring of a declared method
    async fn put_integration(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
        wiring: &Wiring,
    ) -> Result<()>;

    async fn create_deployment(
        &self,
        container: &RemoteId,
        stage: &str,
        message: Option<&str>,
    ) -> Result<RemoteId>;

    /// Remove a stage; its deployments stay behind
    async fn delete_stage(&self, container: &RemoteId, stage: &str) -> Result<()>;

    /// ARN identifying calls to `method path` for invoke permissions
    fn source_arn(
        &self,
        account: &str,
        container: &RemoteId,
        method: HttpMethod,
        path: &str,
    ) -> String {
        let path = if path == "/" { "" } else { path };
        format!(
            "arn:aws:execute-api:{}:{}:{}/*/{}{}",
            self.region(),
            account,
            container,
            method.arn_component(),
            path
        )
    }
}
