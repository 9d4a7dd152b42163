//! API Gateway (REST) routing adapter

use super::errors::{classify, missing_field};
use crate::error::Result;
use crate::routing::{RemoteResource, RoutingGateway, Wiring};
use async_trait::async_trait;
use aws_sdk_apigateway::types::IntegrationType;
use aws_sdk_apigateway::Client;
use ginger_types::{HttpMethod, RemoteId};
use tracing::debug;

const SERVICE: &str = "routing";

pub struct ApiGatewayRouting {
    client: Client,
    region: String,
}

impl ApiGatewayRouting {
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    fn lambda_uri(&self, function_arn: &RemoteId) -> String {
        format!(
            "arn:aws:apigateway:{}:lambda:path/2015-03-31/functions/{}/invocations",
            self.region, function_arn
        )
    }

    fn s3_uri(&self, bucket: &str, prefix: &str) -> String {
        if prefix.is_empty() {
            format!("arn:aws:apigateway:{}:s3:path/{}", self.region, bucket)
        } else {
            format!("arn:aws:apigateway:{}:s3:path/{}/{}", self.region, bucket, prefix)
        }
    }

    /// Passthrough integrations need an explicit 200 mapping
    async fn put_ok_responses(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
    ) -> Result<()> {
        let result = self
            .client
            .put_method_response()
            .rest_api_id(container.as_str())
            .resource_id(resource.as_str())
            .http_method(method.as_str())
            .status_code("200")
            .send()
            .await;
        if let Err(e) = result {
            let err = classify(SERVICE, "put_method_response", resource.as_str(), e);
            if !err.is_already_exists() {
                return Err(err);
            }
        }

        self.client
            .put_integration_response()
            .rest_api_id(container.as_str())
            .resource_id(resource.as_str())
            .http_method(method.as_str())
            .status_code("200")
            .send()
            .await
            .map_err(|e| classify(SERVICE, "put_integration_response", resource.as_str(), e))?;
        Ok(())
    }
}

#[async_trait]
impl RoutingGateway for ApiGatewayRouting {
    fn region(&self) -> &str {
        &self.region
    }

    async fn create_container(&self, name: &str) -> Result<RemoteId> {
        let out = self
            .client
            .create_rest_api()
            .name(name)
            .description("Managed by ginger")
            .send()
            .await
            .map_err(|e| classify(SERVICE, "create_rest_api", name, e))?;
        out.id()
            .map(RemoteId::from)
            .ok_or_else(|| missing_field(SERVICE, "create_rest_api", "id"))
    }

    async fn container_exists(&self, container: &RemoteId) -> Result<bool> {
        match self
            .client
            .get_rest_api()
            .rest_api_id(container.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match classify(SERVICE, "get_rest_api", container.as_str(), e) {
                err if err.is_not_found() => Ok(false),
                err => Err(err),
            },
        }
    }

    async fn list_resources(&self, container: &RemoteId) -> Result<Vec<RemoteResource>> {
        let mut stream = self
            .client
            .get_resources()
            .rest_api_id(container.as_str())
            .limit(500)
            .into_paginator()
            .items()
            .send();

        let mut resources = Vec::new();
        while let Some(item) = stream.next().await {
            let resource =
                item.map_err(|e| classify(SERVICE, "get_resources", container.as_str(), e))?;
            if let (Some(id), Some(path)) = (resource.id(), resource.path()) {
                resources.push(RemoteResource {
                    id: RemoteId::from(id),
                    path: path.to_string(),
                });
            }
        }
        debug!(container = %container, count = resources.len(), "Remote resources listed");
        Ok(resources)
    }

    async fn resource_exists(&self, container: &RemoteId, id: &RemoteId) -> Result<bool> {
        match self
            .client
            .get_resource()
            .rest_api_id(container.as_str())
            .resource_id(id.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match classify(SERVICE, "get_resource", id.as_str(), e) {
                err if err.is_not_found() => Ok(false),
                err => Err(err),
            },
        }
    }

    async fn create_resource(
        &self,
        container: &RemoteId,
        parent: &RemoteId,
        segment: &str,
    ) -> Result<RemoteId> {
        let out = self
            .client
            .create_resource()
            .rest_api_id(container.as_str())
            .parent_id(parent.as_str())
            .path_part(segment)
            .send()
            .await
            .map_err(|e| classify(SERVICE, "create_resource", segment, e))?;
        out.id()
            .map(RemoteId::from)
            .ok_or_else(|| missing_field(SERVICE, "create_resource", "id"))
    }

    async fn delete_resource(&self, container: &RemoteId, id: &RemoteId) -> Result<()> {
        self.client
            .delete_resource()
            .rest_api_id(container.as_str())
            .resource_id(id.as_str())
            .send()
            .await
            .map_err(|e| classify(SERVICE, "delete_resource", id.as_str(), e))?;
        Ok(())
    }

    async fn put_method(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
    ) -> Result<()> {
        let result = self
            .client
            .put_method()
            .rest_api_id(container.as_str())
            .resource_id(resource.as_str())
            .http_method(method.as_str())
            .authorization_type("NONE")
            .api_key_required(false)
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) => match classify(SERVICE, "put_method", resource.as_str(), e) {
                err if err.is_already_exists() => Ok(()),
                err => Err(err),
            },
        }
    }

    async fn delete_method(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
    ) -> Result<()> {
        // Deleting the method drops its integration with it
        self.client
            .delete_method()
            .rest_api_id(container.as_str())
            .resource_id(resource.as_str())
            .http_method(method.as_str())
            .send()
            .await
            .map_err(|e| classify(SERVICE, "delete_method", resource.as_str(), e))?;
        debug!(resource = %resource, %method, "Method deleted");
        Ok(())
    }

    async fn put_integration(
        &self,
        container: &RemoteId,
        resource: &RemoteId,
        method: HttpMethod,
        wiring: &Wiring,
    ) -> Result<()> {
        let request = self
            .client
            .put_integration()
            .rest_api_id(container.as_str())
            .resource_id(resource.as_str())
            .http_method(method.as_str());

        let request = match wiring {
            Wiring::ComputeProxy { function_arn } => request
                .r#type(IntegrationType::AwsProxy)
                .integration_http_method("POST")
                .uri(self.lambda_uri(function_arn)),
            Wiring::BlobPassthrough {
                bucket,
                prefix,
                credentials,
            } => request
                .r#type(IntegrationType::Aws)
                .integration_http_method("GET")
                .uri(self.s3_uri(bucket, prefix))
                .credentials(credentials),
        };

        request
            .send()
            .await
            .map_err(|e| classify(SERVICE, "put_integration", resource.as_str(), e))?;

        if matches!(wiring, Wiring::BlobPassthrough { .. }) {
            self.put_ok_responses(container, resource, method).await?;
        }
        Ok(())
    }

    async fn create_deployment(
        &self,
        container: &RemoteId,
        stage: &str,
        message: Option<&str>,
    ) -> Result<RemoteId> {
        let out = self
            .client
            .create_deployment()
            .rest_api_id(container.as_str())
            .stage_name(stage)
            .stage_description("This stage is managed by ginger")
            .set_description(message.map(str::to_string))
            .send()
            .await
            .map_err(|e| classify(SERVICE, "create_deployment", stage, e))?;
        out.id()
            .map(RemoteId::from)
            .ok_or_else(|| missing_field(SERVICE, "create_deployment", "id"))
    }

    async fn delete_stage(&self, container: &RemoteId, stage: &str) -> Result<()> {
        self.client
            .delete_stage()
            .rest_api_id(container.as_str())
            .stage_name(stage)
            .send()
            .await
            .map_err(|e| classify(SERVICE, "delete_stage", stage, e))?;
        Ok(())
    }
}
