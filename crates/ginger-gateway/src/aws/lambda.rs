//! Lambda compute adapter

use super::errors::{classify, missing_field};
use crate::compute::{unqualified_arn, ComputeGateway, FunctionSpec, Invocation, InvokeGrant};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, FunctionCode, LastUpdateStatus, Runtime, VpcConfig};
use aws_sdk_lambda::Client;
use ginger_types::RemoteId;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

const SERVICE: &str = "compute";
const UPDATE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const UPDATE_POLL_ATTEMPTS: u32 = 60;

pub struct LambdaCompute {
    client: Client,
}

impl LambdaCompute {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn environment(spec: &FunctionSpec) -> Environment {
        let variables: HashMap<String, String> = spec
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Environment::builder().set_variables(Some(variables)).build()
    }

    fn vpc_config(spec: &FunctionSpec) -> Option<VpcConfig> {
        spec.network.as_ref().map(|network| {
            VpcConfig::builder()
                .set_subnet_ids(Some(network.subnet_ids.clone()))
                .set_security_group_ids(Some(network.security_group_ids.clone()))
                .build()
        })
    }

    /// Code and configuration updates are rejected while a previous update
    /// is still being applied
    async fn wait_until_updated(&self, name: &str) -> Result<()> {
        for _ in 0..UPDATE_POLL_ATTEMPTS {
            let config = self
                .client
                .get_function_configuration()
                .function_name(name)
                .send()
                .await
                .map_err(|e| classify(SERVICE, "get_function_configuration", name, e))?;
            if config.last_update_status() != Some(&LastUpdateStatus::InProgress) {
                return Ok(());
            }
            debug!(function = name, "Waiting for previous update to finish");
            tokio::time::sleep(UPDATE_POLL_INTERVAL).await;
        }
        Err(GatewayError::Unavailable {
            service: SERVICE,
            operation: "get_function_configuration",
            message: format!("{} is still updating", name),
        })
    }
}

#[async_trait]
impl ComputeGateway for LambdaCompute {
    async fn lookup(&self, name: &str) -> Result<Option<RemoteId>> {
        match self.client.get_function().function_name(name).send().await {
            Ok(out) => Ok(out
                .configuration()
                .and_then(|c| c.function_arn())
                .map(|arn| RemoteId::from(unqualified_arn(arn)))),
            Err(e) => match classify(SERVICE, "get_function", name, e) {
                err if err.is_not_found() => Ok(None),
                err => Err(err),
            },
        }
    }

    async fn create(&self, spec: &FunctionSpec, archive: Vec<u8>) -> Result<RemoteId> {
        let out = self
            .client
            .create_function()
            .function_name(&spec.name)
            .runtime(Runtime::from(spec.runtime.as_str()))
            .role(&spec.role)
            .handler(&spec.handler)
            .memory_size(spec.memory_size as i32)
            .timeout(spec.timeout as i32)
            .publish(true)
            .code(FunctionCode::builder().zip_file(Blob::new(archive)).build())
            .environment(Self::environment(spec))
            .set_vpc_config(Self::vpc_config(spec))
            .send()
            .await
            .map_err(|e| classify(SERVICE, "create_function", &spec.name, e))?;

        let arn = out
            .function_arn()
            .ok_or_else(|| missing_field(SERVICE, "create_function", "FunctionArn"))?;
        // Published responses carry the new version as a qualifier
        let arn = unqualified_arn(arn);
        info!(function = %spec.name, arn, "Lambda function created");
        Ok(RemoteId::from(arn))
    }

    async fn update(&self, spec: &FunctionSpec, archive: Vec<u8>) -> Result<RemoteId> {
        self.wait_until_updated(&spec.name).await?;
        self.client
            .update_function_configuration()
            .function_name(&spec.name)
            .runtime(Runtime::from(spec.runtime.as_str()))
            .role(&spec.role)
            .handler(&spec.handler)
            .memory_size(spec.memory_size as i32)
            .timeout(spec.timeout as i32)
            .environment(Self::environment(spec))
            .set_vpc_config(Self::vpc_config(spec))
            .send()
            .await
            .map_err(|e| classify(SERVICE, "update_function_configuration", &spec.name, e))?;

        self.wait_until_updated(&spec.name).await?;
        let out = self
            .client
            .update_function_code()
            .function_name(&spec.name)
            .zip_file(Blob::new(archive))
            .publish(true)
            .send()
            .await
            .map_err(|e| classify(SERVICE, "update_function_code", &spec.name, e))?;

        let arn = out
            .function_arn()
            .ok_or_else(|| missing_field(SERVICE, "update_function_code", "FunctionArn"))?;
        let arn = unqualified_arn(arn);
        info!(function = %spec.name, arn, "Lambda function updated");
        Ok(RemoteId::from(arn))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.client
            .delete_function()
            .function_name(name)
            .send()
            .await
            .map_err(|e| classify(SERVICE, "delete_function", name, e))?;
        Ok(())
    }

    async fn grant_invoke(&self, grant: &InvokeGrant) -> Result<()> {
        let result = self
            .client
            .add_permission()
            .function_name(&grant.function)
            .statement_id(grant.statement_id())
            .action("lambda:InvokeFunction")
            .principal(&grant.principal)
            .source_arn(&grant.source_arn)
            .set_source_account(grant.source_account.clone())
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match classify(SERVICE, "add_permission", &grant.function, e) {
                // Statement already present
                err if err.is_already_exists() => Ok(()),
                err => Err(err),
            },
        }
    }

    async fn invoke(&self, name: &str, payload: Vec<u8>) -> Result<Invocation> {
        let out = self
            .client
            .invoke()
            .function_name(name)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| classify(SERVICE, "invoke", name, e))?;
        debug!(function = %name, status = out.status_code(), "Lambda function invoked");
        Ok(Invocation {
            payload: out.payload().map(|p| p.as_ref().to_vec()).unwrap_or_default(),
            function_error: out.function_error().map(str::to_string),
        })
    }
}
