//! Compute (function) service

use crate::error::Result;
use async_trait::async_trait;
use ginger_types::{Function, NetworkConfig, RemoteId};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Everything the provider needs to create or reconfigure a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub runtime: String,
    /// Entry point inside the archive; the entry is named after the function
    pub handler: String,
    pub role: String,
    pub memory_size: u32,
    pub timeout: u32,
    pub environment: BTreeMap<String, String>,
    pub network: Option<NetworkConfig>,
}

impl FunctionSpec {
    pub fn from_function(function: &Function, role: impl Into<String>, runtime: &str) -> Self {
        Self {
            name: function.name.clone(),
            runtime: runtime.to_string(),
            handler: function.name.clone(),
            role: role.into(),
            memory_size: function.memory_size,
            timeout: function.timeout,
            environment: function.environment.clone(),
            network: function.network.clone(),
        }
    }
}

/// Permission for a service principal to invoke a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeGrant {
    pub function: String,
    pub principal: String,
    pub source_arn: String,
    pub source_account: Option<String>,
}

impl InvokeGrant {
    pub const ROUTING_PRINCIPAL: &'static str = "apigateway.amazonaws.com";
    pub const SCHEDULER_PRINCIPAL: &'static str = "events.amazonaws.com";

    pub fn new(
        function: impl Into<String>,
        principal: impl Into<String>,
        source_arn: impl Into<String>,
    ) -> Self {
        Self {
            function: function.into(),
            principal: principal.into(),
            source_arn: source_arn.into(),
            source_account: None,
        }
    }

    pub fn with_source_account(mut self, account: impl Into<String>) -> Self {
        self.source_account = Some(account.into());
        self
    }

    /// Same grant, same id
    pub fn statement_id(&self) -> String {
        let key = format!("{}|{}|{}", self.function, self.principal, self.source_arn);
        format!("ginger-{}", Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()))
    }
}

/// Result of one synchronous invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub payload: Vec<u8>,
    /// Set when the function itself raised; the payload then holds the error
    pub function_error: Option<String>,
}

/// Function ARN without a `:version` or `:alias` qualifier.
///
/// Invoke permissions are granted on the unqualified function, so that is
/// the ARN routes must target.
pub fn unqualified_arn(arn: &str) -> &str {
    // arn:aws:lambda:<region>:<account>:function:<name>[:<qualifier>]
    match arn.match_indices(':').nth(6) {
        Some((index, _)) => &arn[..index],
        None => arn,
    }
}

#[async_trait]
pub trait ComputeGateway: Send + Sync {
    /// Remote id of the function named `name`, `None` if confirmed absent
    async fn lookup(&self, name: &str) -> Result<Option<RemoteId>>;

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.lookup(name).await?.is_some())
    }

    async fn create(&self, spec: &FunctionSpec, archive: Vec<u8>) -> Result<RemoteId>;

    /// Push configuration and code for an existing function
    async fn update(&self, spec: &FunctionSpec, archive: Vec<u8>) -> Result<RemoteId>;

    async fn delete(&self, name: &str) -> Result<()>;

    /// Idempotent: granting an identical permission twice succeeds
    async fn grant_invoke(&self, grant: &InvokeGrant) -> Result<()>;

    /// Invoke synchronously and wait for the response
    async fn invoke(&self, name: &str, payload: Vec<u8>) -> Result<Invocation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_id_is_stable() {
        let grant = InvokeGrant::new("hello", InvokeGrant::ROUTING_PRINCIPAL, "arn:a");
        assert_eq!(grant.statement_id(), grant.clone().statement_id());
        assert!(grant.statement_id().starts_with("ginger-"));

        let other = InvokeGrant::new("hello", InvokeGrant::ROUTING_PRINCIPAL, "arn:b");
        assert_ne!(grant.statement_id(), other.statement_id());
    }

    #[test]
    fn test_spec_from_function() {
        let function = Function::new("hello").with_memory_size(256);
        let spec = FunctionSpec::from_function(&function, "arn:role", "go1.x");
        assert_eq!(spec.handler, "hello");
        assert_eq!(spec.memory_size, 256);
        assert_eq!(spec.role, "arn:role");
    }

    #[test]
    fn test_unqualified_arn_strips_version_and_alias() {
        let base = "arn:aws:lambda:us-east-1:123456789012:function:hello";
        assert_eq!(unqualified_arn(base), base);
        assert_eq!(unqualified_arn(&format!("{}:7", base)), base);
        assert_eq!(unqualified_arn(&format!("{}:live", base)), base);
        assert_eq!(unqualified_arn("fn-000001"), "fn-000001");
    }
}
