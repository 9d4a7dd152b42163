//! Routable resources and their method-level integrations

use crate::error::ValidationError;
use crate::ids::RemoteId;
use crate::path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Path segment of the catch-all child created for compute integrations
pub const PROXY_SEGMENT: &str = "{proxy+}";

/// HTTP methods accepted on an integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Any,
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Any => "ANY",
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Method used for invoke-permission source ARNs (`*` for ANY)
    pub fn arn_component(&self) -> &'static str {
        match self {
            HttpMethod::Any => "*",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ANY" => Ok(HttpMethod::Any),
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "OPTIONS" => Ok(HttpMethod::Options),
            "HEAD" => Ok(HttpMethod::Head),
            _ => Err(ValidationError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Method-level binding of a resource to a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Integration {
    /// Proxy wiring to a compute function
    Function {
        function: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        proxy_resource_id: Option<RemoteId>,
    },
    /// Passthrough wiring to the blob store
    Storage {
        bucket: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        prefix: String,
    },
}

impl Integration {
    pub fn function(name: impl Into<String>) -> Self {
        Integration::Function {
            function: name.into(),
            proxy_resource_id: None,
        }
    }

    pub fn storage(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Integration::Storage {
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Integration::Function { .. } => "function",
            Integration::Storage { .. } => "storage",
        }
    }

    /// Short target description, e.g. `function:hello` or `storage:bucket/assets`
    pub fn target(&self) -> String {
        match self {
            Integration::Function { function, .. } => format!("{}:{}", self.kind(), function),
            Integration::Storage { bucket, prefix } if prefix.is_empty() => {
                format!("{}:{}", self.kind(), bucket)
            }
            Integration::Storage { bucket, prefix } => {
                format!("{}:{}/{}", self.kind(), bucket, prefix)
            }
        }
    }
}

/// One routable path in the resource tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub path: String,
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<RemoteId>,
    #[serde(default)]
    pub user_defined: bool,
    /// Keyed by upper-case method name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub integrations: BTreeMap<String, Integration>,
}

impl Resource {
    /// Resource declared by the operator
    pub fn new(path: &str) -> Self {
        Self {
            path: path::normalize(path),
            remote_id: None,
            user_defined: true,
            integrations: BTreeMap::new(),
        }
    }

    /// Resource discovered from or created on the remote side during deploy
    pub fn discovered(path: &str, remote_id: RemoteId) -> Self {
        Self {
            path: path::normalize(path),
            remote_id: Some(remote_id),
            user_defined: false,
            integrations: BTreeMap::new(),
        }
    }

    pub fn depth(&self) -> usize {
        path::depth(&self.path)
    }

    pub fn is_deployed(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Bind an integration, returning the one it replaced
    pub fn add_integration(
        &mut self,
        method: HttpMethod,
        integration: Integration,
    ) -> Option<Integration> {
        self.integrations
            .insert(method.as_str().to_string(), integration)
    }

    pub fn integration(&self, method: HttpMethod) -> Option<&Integration> {
        self.integrations.get(method.as_str())
    }

    pub fn remove_integration(&mut self, method: HttpMethod) -> Option<Integration> {
        self.integrations.remove(method.as_str())
    }

    /// Integrations with their parsed method.
    ///
    /// Keys that do not parse as a method are reported as errors so a
    /// hand-edited state file cannot silently drop a binding.
    pub fn methods(&self) -> Vec<Result<(HttpMethod, &Integration), ValidationError>> {
        self.integrations
            .iter()
            .map(|(method, integration)| method.parse().map(|m| (m, integration)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("ANY".parse::<HttpMethod>().unwrap(), HttpMethod::Any);
        assert!(matches!(
            "TRACE".parse::<HttpMethod>(),
            Err(ValidationError::UnsupportedMethod(_))
        ));
        assert_eq!(HttpMethod::Any.arn_component(), "*");
        assert_eq!(HttpMethod::Post.arn_component(), "POST");
    }

    #[test]
    fn test_resource_normalizes_path() {
        let resource = Resource::new("users/{id}/");
        assert_eq!(resource.path, "/users/{id}");
        assert_eq!(resource.depth(), 2);
        assert!(resource.user_defined);
        assert!(!resource.is_deployed());
    }

    #[test]
    fn test_one_integration_per_method() {
        let mut resource = Resource::new("/a");
        assert!(resource
            .add_integration(HttpMethod::Get, Integration::function("one"))
            .is_none());
        let replaced = resource.add_integration(HttpMethod::Get, Integration::function("two"));
        assert_eq!(replaced, Some(Integration::function("one")));
        assert_eq!(resource.integrations.len(), 1);
        assert_eq!(
            resource.integration(HttpMethod::Get),
            Some(&Integration::function("two"))
        );
        assert!(resource.remove_integration(HttpMethod::Get).is_some());
        assert!(resource.integration(HttpMethod::Get).is_none());
    }

    #[test]
    fn test_integration_target() {
        assert_eq!(Integration::function("hello").target(), "function:hello");
        assert_eq!(
            Integration::storage("bucket", "/assets/").target(),
            "storage:bucket/assets"
        );
        assert_eq!(Integration::storage("bucket", "").target(), "storage:bucket");
    }

    #[test]
    fn test_toml_shape() {
        let mut resource = Resource::discovered("/a", RemoteId::new("abc123"));
        resource.add_integration(HttpMethod::Any, Integration::function("hello"));
        let encoded = toml::to_string(&resource).unwrap();
        assert!(encoded.contains("id = \"abc123\""));
        assert!(encoded.contains("type = \"function\""));
        let decoded: Resource = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, resource);
    }
}
