//! Project-wide settings

use crate::error::ConfigurationError;
use crate::ids::RemoteId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RUNTIME: &str = "go1.x";
pub const DEFAULT_REGION: &str = "us-east-1";

fn default_runtime() -> String {
    DEFAULT_RUNTIME.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// `[project]` table of the project file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub name: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Execution role used by functions that declare none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Command run before any deploy phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_hook: Option<String>,
    /// Routing container id, recorded after first creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_id: Option<RemoteId>,
    #[serde(default = "default_runtime")]
    pub runtime: String,
    /// Credentials role used by storage passthrough wiring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_role: Option<String>,
}

impl ProjectSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: default_region(),
            profile: None,
            default_role: None,
            bucket: None,
            deploy_hook: None,
            api_id: None,
            runtime: default_runtime(),
            storage_role: None,
        }
    }

    /// Configured bucket, else `ginger-<project name>`
    pub fn bucket_name(&self) -> String {
        match self.bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() => bucket.to_string(),
            _ => format!("ginger-{}", self.name.to_ascii_lowercase()),
        }
    }

    pub fn storage_role(&self) -> Result<&str, ConfigurationError> {
        self.storage_role
            .as_deref()
            .filter(|r| !r.is_empty())
            .or(self.default_role.as_deref().filter(|r| !r.is_empty()))
            .ok_or(ConfigurationError::MissingSetting("storage_role"))
    }

    /// Hook command, ignoring blank values
    pub fn hook(&self) -> Option<&str> {
        self.deploy_hook
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let settings: ProjectSettings = toml::from_str("name = \"Shop\"").unwrap();
        assert_eq!(settings.region, DEFAULT_REGION);
        assert_eq!(settings.runtime, DEFAULT_RUNTIME);
        assert_eq!(settings.bucket_name(), "ginger-shop");
        assert!(settings.hook().is_none());
    }

    #[test]
    fn test_storage_role_falls_back_to_default() {
        let mut settings = ProjectSettings::new("shop");
        assert!(settings.storage_role().is_err());
        settings.default_role = Some("arn:role/default".into());
        assert_eq!(settings.storage_role().unwrap(), "arn:role/default");
        settings.storage_role = Some("arn:role/s3".into());
        assert_eq!(settings.storage_role().unwrap(), "arn:role/s3");
    }

    #[test]
    fn test_blank_hook_is_ignored() {
        let mut settings = ProjectSettings::new("shop");
        settings.deploy_hook = Some("   ".into());
        assert!(settings.hook().is_none());
        settings.deploy_hook = Some(" make assets ".into());
        assert_eq!(settings.hook(), Some("make assets"));
    }
}
