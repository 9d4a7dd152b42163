//! Compute functions

use crate::error::{ConfigurationError, ValidationError};
use crate::ids::RemoteId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MEMORY_SIZE: u32 = 128;
pub const DEFAULT_TIMEOUT: u32 = 3;
pub const MAX_TIMEOUT: u32 = 900;

/// Reject memory sizes below 128 MB or not a multiple of 64
pub fn validate_memory_size(memory_size: u32) -> Result<(), ValidationError> {
    if memory_size < 128 || memory_size % 64 != 0 {
        return Err(ValidationError::InvalidMemorySize(memory_size));
    }
    Ok(())
}

/// Names become directory names and remote identifiers
pub fn validate_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Optional VPC placement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

/// Event source a function is generated for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    #[default]
    Default,
    ApiGateway,
    S3,
    CloudWatch,
    Sqs,
    Kinesis,
}

impl FromStr for EventSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "default" => Ok(EventSource::Default),
            "apigateway" => Ok(EventSource::ApiGateway),
            "s3" => Ok(EventSource::S3),
            "cloudwatch" => Ok(EventSource::CloudWatch),
            "sqs" => Ok(EventSource::Sqs),
            "kinesis" => Ok(EventSource::Kinesis),
            _ => Err(ValidationError::UnsupportedEventSource(s.to_string())),
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventSource::Default => "default",
            EventSource::ApiGateway => "apigateway",
            EventSource::S3 => "s3",
            EventSource::CloudWatch => "cloudwatch",
            EventSource::Sqs => "sqs",
            EventSource::Kinesis => "kinesis",
        };
        f.write_str(name)
    }
}

fn default_memory_size() -> u32 {
    DEFAULT_MEMORY_SIZE
}

fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT
}

/// A compute unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default, rename = "arn", skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<RemoteId>,
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default)]
    pub event_source: EventSource,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote_id: None,
            memory_size: DEFAULT_MEMORY_SIZE,
            timeout: DEFAULT_TIMEOUT,
            role: None,
            environment: BTreeMap::new(),
            network: None,
            schedule: None,
            event_source: EventSource::Default,
        }
    }

    pub fn with_memory_size(mut self, memory_size: u32) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_event_source(mut self, source: EventSource) -> Self {
        self.event_source = source;
        self
    }

    pub fn is_deployed(&self) -> bool {
        self.remote_id.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("function name", &self.name)?;
        validate_memory_size(self.memory_size)?;
        if self.timeout == 0 || self.timeout > MAX_TIMEOUT {
            return Err(ValidationError::InvalidTimeout(self.timeout));
        }
        Ok(())
    }

    /// Function role, else the project default. Empty strings count as unset.
    pub fn effective_role(&self, default_role: Option<&str>) -> Result<String, ConfigurationError> {
        self.role
            .as_deref()
            .filter(|r| !r.is_empty())
            .or(default_role.filter(|r| !r.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| ConfigurationError::MissingExecutionRole {
                function: self.name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_size_validation() {
        for ok in [128, 192, 3008] {
            assert!(validate_memory_size(ok).is_ok(), "{} should be accepted", ok);
        }
        for bad in [0, 64, 100, 130] {
            assert_eq!(
                validate_memory_size(bad),
                Err(ValidationError::InvalidMemorySize(bad))
            );
        }
    }

    #[test]
    fn test_function_validate() {
        assert!(Function::new("hello").validate().is_ok());
        assert!(Function::new("hello").with_memory_size(100).validate().is_err());
        assert!(Function::new("hello").with_timeout(0).validate().is_err());
        assert!(matches!(
            Function::new("").validate(),
            Err(ValidationError::Empty { .. })
        ));
        assert!(matches!(
            Function::new("a/b").validate(),
            Err(ValidationError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_effective_role_fallback() {
        let own = Function::new("f").with_role("arn:role/own");
        assert_eq!(own.effective_role(Some("arn:role/default")).unwrap(), "arn:role/own");

        let inherits = Function::new("f");
        assert_eq!(
            inherits.effective_role(Some("arn:role/default")).unwrap(),
            "arn:role/default"
        );

        let blank = Function::new("f").with_role("");
        assert_eq!(
            blank.effective_role(None),
            Err(ConfigurationError::MissingExecutionRole {
                function: "f".into()
            })
        );
        assert!(inherits.effective_role(Some("")).is_err());
    }

    #[test]
    fn test_event_source_parsing() {
        assert_eq!("apigateway".parse::<EventSource>().unwrap(), EventSource::ApiGateway);
        assert_eq!("".parse::<EventSource>().unwrap(), EventSource::Default);
        assert!("ftp".parse::<EventSource>().is_err());
        assert_eq!(EventSource::Sqs.to_string(), "sqs");
    }
}
