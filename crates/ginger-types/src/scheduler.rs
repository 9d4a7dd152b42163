//! Time-triggered rules

use crate::error::ValidationError;
use crate::function::validate_name;
use crate::ids::RemoteId;
use serde::{Deserialize, Serialize};

fn enabled_by_default() -> bool {
    true
}

/// A scheduled rule, persisted one file per scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduler {
    pub name: String,
    #[serde(default, rename = "arn", skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<RemoteId>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// `cron(...)` or `rate(...)`; passed through untouched
    pub expression: String,
    #[serde(default)]
    pub functions: Vec<String>,
}

impl Scheduler {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote_id: None,
            enabled: true,
            expression: expression.into(),
            functions: Vec::new(),
        }
    }

    /// Attach a function; returns false if it was already attached
    pub fn attach(&mut self, function: &str) -> bool {
        if self.functions.iter().any(|f| f == function) {
            return false;
        }
        self.functions.push(function.to_string());
        true
    }

    pub fn detach(&mut self, function: &str) -> bool {
        let before = self.functions.len();
        self.functions.retain(|f| f != function);
        before != self.functions.len()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("scheduler name", &self.name)?;
        if self.expression.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "schedule expression",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_is_unique() {
        let mut scheduler = Scheduler::new("nightly", "rate(1 day)");
        assert!(scheduler.attach("cleanup"));
        assert!(!scheduler.attach("cleanup"));
        assert!(scheduler.attach("report"));
        assert_eq!(scheduler.functions, vec!["cleanup", "report"]);
        assert!(scheduler.detach("cleanup"));
        assert!(!scheduler.detach("cleanup"));
    }

    #[test]
    fn test_validate_expression() {
        assert!(Scheduler::new("nightly", "cron(0 3 * * ? *)").validate().is_ok());
        assert!(Scheduler::new("nightly", "  ").validate().is_err());
    }
}
