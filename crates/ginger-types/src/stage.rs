//! Deployment stages

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named deployment snapshot target with free-form variables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
        }
    }
}
