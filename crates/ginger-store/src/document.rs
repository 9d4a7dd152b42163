//! The project file

use crate::error::{Result, StoreError};
use crate::resources::ResourceStore;
use ginger_types::{Function, ProjectSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decoded `Ginger.toml`: settings, the flat function list and the resource tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub project: ProjectSettings,
    #[serde(default, rename = "function")]
    pub functions: Vec<Function>,
    #[serde(default, rename = "resource")]
    pub resources: ResourceStore,
}

impl ProjectDocument {
    pub fn new(project: ProjectSettings) -> Self {
        Self {
            project,
            functions: Vec::new(),
            resources: ResourceStore::new(),
        }
    }

    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn encode(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn function(&self, name: &str) -> Result<&Function> {
        self.functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| StoreError::FunctionNotFound(name.to_string()))
    }

    pub fn function_mut(&mut self, name: &str) -> Result<&mut Function> {
        self.functions
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| StoreError::FunctionNotFound(name.to_string()))
    }

    /// Add a validated function; names are unique
    pub fn add_function(&mut self, function: Function) -> Result<()> {
        function.validate()?;
        if self.functions.iter().any(|f| f.name == function.name) {
            return Err(StoreError::FunctionExists(function.name));
        }
        self.functions.push(function);
        Ok(())
    }

    pub fn remove_function(&mut self, name: &str) -> Result<Function> {
        let index = self
            .functions
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| StoreError::FunctionNotFound(name.to_string()))?;
        Ok(self.functions.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ginger_types::{HttpMethod, Integration, RemoteId, Resource};

    const SAMPLE: &str = r#"
[project]
name = "shop"
region = "ap-northeast-1"
default_role = "arn:aws:iam::123456789012:role/lambda"

[[function]]
name = "hello"
arn = "arn:aws:lambda:ap-northeast-1:123456789012:function:hello"
memory_size = 256

[[resource]]
path = "/"
id = "root123"

[[resource]]
path = "users/"
user_defined = true

[resource.integrations.GET]
type = "function"
function = "hello"
"#;

    #[test]
    fn test_parse_sample() {
        let doc = ProjectDocument::parse(Path::new("Ginger.toml"), SAMPLE).unwrap();
        assert_eq!(doc.project.name, "shop");
        assert_eq!(doc.functions.len(), 1);
        assert_eq!(doc.functions[0].memory_size, 256);
        assert_eq!(doc.functions[0].timeout, 3);
        assert!(doc.functions[0].is_deployed());

        let users = doc.resources.find("/users").unwrap();
        assert!(users.user_defined);
        assert_eq!(
            users.integration(HttpMethod::Get),
            Some(&Integration::function("hello"))
        );
        assert_eq!(doc.resources.remote_id("/"), Some(&RemoteId::new("root123")));
    }

    #[test]
    fn test_encode_then_parse_preserves_document() {
        let mut doc = ProjectDocument::new(ProjectSettings::new("shop"));
        doc.add_function(Function::new("hello")).unwrap();
        let mut resource = Resource::new("/assets");
        resource.add_integration(HttpMethod::Get, Integration::storage("bucket", "static"));
        doc.resources.insert(resource).unwrap();

        let encoded = doc.encode().unwrap();
        let decoded = ProjectDocument::parse(Path::new("Ginger.toml"), &encoded).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ProjectDocument::parse(Path::new("/tmp/Ginger.toml"), "[project").unwrap_err();
        assert!(err.to_string().contains("/tmp/Ginger.toml"));
    }

    #[test]
    fn test_function_registry() {
        let mut doc = ProjectDocument::new(ProjectSettings::new("shop"));
        doc.add_function(Function::new("hello")).unwrap();
        assert!(matches!(
            doc.add_function(Function::new("hello")),
            Err(StoreError::FunctionExists(_))
        ));
        assert!(matches!(
            doc.add_function(Function::new("big").with_memory_size(130)),
            Err(StoreError::Validation(_))
        ));
        doc.function_mut("hello").unwrap().timeout = 10;
        assert_eq!(doc.function("hello").unwrap().timeout, 10);
        doc.remove_function("hello").unwrap();
        assert!(doc.function("hello").is_err());
    }
}
