//! Shared fixture for end-to-end reconciliation tests

#![allow(dead_code)]

use async_trait::async_trait;
use ginger_build::{BuildError, BuildUnit, Compiler};
use ginger_deploy::Orchestrator;
use ginger_gateway::{Gateways, InMemoryCloud};
use ginger_store::{LocalState, ProjectLayout};
use ginger_types::{Function, HttpMethod, Integration, ProjectSettings, RemoteId, Resource, Scheduler};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const ROLE: &str = "arn:aws:iam::123456789012:role/ginger-exec";

/// Writes a fake binary; functions named `broken*` fail to compile
pub struct FakeCompiler;

#[async_trait]
impl Compiler for FakeCompiler {
    async fn compile(&self, unit: &BuildUnit) -> Result<PathBuf, BuildError> {
        if unit.name.starts_with("broken") {
            return Err(BuildError::CompileFailed {
                function: unit.name.clone(),
                diagnostics: "syntax error: unexpected }".into(),
            });
        }
        if let Some(parent) = unit.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&unit.output_path, format!("binary:{}", unit.name)).await?;
        Ok(unit.output_path.clone())
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub cloud: Arc<InMemoryCloud>,
    pub state: LocalState,
    pub orchestrator: Orchestrator,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::scaffold(dir.path()).unwrap();
        let mut settings = ProjectSettings::new("shop");
        settings.default_role = Some(ROLE.to_string());
        let state = LocalState::init(layout, settings);

        let cloud = Arc::new(InMemoryCloud::new());
        let orchestrator = Orchestrator::new(Gateways::in_memory(cloud.clone()))
            .with_compiler(Arc::new(FakeCompiler));

        Self {
            dir,
            cloud,
            state,
            orchestrator,
        }
    }

    pub fn add_function(&mut self, name: &str) {
        self.state.document.add_function(Function::new(name)).unwrap();
        std::fs::create_dir_all(self.state.layout.function_dir(name)).unwrap();
    }

    pub fn add_resource(&mut self, path: &str) -> &mut Resource {
        self.state.document.resources.insert(Resource::new(path)).unwrap()
    }

    pub fn bind_function(&mut self, path: &str, method: HttpMethod, function: &str) {
        self.state
            .document
            .resources
            .find_mut(path)
            .unwrap()
            .add_integration(method, Integration::function(function));
    }

    pub fn add_scheduler(&mut self, name: &str, functions: &[&str]) {
        let mut scheduler = Scheduler::new(name, "rate(1 hour)");
        for function in functions {
            scheduler.attach(function);
        }
        self.state.schedulers.push(scheduler);
    }

    pub fn write_storage_file(&self, key: &str, contents: &[u8]) {
        let path = self.state.layout.storage_dir().join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    pub fn container(&self) -> RemoteId {
        self.state.document.project.api_id.clone().unwrap()
    }

    pub fn local_id(&self, path: &str) -> Option<RemoteId> {
        self.state.document.resources.remote_id(path).cloned()
    }

    pub fn remote_id(&self, path: &str) -> Option<RemoteId> {
        self.cloud.resource_id(&self.container(), path)
    }
}
