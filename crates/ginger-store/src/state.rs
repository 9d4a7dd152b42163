//! Local state loaded for one command invocation

use crate::definitions::DefinitionDir;
use crate::document::ProjectDocument;
use crate::error::{Result, StoreError};
use crate::layout::ProjectLayout;
use ginger_types::{ProjectSettings, Scheduler, Stage};
use tracing::debug;

/// Everything a command may read or mutate locally
#[derive(Debug, Clone)]
pub struct LocalState {
    pub layout: ProjectLayout,
    pub document: ProjectDocument,
    pub schedulers: Vec<Scheduler>,
}

impl LocalState {
    /// Fresh state for a project that has not been written yet
    pub fn init(layout: ProjectLayout, project: ProjectSettings) -> Self {
        Self {
            layout,
            document: ProjectDocument::new(project),
            schedulers: Vec::new(),
        }
    }

    pub fn load(layout: ProjectLayout) -> Result<Self> {
        let path = layout.project_file();
        if !path.is_file() {
            return Err(StoreError::ProjectNotFound(layout.root().to_path_buf()));
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let document = ProjectDocument::parse(&path, &contents)?;
        let schedulers = DefinitionDir::<Scheduler>::new(layout.schedulers_dir()).load_all()?;

        debug!(
            project = %document.project.name,
            functions = document.functions.len(),
            resources = document.resources.len(),
            schedulers = schedulers.len(),
            "Local state loaded"
        );

        Ok(Self {
            layout,
            document,
            schedulers,
        })
    }

    pub fn scheduler_dir(&self) -> DefinitionDir<Scheduler> {
        DefinitionDir::new(self.layout.schedulers_dir())
    }

    pub fn stage_dir(&self) -> DefinitionDir<Stage> {
        DefinitionDir::new(self.layout.stages_dir())
    }

    pub fn scheduler(&self, name: &str) -> Result<&Scheduler> {
        self.schedulers
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| StoreError::DefinitionNotFound {
                kind: "Scheduler",
                name: name.to_string(),
            })
    }

    pub fn scheduler_mut(&mut self, name: &str) -> Result<&mut Scheduler> {
        self.schedulers
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| StoreError::DefinitionNotFound {
                kind: "Scheduler",
                name: name.to_string(),
            })
    }

    /// Trigger `function` from scheduler `name`; returns false if it already was.
    ///
    /// The function's schedule reference follows the latest attachment.
    pub fn attach_function(&mut self, name: &str, function: &str) -> Result<bool> {
        self.document.function(function)?;
        let attached = self.scheduler_mut(name)?.attach(function);
        self.document.function_mut(function)?.schedule = Some(name.to_string());
        Ok(attached)
    }

    /// Stop triggering `function` from scheduler `name`; returns false if it
    /// was not attached
    pub fn detach_function(&mut self, name: &str, function: &str) -> Result<bool> {
        if !self.scheduler_mut(name)?.detach(function) {
            return Ok(false);
        }
        self.repoint_schedule(name, function);
        Ok(true)
    }

    /// Drop scheduler `name` from memory, repointing the functions it triggered
    pub fn remove_scheduler(&mut self, name: &str) -> Option<Scheduler> {
        let index = self.schedulers.iter().position(|s| s.name == name)?;
        let removed = self.schedulers.remove(index);
        for function in &removed.functions {
            self.repoint_schedule(name, function);
        }
        Some(removed)
    }

    /// A function whose reference named `detached` falls back to any other
    /// scheduler still triggering it
    fn repoint_schedule(&mut self, detached: &str, function: &str) {
        let fallback = self
            .schedulers
            .iter()
            .find(|s| s.functions.iter().any(|f| f == function))
            .map(|s| s.name.clone());
        if let Ok(f) = self.document.function_mut(function) {
            if f.schedule.as_deref() == Some(detached) {
                f.schedule = fallback;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ginger_types::Function;

    #[test]
    fn test_load_requires_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        assert!(matches!(
            LocalState::load(layout),
            Err(StoreError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_load_reads_scheduler_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::scaffold(dir.path()).unwrap();
        std::fs::write(layout.project_file(), "[project]\nname = \"shop\"\n").unwrap();
        std::fs::write(
            layout.schedulers_dir().join("nightly.toml"),
            "name = \"nightly\"\nexpression = \"rate(1 day)\"\nfunctions = [\"cleanup\"]\n",
        )
        .unwrap();

        let state = LocalState::load(layout).unwrap();
        let nightly = state.scheduler("nightly").unwrap();
        assert!(nightly.enabled);
        assert_eq!(nightly.functions, vec!["cleanup"]);
        assert!(state.scheduler("hourly").is_err());
    }

    fn state_with(functions: &[&str], schedulers: &[&str]) -> LocalState {
        let dir = tempfile::tempdir().unwrap();
        let mut state =
            LocalState::init(ProjectLayout::new(dir.path()), ProjectSettings::new("shop"));
        for name in functions {
            state.document.add_function(Function::new(*name)).unwrap();
        }
        for name in schedulers {
            state.schedulers.push(Scheduler::new(*name, "rate(1 hour)"));
        }
        state
    }

    fn schedule_of<'a>(state: &'a LocalState, function: &str) -> Option<&'a str> {
        state.document.function(function).unwrap().schedule.as_deref()
    }

    #[test]
    fn test_attach_records_schedule_on_function() {
        let mut state = state_with(&["cleanup"], &["nightly"]);

        assert!(state.attach_function("nightly", "cleanup").unwrap());
        assert!(!state.attach_function("nightly", "cleanup").unwrap());
        assert_eq!(schedule_of(&state, "cleanup"), Some("nightly"));
        assert!(matches!(
            state.attach_function("nightly", "missing"),
            Err(StoreError::FunctionNotFound(_))
        ));
        assert_eq!(state.scheduler("nightly").unwrap().functions, vec!["cleanup"]);
    }

    #[test]
    fn test_detach_falls_back_to_remaining_scheduler() {
        let mut state = state_with(&["cleanup"], &["nightly", "hourly"]);
        state.attach_function("hourly", "cleanup").unwrap();
        state.attach_function("nightly", "cleanup").unwrap();

        assert!(state.detach_function("nightly", "cleanup").unwrap());
        assert_eq!(schedule_of(&state, "cleanup"), Some("hourly"));
        assert!(!state.detach_function("nightly", "cleanup").unwrap());

        assert!(state.detach_function("hourly", "cleanup").unwrap());
        assert_eq!(schedule_of(&state, "cleanup"), None);
    }

    #[test]
    fn test_remove_scheduler_clears_references() {
        let mut state = state_with(&["cleanup", "report"], &["nightly"]);
        state.attach_function("nightly", "cleanup").unwrap();
        state.attach_function("nightly", "report").unwrap();

        let removed = state.remove_scheduler("nightly").unwrap();
        assert_eq!(removed.functions, vec!["cleanup", "report"]);
        assert_eq!(schedule_of(&state, "cleanup"), None);
        assert_eq!(schedule_of(&state, "report"), None);
        assert!(state.remove_scheduler("nightly").is_none());
    }
}
