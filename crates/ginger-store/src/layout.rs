//! Project directory layout

use crate::error::{Result, StoreError};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PROJECT_FILE: &str = "Ginger.toml";

/// Resolved paths of one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Layout rooted at `root`, without checking that it exists
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk up from `start` until a directory containing `Ginger.toml` is found
    pub fn discover(start: &Path) -> Result<Self> {
        for dir in start.ancestors() {
            if dir.join(PROJECT_FILE).is_file() {
                debug!(root = %dir.display(), "Project root found");
                return Ok(Self::new(dir));
            }
        }
        Err(StoreError::ProjectNotFound(start.to_path_buf()))
    }

    /// Create the project directories under `root`.
    ///
    /// Fails if the project file already exists.
    pub fn scaffold(root: &Path) -> Result<Self> {
        let layout = Self::new(root);
        if layout.project_file().exists() {
            return Err(StoreError::AlreadyInitialized(root.to_path_buf()));
        }
        for dir in [
            layout.functions_dir(),
            layout.storage_dir(),
            layout.schedulers_dir(),
            layout.stages_dir(),
            layout.build_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_file(&self) -> PathBuf {
        self.root.join(PROJECT_FILE)
    }

    pub fn functions_dir(&self) -> PathBuf {
        self.root.join("functions")
    }

    pub fn function_dir(&self, name: &str) -> PathBuf {
        self.functions_dir().join(name)
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.root.join("storage")
    }

    pub fn schedulers_dir(&self) -> PathBuf {
        self.root.join("schedulers")
    }

    pub fn stages_dir(&self) -> PathBuf {
        self.root.join("stages")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(".ginger").join("build")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "").unwrap();
        let nested = dir.path().join("functions").join("hello");
        std::fs::create_dir_all(&nested).unwrap();

        let layout = ProjectLayout::discover(&nested).unwrap();
        assert_eq!(layout.root(), dir.path());
        assert_eq!(layout.function_dir("hello"), nested);
    }

    #[test]
    fn test_discover_without_project() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProjectLayout::discover(dir.path()),
            Err(StoreError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_scaffold_refuses_existing_project() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::scaffold(dir.path()).unwrap();
        assert!(layout.storage_dir().is_dir());
        assert!(layout.build_dir().is_dir());

        std::fs::write(layout.project_file(), "").unwrap();
        assert!(matches!(
            ProjectLayout::scaffold(dir.path()),
            Err(StoreError::AlreadyInitialized(_))
        ));
    }
}
