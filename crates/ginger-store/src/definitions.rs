//! One-file-per-entity definition directories (schedulers, stages)

use crate::error::{Result, StoreError};
use crate::writer;
use ginger_types::{Scheduler, Stage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An entity persisted as `<dir>/<name>.toml`
pub trait Definition: Serialize + DeserializeOwned {
    /// Human-readable kind used in errors
    const KIND: &'static str;

    fn name(&self) -> &str;
}

impl Definition for Scheduler {
    const KIND: &'static str = "Scheduler";

    fn name(&self) -> &str {
        &self.name
    }
}

impl Definition for Stage {
    const KIND: &'static str = "Stage";

    fn name(&self) -> &str {
        &self.name
    }
}

/// Directory of definition files of a single kind
#[derive(Debug, Clone)]
pub struct DefinitionDir<T> {
    dir: PathBuf,
    _kind: PhantomData<T>,
}

impl<T: Definition> DefinitionDir<T> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _kind: PhantomData,
        }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.toml", name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    pub fn load(&self, name: &str) -> Result<T> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Err(StoreError::DefinitionNotFound {
                kind: T::KIND,
                name: name.to_string(),
            });
        }
        read(&path)
    }

    /// Every definition in the directory, sorted by file name.
    ///
    /// A missing directory yields an empty list.
    pub fn load_all(&self) -> Result<Vec<T>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("toml") {
                paths.push(path);
            }
        }
        paths.sort();
        paths.iter().map(|p| read(p)).collect()
    }

    /// Write a new definition; fails if one with the same name exists
    pub fn create(&self, definition: &T) -> Result<()> {
        if self.exists(definition.name()) {
            return Err(StoreError::DefinitionExists {
                kind: T::KIND,
                name: definition.name().to_string(),
            });
        }
        self.save(definition)
    }

    /// Write (or overwrite) a definition
    pub fn save(&self, definition: &T) -> Result<()> {
        let encoded = toml::to_string_pretty(definition)?;
        let path = self.path_of(definition.name());
        writer::write_atomic(&path, encoded.as_bytes())?;
        debug!(kind = T::KIND, name = definition.name(), "Definition saved");
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Err(StoreError::DefinitionNotFound {
                kind: T::KIND,
                name: name.to_string(),
            });
        }
        std::fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))
    }
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    toml::from_str(&contents).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_files() {
        let dir = tempfile::tempdir().unwrap();
        let schedulers = DefinitionDir::<Scheduler>::new(dir.path().join("schedulers"));
        assert!(schedulers.load_all().unwrap().is_empty());

        let mut nightly = Scheduler::new("nightly", "rate(1 day)");
        nightly.attach("cleanup");
        schedulers.create(&nightly).unwrap();
        schedulers
            .create(&Scheduler::new("hourly", "rate(1 hour)"))
            .unwrap();

        assert!(matches!(
            schedulers.create(&nightly),
            Err(StoreError::DefinitionExists { kind: "Scheduler", .. })
        ));

        let all = schedulers.load_all().unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["hourly", "nightly"]);
        assert_eq!(schedulers.load("nightly").unwrap(), nightly);

        schedulers.delete("hourly").unwrap();
        assert!(matches!(
            schedulers.load("hourly"),
            Err(StoreError::DefinitionNotFound { .. })
        ));
    }

    #[test]
    fn test_stage_file_shape() {
        let dir = tempfile::tempdir().unwrap();
        let stages = DefinitionDir::<Stage>::new(dir.path());
        std::fs::write(stages.path_of("prod"), "name = \"prod\"\n\n[variables]\n").unwrap();
        let prod = stages.load("prod").unwrap();
        assert_eq!(prod.name, "prod");
        assert!(prod.variables.is_empty());
    }
}
