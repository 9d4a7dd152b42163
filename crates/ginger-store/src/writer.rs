//! Local state writer
//!
//! All durable writes go through a process-wide lock and land via
//! write-to-temp-then-rename, so a crash mid-write leaves the previous file
//! intact. Separate processes are not coordinated.

use crate::error::{Result, StoreError};
use crate::state::LocalState;
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// Serializes local state back to disk
#[derive(Debug, Default, Clone, Copy)]
pub struct StateWriter;

impl StateWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write the project file and every scheduler file
    pub fn persist(&self, state: &LocalState) -> Result<()> {
        let _guard = WRITE_LOCK.lock();

        let document = state.document.encode()?;
        write_file(&state.layout.project_file(), document.as_bytes())?;

        let schedulers = state.scheduler_dir();
        for scheduler in &state.schedulers {
            let encoded = toml::to_string_pretty(scheduler)?;
            write_file(&schedulers.path_of(&scheduler.name), encoded.as_bytes())?;
        }

        info!(
            root = %state.layout.root().display(),
            functions = state.document.functions.len(),
            resources = state.document.resources.len(),
            schedulers = state.schedulers.len(),
            "Local state persisted"
        );
        Ok(())
    }
}

/// Atomically replace `path` with `bytes` under the process-wide lock
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let _guard = WRITE_LOCK.lock();
    write_file(path, bytes)
}

/// Lock-free variant; callers must already hold `WRITE_LOCK`
fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "File written");
    Ok(())
}
