//! Build error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while compiling or packaging a single function
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Source directory not found: {0}")]
    MissingSource(PathBuf),

    #[error("Entry file not found: {0}")]
    MissingEntry(PathBuf),

    #[error("Failed to launch compiler '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Compilation of {function} failed: {diagnostics}")]
    CompileFailed {
        function: String,
        diagnostics: String,
    },

    #[error("Compiler succeeded but produced no artifact at {0}")]
    MissingArtifact(PathBuf),

    #[error("Build task for {function} aborted: {reason}")]
    Aborted { function: String, reason: String },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for build operations
pub type Result<T> = std::result::Result<T, BuildError>;
