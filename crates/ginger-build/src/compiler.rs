//! Compiler seam

use crate::error::{BuildError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Placeholder replaced with the artifact path in compiler arguments
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// One function to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUnit {
    pub name: String,
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
}

/// Turns a source directory into a single artifact file
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Compile `unit`, returning the artifact path on success
    async fn compile(&self, unit: &BuildUnit) -> Result<PathBuf>;
}

/// Runs an external toolchain command inside the function's source directory
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    entry_file: Option<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            entry_file: None,
        }
    }

    /// `go build -o {output}` cross-compiled for linux/amd64
    pub fn go() -> Self {
        Self::new("go")
            .arg("build")
            .arg("-o")
            .arg(OUTPUT_PLACEHOLDER)
            .env("GOOS", "linux")
            .env("GOARCH", "amd64")
            .entry_file("main.go")
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// File that must exist in the source directory before compiling
    pub fn entry_file(mut self, file: impl Into<String>) -> Self {
        self.entry_file = Some(file.into());
        self
    }

    fn render_args(&self, unit: &BuildUnit) -> Vec<String> {
        let output = unit.output_path.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace(OUTPUT_PLACEHOLDER, &output))
            .collect()
    }
}

impl Default for CommandCompiler {
    fn default() -> Self {
        Self::go()
    }
}

#[async_trait]
impl Compiler for CommandCompiler {
    async fn compile(&self, unit: &BuildUnit) -> Result<PathBuf> {
        if !unit.source_dir.is_dir() {
            return Err(BuildError::MissingSource(unit.source_dir.clone()));
        }
        if let Some(entry) = &self.entry_file {
            let entry = unit.source_dir.join(entry);
            if !entry.is_file() {
                return Err(BuildError::MissingEntry(entry));
            }
        }
        if let Some(parent) = unit.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.render_args(unit);
        debug!(function = %unit.name, program = %self.program, ?args, "Compiling");

        let output = Command::new(&self.program)
            .args(&args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&unit.source_dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| BuildError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let diagnostics = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(BuildError::CompileFailed {
                function: unit.name.clone(),
                diagnostics,
            });
        }

        if !unit.output_path.is_file() {
            return Err(BuildError::MissingArtifact(unit.output_path.clone()));
        }
        Ok(unit.output_path.clone())
    }
}
