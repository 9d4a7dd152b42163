//! Pre-deploy hook
//!
//! A user command run in the project root before any deploy phase. A
//! non-zero exit aborts the deploy before anything remote is touched.

use crate::error::{DeployError, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, instrument};

fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run `command` through the platform shell with `root` as working directory
#[instrument(skip(root), fields(root = %root.display()))]
pub async fn run_hook(command: &str, root: &Path) -> Result<()> {
    info!("Running pre-deploy hook");

    let output = shell(command)
        .current_dir(root)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| DeployError::HookLaunch {
            command: command.to_string(),
            source,
        })?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!(target: "ginger::hook", "{}", line);
    }

    if !output.status.success() {
        return Err(DeployError::HookFailed {
            command: command.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    info!("Pre-deploy hook finished");
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hook_runs_in_project_root() {
        let dir = tempfile::tempdir().unwrap();
        run_hook("echo built > hook.out", dir.path()).await.unwrap();
        let written = std::fs::read_to_string(dir.path().join("hook.out")).unwrap();
        assert_eq!(written.trim(), "built");
    }

    #[tokio::test]
    async fn test_hook_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_hook("echo boom >&2; exit 3", dir.path()).await.unwrap_err();
        match err {
            DeployError::HookFailed { stderr, status, .. } => {
                assert_eq!(stderr, "boom");
                assert!(status.contains('3'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
