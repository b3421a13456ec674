//! External update action
//!
//! Runs an executable as `<path> --old=<address> --new=<address>`. Exit
//! status 0 is success; a nonzero exit or a failure to spawn is an
//! [`Error::Action`] carrying the captured stderr.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::Error;
use crate::traits::update_action::UpdateAction;

/// Update action backed by an external executable
#[derive(Debug, Clone)]
pub struct ScriptAction {
    path: PathBuf,
}

impl ScriptAction {
    /// Create an action that runs the executable at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the executable
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UpdateAction for ScriptAction {
    async fn apply(&self, old: &str, new: &str) -> Result<(), Error> {
        let output = Command::new(&self.path)
            .arg(format!("--old={}", old))
            .arg(format!("--new={}", new))
            .output()
            .await
            .map_err(|e| {
                Error::action(format!("failed to run {}: {}", self.path.display(), e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(action = %self.path.display(), "action output: {}", stdout.trim());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::action(format!(
                "{} exited with {}: {}",
                self.path.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}
