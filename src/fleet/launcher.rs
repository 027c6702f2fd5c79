//! External process launching for fleet slots.
//!
//! Launching is fire-and-forget: the supervisor never observes process exit
//! directly, only through connect/poll failures on the IPC channel.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

/// Errors from launching a client process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Spawning the executable failed (missing binary, permissions, ...).
    #[error("failed to spawn client process from {path}")]
    Spawn {
        /// Executable that could not be spawned.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Launches the external client process for one fleet slot.
pub trait ProcessLauncher: Send + Sync {
    /// Launches the client for `slot`, telling it the fleet's team size.
    fn launch(&self, slot: u32, team_size: u32) -> Result<(), LaunchError>;
}

/// Spawns the real game client executable.
///
/// Invocation contract: `<executable> -spectateclient <slot> <team_size>`.
#[derive(Debug, Clone)]
pub struct GameProcessLauncher {
    executable: PathBuf,
}

impl GameProcessLauncher {
    /// Creates a launcher for the given executable path.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Path of the executable this launcher spawns.
    pub fn executable(&self) -> &PathBuf {
        &self.executable
    }
}

impl ProcessLauncher for GameProcessLauncher {
    fn launch(&self, slot: u32, team_size: u32) -> Result<(), LaunchError> {
        let child = Command::new(&self.executable)
            .arg("-spectateclient")
            .arg(slot.to_string())
            .arg(team_size.to_string())
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                path: self.executable.clone(),
                source: e,
            })?;

        tracing::info!(slot, pid = child.id(), "launched client process");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_failure_surfaces_executable_path() {
        let launcher = GameProcessLauncher::new("/nonexistent/spectator-client");
        let err = launcher.launch(0, 1).expect_err("spawn should fail");
        let LaunchError::Spawn { path, .. } = &err;
        assert_eq!(path, &PathBuf::from("/nonexistent/spectator-client"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
