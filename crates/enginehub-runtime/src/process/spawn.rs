//! Engine executable lookup and spawning.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

/// Arguments and extra environment for one engine launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineCommand {
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl EngineCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            envs: Vec::new(),
        }
    }

    /// Append a flag followed by its value.
    #[must_use]
    pub fn arg_with_value(mut self, flag: &str, value: impl ToString) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.to_string());
        self
    }

    #[must_use]
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }
}

/// Locate an engine executable.
///
/// Bare names are searched on `PATH`; anything with a path separator is
/// checked in place. Returns `None` when nothing executable is found.
pub fn resolve_binary(binary: &str) -> Option<PathBuf> {
    match which::which(binary) {
        Ok(path) => {
            debug!("Resolved engine executable '{}' to {}", binary, path.display());
            Some(path)
        }
        Err(e) => {
            debug!("Engine executable '{}' not found: {}", binary, e);
            None
        }
    }
}

/// Spawn an engine process.
///
/// stdout is discarded so an unread pipe can never block the engine;
/// stderr is piped for [`super::spawn_stderr_reader`]. The child is killed
/// if its handle is dropped without being reaped.
pub fn spawn_engine(program: &Path, command: &EngineCommand) -> io::Result<Child> {
    let mut cmd = Command::new(program);
    cmd.args(&command.args)
        .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(program = %program.display(), args = ?command.args, "Spawning engine");
    cmd.spawn()
}
