//! Claude Code process spawning and control.
//!
//! This module provides a builder for the streaming invocation of the
//! `claude` binary, along with a handle that owns the running child and
//! guarantees it can be forcibly reaped exactly once.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

use crate::cli::{OutputLines, DEFAULT_LINE_BUFFER};

/// Name of the Claude CLI binary.
pub const DEFAULT_BINARY: &str = "claude";

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The binary was not found.
    #[error("Claude binary not found")]
    NotFound,
    /// Permission denied when spawning.
    #[error("Permission denied")]
    PermissionDenied,
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io(err),
        }
    }
}

/// Builder for the streaming Claude CLI invocation.
#[derive(Debug, Clone)]
pub struct ClaudeProcessBuilder {
    prompt: String,
    model: String,
    binary: String,
    working_dir: Option<PathBuf>,
}

impl ClaudeProcessBuilder {
    /// Create a new builder for the given prompt and model.
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            binary: DEFAULT_BINARY.to_string(),
            working_dir: None,
        }
    }

    /// Use a different binary (for testing or non-standard installs).
    #[must_use]
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the working directory for the Claude process.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Get the working directory, if set.
    #[must_use]
    pub fn get_working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// Get the prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Get the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the binary that will be launched.
    #[must_use]
    pub fn get_binary(&self) -> &str {
        &self.binary
    }

    /// Build the command-line arguments.
    ///
    /// The prompt is always the last argument.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        vec![
            "-p".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
            "--include-partial-messages".to_string(),
            "--model".to_string(),
            self.model.clone(),
            self.prompt.clone(),
        ]
    }
}

/// A running Claude Code process.
#[derive(Debug)]
pub struct ClaudeProcess {
    child: Child,
    terminated: bool,
}

impl ClaudeProcess {
    /// Spawn the configured process.
    ///
    /// Stdin is closed immediately; stdout and stderr are piped so they can
    /// be read as one stream via [`ClaudeProcess::take_output`].
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the process fails to spawn.
    pub fn spawn(builder: &ClaudeProcessBuilder) -> Result<Self, SpawnError> {
        let mut cmd = Command::new(&builder.binary);
        cmd.args(builder.build_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = builder.working_dir {
            cmd.current_dir(dir);
        }

        tracing::info!(model = %builder.model, binary = %builder.binary, "Starting Claude CLI");
        let mut child = cmd.spawn().map_err(SpawnError::from_io)?;

        // No interactive input: dropping the handle closes the pipe.
        drop(child.stdin.take());

        Ok(Self {
            child,
            terminated: false,
        })
    }

    /// Take the combined stdout/stderr line stream.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_output(&mut self) -> Option<OutputLines> {
        let stdout = self.child.stdout.take()?;
        match self.child.stderr.take() {
            Some(stderr) => Some(OutputLines::merge(stdout, stderr, DEFAULT_LINE_BUFFER)),
            None => Some(OutputLines::from_reader(stdout, DEFAULT_LINE_BUFFER)),
        }
    }

    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Check whether the process is still running.
    ///
    /// # Errors
    ///
    /// Returns an error if the process state cannot be queried.
    pub fn is_alive(&mut self) -> std::io::Result<bool> {
        Ok(self.child.try_wait()?.is_none())
    }

    /// Wait for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Forcibly kill the process if it is still running, then reap it.
    ///
    /// Idempotent: returns `Ok(true)` only for the call that actually sent
    /// the kill, `Ok(false)` if the process had already exited or was
    /// already terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if the kill signal cannot be sent.
    pub async fn terminate(&mut self) -> std::io::Result<bool> {
        if self.terminated || !self.is_alive()? {
            return Ok(false);
        }
        self.child.kill().await?;
        self.terminated = true;
        tracing::debug!("Claude process forcibly terminated");
        Ok(true)
    }

    /// Returns true if [`ClaudeProcess::terminate`] killed the process.
    #[must_use]
    pub fn was_terminated(&self) -> bool {
        self.terminated
    }
}

/// Map an exit status to an integer exit code.
///
/// Signal deaths have no code and map to `-1`.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
