//! Run error types.
//!
//! Only fatal conditions are represented here. Per-line problems
//! ([`LineError`](crate::cli::LineError) and
//! [`DecodeError`](crate::cli::DecodeError)) are logged and skipped by the
//! read loop and never become a `RunError`.

use crate::cli::SpawnError;

/// Fatal errors that end a run with [`RunOutcome::Failed`](crate::stream::RunOutcome).
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    /// The CLI process could not be started.
    #[error("Failed to launch Claude CLI: {0}")]
    Launch(#[from] SpawnError),
    /// The CLI reported an error line; the message is passed through verbatim.
    #[error("{0}")]
    Upstream(String),
    /// The CLI exited with a failing code after its output ended.
    #[error("Claude CLI exited with code {0}")]
    NonZeroExit(i32),
    /// Reading output or reaping the process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The process was spawned without an output pipe.
    #[error("Claude CLI output not available")]
    NoOutput,
}

impl RunError {
    /// Returns true if the failure came from the CLI's own error line.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}
