//! Run state machine.

use serde::{Deserialize, Serialize};

use crate::stream::RunOutcome;

/// Lifecycle state of a conversation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// No run has started yet.
    #[default]
    Idle,
    /// A run is reading process output.
    Running,
    /// The last run closed normally.
    Completed,
    /// The last run ended with an error.
    Failed,
    /// The last run was cancelled.
    Cancelled,
}

impl RunState {
    /// Returns true for the three end states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl From<&RunOutcome> for RunState {
    fn from(outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => Self::Completed,
            RunOutcome::Failed { .. } => Self::Failed,
            RunOutcome::Cancelled => Self::Cancelled,
        }
    }
}

/// State machine for tracking run progress.
#[derive(Debug, Clone, Default)]
pub struct RunStateMachine {
    state: RunState,
    lines: usize,
    skipped: usize,
    messages: usize,
}

impl RunStateMachine {
    /// Create a machine in `Idle` with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Move to `new_state`, logging the change.
    pub fn transition(&mut self, new_state: RunState) {
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }

    /// Enter `Running`, clearing counters from any previous run.
    pub fn start(&mut self) {
        self.lines = 0;
        self.skipped = 0;
        self.messages = 0;
        self.transition(RunState::Running);
    }

    /// Enter the terminal state matching `outcome`.
    pub fn finish(&mut self, outcome: &RunOutcome) {
        self.transition(outcome.into());
    }

    /// Count a line read from the process.
    pub fn record_line(&mut self) {
        self.lines = self.lines.saturating_add(1);
    }

    /// Count a line dropped as unreadable.
    pub fn record_skipped(&mut self) {
        self.skipped = self.skipped.saturating_add(1);
    }

    /// Count a published message.
    pub fn record_message(&mut self) {
        self.messages = self.messages.saturating_add(1);
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> RunStats {
        RunStats {
            lines: self.lines,
            skipped: self.skipped,
            messages: self.messages,
        }
    }
}

/// Counters for the current or most recent run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Lines read from the process.
    pub lines: usize,
    /// Lines dropped as malformed or undecodable.
    pub skipped: usize,
    /// Messages published.
    pub messages: usize,
}
