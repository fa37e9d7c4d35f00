//! Colored terminal rendering of a streamed run.
//!
//! Streamed content goes to stdout untouched so it can be piped; function
//! call fragments are highlighted and run status lines go to stderr.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::stream::{EmissionKind, OutgoingMessage, RunOutcome};

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum number of characters, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Prints messages as they arrive, marking switches between content and
/// function call output.
#[derive(Debug, Default)]
pub struct MessagePrinter {
    last_kind: Option<EmissionKind>,
}

impl MessagePrinter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format one message, including a marker if the kind changed.
    #[must_use]
    pub fn format(&mut self, message: &OutgoingMessage) -> String {
        let switched = self.last_kind.is_some_and(|k| k != message.kind);
        let first_call = self.last_kind.is_none() && message.kind == EmissionKind::FunctionCall;
        self.last_kind = Some(message.kind);

        match message.kind {
            EmissionKind::Content if switched => format!("\n{}", message.payload),
            EmissionKind::Content => message.payload.clone(),
            EmissionKind::FunctionCall if switched || first_call => format!(
                "\n{} {}",
                "[FUNCTION CALL]".cyan().bold(),
                message.payload.cyan()
            ),
            EmissionKind::FunctionCall => message.payload.cyan().to_string(),
        }
    }

    /// Print one message to stdout.
    pub fn print(&mut self, message: &OutgoingMessage) {
        print!("{}", self.format(message));
        let _ = io::stdout().flush();
    }
}

/// Print run start information.
pub fn print_run_start(model: &str, prompt: &str) {
    eprintln!(
        "{} model={} prompt={}",
        "[RUN]".blue().bold(),
        model.cyan(),
        truncate(prompt, DEFAULT_MAX_LEN).dimmed()
    );
}

/// Print the terminal outcome of a run.
pub fn print_outcome(outcome: &RunOutcome) {
    // Streamed content rarely ends with a newline.
    println!();
    match outcome {
        RunOutcome::Completed => eprintln!("{} Completed", "[RUN]".green().bold()),
        RunOutcome::Failed { cause } => {
            eprintln!("{} {}", "[ERROR]".red().bold(), truncate(cause, 200).red());
        }
        RunOutcome::Cancelled => eprintln!("{} Cancelled", "[RUN]".yellow().bold()),
    }
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
