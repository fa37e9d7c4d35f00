//! Line classifier for Claude CLI stream-json output.
//!
//! Every line the CLI writes is either blank, a JSON object tagged by a
//! top-level `type` field, or noise (stderr is merged into the same stream).

use serde::Deserialize;
use serde_json::Value;

/// Message used when an `error` line carries no usable `error` field.
pub const UNKNOWN_CLI_ERROR: &str = "Unknown CLI error";

/// Error returned when a non-blank line is not a JSON document.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// The line could not be parsed as JSON.
    #[error("Malformed line: {reason}")]
    Malformed {
        /// The raw input that failed to parse.
        input: String,
        /// Parser error message.
        reason: String,
    },
}

/// A single classified line of CLI output.
#[derive(Debug, Clone, PartialEq)]
pub enum CliLine {
    /// Empty or whitespace-only line.
    Blank,
    /// `{"type":"stream_event", ...}`; `event` is the nested event object, if any.
    StreamEvent {
        /// Nested event payload.
        event: Option<Value>,
    },
    /// `{"type":"error", ...}` reported by the CLI itself.
    Error {
        /// Human-readable error message.
        message: String,
    },
    /// Valid JSON with a missing or unknown `type`.
    Unrecognized,
}

#[derive(Debug, Default, Deserialize)]
struct RawLine {
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(default)]
    event: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl CliLine {
    /// Classify one raw line.
    ///
    /// Blank input short-circuits before any parsing is attempted.
    ///
    /// # Errors
    ///
    /// Returns `LineError::Malformed` if the line is not valid JSON. Callers
    /// are expected to log and skip such lines.
    pub fn classify(line: &str) -> Result<Self, LineError> {
        if line.trim().is_empty() {
            return Ok(Self::Blank);
        }

        let value: Value = serde_json::from_str(line).map_err(|e| LineError::Malformed {
            input: line.to_string(),
            reason: e.to_string(),
        })?;

        // Scalars and arrays parse fine but carry no `type`.
        let raw = RawLine::deserialize(value).unwrap_or_default();

        match raw.kind.as_ref().and_then(Value::as_str) {
            Some("stream_event") => Ok(Self::StreamEvent {
                event: raw.event.filter(|e| !e.is_null()),
            }),
            Some("error") => Ok(Self::Error {
                message: error_message(raw.error),
            }),
            _ => Ok(Self::Unrecognized),
        }
    }

    /// Returns true if this line should be skipped without further work.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

fn error_message(error: Option<Value>) -> String {
    match error {
        None | Some(Value::Null) => UNKNOWN_CLI_ERROR.to_string(),
        Some(Value::String(message)) => message,
        Some(Value::Object(map)) => match map.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => Value::Object(map).to_string(),
        },
        Some(other) => other.to_string(),
    }
}
