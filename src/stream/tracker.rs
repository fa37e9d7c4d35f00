//! Block-state tracking for streamed content.
//!
//! Start events set the current emission kind; delta events are tagged with
//! whatever kind is current when they arrive. Blocks are assumed to be
//! strictly sequential: deltas carry no block index, so interleaved blocks
//! would be attributed to the most recently started one.

use serde::{Deserialize, Serialize};

use crate::cli::{BlockDelta, BlockStart, ContentEvent};

/// Category used to tag outgoing messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionKind {
    /// Plain assistant content.
    #[default]
    Content,
    /// Function/tool call text.
    FunctionCall,
}

/// Unit delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Kind current when the message was produced.
    pub kind: EmissionKind,
    /// Text payload.
    pub payload: String,
}

impl OutgoingMessage {
    /// Create a new message.
    #[must_use]
    pub fn new(kind: EmissionKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Create a content message.
    #[must_use]
    pub fn content(payload: impl Into<String>) -> Self {
        Self::new(EmissionKind::Content, payload)
    }

    /// Create a function call message.
    #[must_use]
    pub fn function_call(payload: impl Into<String>) -> Self {
        Self::new(EmissionKind::FunctionCall, payload)
    }
}

/// Header opening a function call.
///
/// Intentionally unterminated: consumers append the streamed partial-JSON
/// arguments to reconstruct the full call.
#[must_use]
pub fn function_call_header(tool_name: &str, tool_id: &str) -> String {
    format!(
        "\"function_call\" : {{ \n \"name\": \"{tool_name}\",\n \"id\": \"{tool_id}\",\n \"arguments\" :"
    )
}

/// Per-run emission kind cell.
#[derive(Debug, Clone, Default)]
pub struct BlockTracker {
    kind: EmissionKind,
}

impl BlockTracker {
    /// Create a tracker starting in `Content`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current emission kind.
    #[must_use]
    pub fn kind(&self) -> EmissionKind {
        self.kind
    }

    /// Reset to `Content` for a new run.
    pub fn reset(&mut self) {
        self.kind = EmissionKind::Content;
    }

    /// Apply a block start, returning the header message for tool-use blocks.
    pub fn on_start(&mut self, start: &BlockStart) -> Option<OutgoingMessage> {
        if start.block_type.is_function_call() {
            self.kind = EmissionKind::FunctionCall;
            Some(OutgoingMessage::function_call(function_call_header(
                &start.tool_name,
                &start.tool_id,
            )))
        } else {
            self.kind = EmissionKind::Content;
            None
        }
    }

    /// Tag a delta with the current kind. Empty deltas produce nothing.
    #[must_use]
    pub fn on_delta(&self, delta: &BlockDelta) -> Option<OutgoingMessage> {
        delta
            .fragment
            .as_ref()
            .map(|fragment| OutgoingMessage::new(self.kind, fragment.as_str()))
    }

    /// Feed any decoded event through the tracker.
    pub fn apply(&mut self, event: &ContentEvent) -> Option<OutgoingMessage> {
        match event {
            ContentEvent::BlockStart(start) => self.on_start(start),
            ContentEvent::BlockDelta(delta) => self.on_delta(delta),
            ContentEvent::Unrecognized => None,
        }
    }
}
