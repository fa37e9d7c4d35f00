//! Content events nested inside `stream_event` lines.
//!
//! The CLI wraps Anthropic streaming events in
//! `{"type":"stream_event","event":{...}}`. Only the content block start and
//! delta events matter for reassembling a response; everything else decodes
//! to [`ContentEvent::Unrecognized`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned when a nested event has the right shape but bad field types.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The event object could not be mapped onto a content event.
    #[error("Invalid stream event: {reason}")]
    Invalid {
        /// Deserializer error message.
        reason: String,
    },
}

/// Kind of a content block announced by `content_block_start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Plain assistant text.
    Text,
    /// A tool/function invocation.
    ToolUse,
    /// Missing or unknown block type.
    #[default]
    #[serde(other)]
    Unknown,
}

impl BlockType {
    /// Returns true if this block carries a function call.
    #[must_use]
    pub fn is_function_call(self) -> bool {
        matches!(self, Self::ToolUse)
    }
}

/// Payload of a `content_block_start` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockStart {
    /// Declared block type.
    pub block_type: BlockType,
    /// Tool name; empty when absent.
    pub tool_name: String,
    /// Tool use id; empty when absent.
    pub tool_id: String,
}

/// A single fragment of streamed block content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaFragment {
    /// Text fragment.
    Text(String),
    /// Partial JSON for tool arguments.
    PartialJson(String),
}

impl DeltaFragment {
    /// The raw fragment text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::PartialJson(s) => s,
        }
    }

    /// Consume the fragment, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) | Self::PartialJson(s) => s,
        }
    }
}

/// Payload of a `content_block_delta` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockDelta {
    /// The fragment, or `None` when the delta carries neither text nor JSON.
    pub fragment: Option<DeltaFragment>,
}

/// A decoded content event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEvent {
    /// `content_block_start`.
    BlockStart(BlockStart),
    /// `content_block_delta`.
    BlockDelta(BlockDelta),
    /// Any other event type, or a start event without a `content_block`.
    Unrecognized,
}

#[derive(Debug, Deserialize)]
struct RawContentBlock {
    #[serde(rename = "type", default)]
    block_type: BlockType,
    #[serde(default)]
    name: Value,
    #[serde(default)]
    id: Value,
}

/// Text of a scalar field: strings as-is, numbers and booleans printed,
/// null and containers empty.
fn scalar_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct RawDelta {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    partial_json: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawEvent {
    ContentBlockStart {
        #[serde(default)]
        content_block: Option<RawContentBlock>,
    },
    ContentBlockDelta {
        #[serde(default)]
        delta: Option<RawDelta>,
    },
    #[serde(other)]
    Other,
}

impl ContentEvent {
    /// Decode the nested `event` object of a `stream_event` line.
    ///
    /// When a delta carries both `text` and `partial_json`, text wins.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::Invalid` if a recognized event has fields of
    /// the wrong JSON type. The read loop treats this as recoverable.
    pub fn decode(event: &Value) -> Result<Self, DecodeError> {
        // An event without a string `type` is simply not one of ours.
        if !event.get("type").is_some_and(Value::is_string) {
            return Ok(Self::Unrecognized);
        }

        let raw = RawEvent::deserialize(event).map_err(|e| DecodeError::Invalid {
            reason: e.to_string(),
        })?;

        Ok(match raw {
            RawEvent::ContentBlockStart {
                content_block: Some(block),
            } => Self::BlockStart(BlockStart {
                block_type: block.block_type,
                tool_name: scalar_text(block.name),
                tool_id: scalar_text(block.id),
            }),
            RawEvent::ContentBlockStart {
                content_block: None,
            }
            | RawEvent::Other => Self::Unrecognized,
            RawEvent::ContentBlockDelta { delta } => Self::BlockDelta(BlockDelta {
                fragment: delta.and_then(|d| match (d.text, d.partial_json) {
                    (Some(text), _) => Some(DeltaFragment::Text(text)),
                    (None, Some(json)) => Some(DeltaFragment::PartialJson(json)),
                    (None, None) => None,
                }),
            }),
        })
    }
}
