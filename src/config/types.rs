//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cli::DEFAULT_BINARY;
use crate::prompt::DEFAULT_SYSTEM_PROMPT;
use crate::stream::{DEFAULT_STALL_TIMEOUT_MS, DEFAULT_SUBSCRIBER_BUFFER};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Configuration for the conversation client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Claude CLI binary to launch.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Model identifier; `None` selects [`DEFAULT_MODEL`].
    #[serde(default)]
    pub model: Option<String>,
    /// System prompt placed at the top of every rendered transcript.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Per-subscriber buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
    /// Milliseconds a subscriber may keep its buffer full before it is dropped.
    #[serde(default = "default_stall_timeout_ms")]
    pub stall_timeout_ms: u64,
    /// Working directory for the CLI process.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_binary() -> String {
    DEFAULT_BINARY.to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_channel_buffer() -> usize {
    DEFAULT_SUBSCRIBER_BUFFER
}

fn default_stall_timeout_ms() -> u64 {
    DEFAULT_STALL_TIMEOUT_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            model: None,
            system_prompt: default_system_prompt(),
            channel_buffer: default_channel_buffer(),
            stall_timeout_ms: default_stall_timeout_ms(),
            working_dir: None,
        }
    }
}

impl ClientConfig {
    /// The model to invoke, falling back to [`DEFAULT_MODEL`].
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }
}
