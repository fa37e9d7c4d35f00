//! Renders a conversation into the single prompt string passed to the CLI.

use std::sync::Arc;

use crate::prompt::{ChatMessage, Conversation, ResourceSource};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful coding assistant. Answer concisely and use tools when they help.";

/// Turns a conversation into prompt text.
pub trait PromptRenderer: Send + Sync {
    fn render(&self, conversation: &Conversation) -> String;
}

/// Renders a tagged transcript: a `<system>` block followed by each
/// non-empty message wrapped in its role tag.
#[derive(Clone)]
pub struct TranscriptRenderer {
    system_prompt: String,
    resources: Option<Arc<dyn ResourceSource>>,
}

impl std::fmt::Debug for TranscriptRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptRenderer")
            .field("system_prompt", &self.system_prompt)
            .field("has_resources", &self.resources.is_some())
            .finish()
    }
}

impl Default for TranscriptRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl TranscriptRenderer {
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            resources: None,
        }
    }

    /// Prefix the system prompt with a contextual-resources block.
    #[must_use]
    pub fn with_resources(mut self, resources: Arc<dyn ResourceSource>) -> Self {
        self.resources = Some(resources);
        self
    }

    fn system_block(&self) -> String {
        let resources = self
            .resources
            .as_ref()
            .map(|r| r.context_block())
            .unwrap_or_default();

        if resources.is_empty() {
            self.system_prompt.clone()
        } else {
            format!("{resources}\n\n{}", self.system_prompt)
        }
    }

    fn message_body(message: &ChatMessage) -> String {
        let parts: Vec<&str> = message
            .attachments
            .iter()
            .filter_map(|a| a.to_message_content())
            .collect();

        if parts.is_empty() {
            message.content.clone()
        } else {
            format!("{}\n\n{}", parts.join("\n"), message.content)
        }
    }
}

impl PromptRenderer for TranscriptRenderer {
    fn render(&self, conversation: &Conversation) -> String {
        let mut out = format!("<system>\n{}\n</system>\n\n", self.system_block());

        for message in conversation.messages.iter().filter(|m| !m.is_empty()) {
            let role = message.role.as_str();
            out.push_str(&format!(
                "<{role}>\n{}\n</{role}>\n\n",
                Self::message_body(message)
            ));
        }
        out
    }
}
