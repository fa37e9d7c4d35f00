//! Conversation types rendered into a CLI prompt.

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Tag name used in the rendered transcript.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Something attached to a message (a file, a selection, an image...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Display name or path.
    pub name: String,
    /// Textual content; `None` for attachments with no text form.
    #[serde(default)]
    pub text: Option<String>,
}

impl Attachment {
    /// A text attachment.
    #[must_use]
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
        }
    }

    /// An attachment without a textual form.
    #[must_use]
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: None,
        }
    }

    /// Text to inline into the message body, if any.
    #[must_use]
    pub fn to_message_content(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach something to this message.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// True when there is neither content nor attachment text to render.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
            && self
                .attachments
                .iter()
                .all(|a| a.to_message_content().is_none())
    }
}

/// An ordered conversation history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation holding a single user message.
    #[must_use]
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.iter().all(ChatMessage::is_empty)
    }
}
