//! Contextual resources injected ahead of the system prompt.

use std::collections::BTreeMap;

/// A source of contextual resources for the prompt.
pub trait ResourceSource: Send + Sync {
    /// Render all resources as one block, or an empty string if there are none.
    fn context_block(&self) -> String;
}

/// In-memory resource store keyed by URI.
#[derive(Debug, Clone, Default)]
pub struct ResourceCache {
    resources: BTreeMap<String, String>,
}

impl ResourceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource.
    pub fn insert(&mut self, uri: impl Into<String>, content: impl Into<String>) {
        self.resources.insert(uri.into(), content.into());
    }

    /// Remove a resource, returning its content.
    pub fn remove(&mut self, uri: &str) -> Option<String> {
        self.resources.remove(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceSource for ResourceCache {
    fn context_block(&self) -> String {
        if self.resources.is_empty() {
            return String::new();
        }

        let mut block = String::from("<resources>\n");
        for (uri, content) in &self.resources {
            block.push_str(&format!("<resource uri=\"{uri}\">\n{content}\n</resource>\n"));
        }
        block.push_str("</resources>");
        block
    }
}
