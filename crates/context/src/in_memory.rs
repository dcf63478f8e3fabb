//! In-memory context store: no durability, no windowing.

use async_trait::async_trait;
use std::sync::Mutex;

use aicode_core::error::ContextError;
use aicode_core::message::{ChatMessage, estimate_tokens};
use aicode_core::ContextManager;

/// A conversation held only in process memory.
#[derive(Default)]
pub struct InMemoryContext {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing conversation.
    pub fn with_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages: Mutex::new(messages),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChatMessage>> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ContextManager for InMemoryContext {
    fn add_message(&self, message: ChatMessage) {
        self.lock().push(message);
    }

    async fn history(&self) -> Result<Vec<ChatMessage>, ContextError> {
        Ok(self.lock().clone())
    }

    async fn token_count(&self) -> Result<usize, ContextError> {
        Ok(estimate_tokens(&self.lock()))
    }

    fn clear(&self) -> Result<(), ContextError> {
        self.lock().clear();
        Ok(())
    }
}
