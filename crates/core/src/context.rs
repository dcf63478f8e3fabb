//! ContextManager trait: the conversation history an agent reads and extends.
//!
//! Implementations: JSONL-backed sessions with a write queue, and a plain
//! in-memory store (see the `aicode-context` crate).

use async_trait::async_trait;

use crate::error::ContextError;
use crate::message::ChatMessage;

/// The session/context store contract used by the agent loop.
#[async_trait]
pub trait ContextManager: Send + Sync {
    /// Append a message.
    ///
    /// Synchronous with respect to the in-memory view: a `history()` call
    /// issued after this returns sees the message. Durable persistence may
    /// still be in flight.
    fn add_message(&self, message: ChatMessage);

    /// The history to send to the model, possibly windowed.
    async fn history(&self) -> Result<Vec<ChatMessage>, ContextError>;

    /// Rough token estimate of the full history.
    async fn token_count(&self) -> Result<usize, ContextError>;

    /// Drop all messages, including any durable copy.
    fn clear(&self) -> Result<(), ContextError>;
}
