//! ChatModel trait: the abstraction over LLM backends.
//!
//! The agent loop only needs one primitive: send the conversation so far,
//! get the model's complete textual turn back. Network clients, retries and
//! backoff live behind this trait.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::ModelError;
use crate::message::ChatMessage;

/// The LLM chat primitive: `chat(messages) -> text`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// A human-readable model identifier (e.g., "gpt-4o", "replay").
    fn model(&self) -> &str;

    /// Send the history and get the model's complete turn.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}

/// A chat model that replays scripted turns in order.
///
/// Used for dry runs from the CLI and as the test double for the agent
/// loop. Every call records the history it was given.
pub struct ScriptedChat {
    turns: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
    total: usize,
}

impl ScriptedChat {
    pub fn new<I, S>(turns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let turns: VecDeque<String> = turns.into_iter().map(Into::into).collect();
        let total = turns.len();
        Self {
            turns: Mutex::new(turns),
            seen: Mutex::new(Vec::new()),
            total,
        }
    }

    /// Parse a script file body: turns separated by lines containing only `---`.
    pub fn from_script(script: &str) -> Self {
        let mut turns = Vec::new();
        let mut current = String::new();
        for line in script.lines() {
            if line.trim() == "---" {
                turns.push(current.trim().to_string());
                current.clear();
            } else {
                current.push_str(line);
                current.push('\n');
            }
        }
        if !current.trim().is_empty() {
            turns.push(current.trim().to_string());
        }
        Self::new(turns.into_iter().filter(|t| !t.is_empty()))
    }

    /// Number of `chat` calls served so far.
    pub fn call_count(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// The histories passed to each call, oldest first.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn model(&self) -> &str {
        "replay"
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages.to_vec());
        }
        let next = self
            .turns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        next.ok_or(ModelError::Exhausted(self.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_turns_in_order() {
        let model = ScriptedChat::new(["one", "two"]);
        let history = vec![ChatMessage::user("hi")];
        assert_eq!(model.chat(&history).await.unwrap(), "one");
        assert_eq!(model.chat(&history).await.unwrap(), "two");
        assert!(matches!(
            model.chat(&history).await,
            Err(ModelError::Exhausted(2))
        ));
        assert_eq!(model.call_count(), 3);
    }

    #[test]
    fn script_splits_on_separator_lines() {
        let script = "Thought: look\nAction: echo\nAction Input: {}\n---\nFinal Answer: done\n";
        let model = ScriptedChat::from_script(script);
        let turns = model.turns.lock().unwrap();
        assert_eq!(turns.len(), 2);
        assert!(turns[0].starts_with("Thought: look"));
        assert!(turns[0].ends_with("Action Input: {}"));
        assert_eq!(turns[1], "Final Answer: done");
    }

    #[test]
    fn script_ignores_empty_turns() {
        let model = ScriptedChat::from_script("---\n\n---\nonly\n---\n");
        assert_eq!(model.total, 1);
    }
}
