//! Sliding context window.

use aicode_core::ChatMessage;

/// Bound a conversation to `max_messages` while pinning the first message.
///
/// If the list fits it is returned unchanged. Otherwise the result is the
/// first message (conventionally the system prompt) followed by the most
/// recent `max_messages - 1` messages.
pub fn sliding_window(messages: &[ChatMessage], max_messages: usize) -> Vec<ChatMessage> {
    if messages.len() <= max_messages {
        return messages.to_vec();
    }
    if max_messages == 0 {
        return Vec::new();
    }

    let tail = max_messages - 1;
    let mut window = Vec::with_capacity(max_messages);
    window.push(messages[0].clone());
    window.extend_from_slice(&messages[messages.len() - tail..]);
    window
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(len: usize) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system("prompt")];
        for i in 1..len {
            messages.push(ChatMessage::user(format!("message {i}")));
        }
        messages
    }

    #[test]
    fn short_history_is_unchanged() {
        let messages = conversation(10);
        assert_eq!(sliding_window(&messages, 50), messages);
    }

    #[test]
    fn exactly_full_is_unchanged() {
        let messages = conversation(50);
        assert_eq!(sliding_window(&messages, 50).len(), 50);
        assert_eq!(sliding_window(&messages, 50), messages);
    }

    #[test]
    fn long_history_keeps_prompt_and_tail() {
        let messages = conversation(60);
        let window = sliding_window(&messages, 50);

        assert_eq!(window.len(), 50);
        assert_eq!(window[0], messages[0]);
        assert_eq!(window[1], messages[11]);
        assert_eq!(window.last(), messages.last());
    }

    #[test]
    fn smallest_window_is_prompt_plus_latest() {
        let messages = conversation(5);
        let window = sliding_window(&messages, 2);
        assert_eq!(window, vec![messages[0].clone(), messages[4].clone()]);
    }
}
