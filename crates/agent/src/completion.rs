//! Outbound completion request types.

use serde::Serialize;

use dramwise_core::ConversationMessage;

/// History sent upstream never exceeds this many entries; the oldest are
/// dropped first.
pub const HISTORY_WINDOW: usize = 10;

#[derive(Clone, Debug, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// The most recent `HISTORY_WINDOW` entries, original order preserved.
pub fn trailing_window(history: &[ConversationMessage]) -> &[ConversationMessage] {
    &history[history.len().saturating_sub(HISTORY_WINDOW)..]
}

#[cfg(test)]
mod tests {
    use super::{trailing_window, HISTORY_WINDOW};
    use dramwise_core::ConversationMessage;

    #[test]
    fn window_keeps_the_most_recent_entries_in_order() {
        let history: Vec<_> =
            (1..=15).map(|n| ConversationMessage::user(format!("turn {n}"))).collect();

        let window = trailing_window(&history);
        assert_eq!(window.len(), HISTORY_WINDOW);
        assert_eq!(window.first().map(|m| m.content.as_str()), Some("turn 6"));
        assert_eq!(window.last().map(|m| m.content.as_str()), Some("turn 15"));
    }

    #[test]
    fn short_history_is_returned_whole() {
        let history = vec![ConversationMessage::user("only turn")];
        assert_eq!(trailing_window(&history).len(), 1);
        assert!(trailing_window(&[]).is_empty());
    }
}
