//! Conversation-aware query enrichment

use serde::{Deserialize, Serialize};

/// Messages of history folded into the query
pub const HISTORY_WINDOW: usize = 4;

/// Characters kept from each history message
pub const HISTORY_MESSAGE_CHARS: usize = 200;

/// One turn of a conversation, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(rename = "isUser")]
    pub is_user: bool,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            is_user: true,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            is_user: false,
            content: content.into(),
        }
    }

    fn role(&self) -> &'static str {
        if self.is_user {
            "User"
        } else {
            "Assistant"
        }
    }
}

/// First `max_chars` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Fold the tail of the conversation into the query.
///
/// Without history the query comes back unchanged.
pub fn enrich_query(query: &str, history: Option<&[ConversationMessage]>) -> String {
    let history = match history {
        Some(h) if !h.is_empty() => h,
        _ => return query.to_string(),
    };

    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
    let context = recent
        .iter()
        .map(|msg| {
            format!(
                "{}: {}",
                msg.role(),
                truncate_chars(&msg.content, HISTORY_MESSAGE_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Given this conversation context:\n{}\n\nNow answer: {}",
        context, query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_history_passthrough() {
        let empty: Vec<ConversationMessage> = Vec::new();
        assert_eq!(enrich_query("What is MQTT?", None), "What is MQTT?");
        assert_eq!(
            enrich_query("What is MQTT?", Some(empty.as_slice())),
            "What is MQTT?"
        );
    }

    #[test]
    fn test_two_turn_history() {
        let history = vec![
            ConversationMessage::user("Tell me about IoT protocols"),
            ConversationMessage::assistant("IoT protocols include MQTT, CoAP..."),
        ];
        let enriched = enrich_query("Explain CoAP", Some(history.as_slice()));

        assert_eq!(
            enriched,
            "Given this conversation context:\n\
             User: Tell me about IoT protocols\n\
             Assistant: IoT protocols include MQTT, CoAP...\n\n\
             Now answer: Explain CoAP"
        );
    }

    #[test]
    fn test_window_keeps_last_four_in_order() {
        let history: Vec<_> = (0..7)
            .map(|i| ConversationMessage {
                is_user: i % 2 == 0,
                content: format!("turn {}", i),
            })
            .collect();
        let enriched = enrich_query("q", Some(history.as_slice()));

        for i in 0..3 {
            assert!(!enriched.contains(&format!("turn {}", i)));
        }
        let positions: Vec<_> = (3..7)
            .map(|i| enriched.find(&format!("turn {}", i)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_long_messages_truncated() {
        let long = "é".repeat(500);
        let history = vec![ConversationMessage::user(long)];
        let enriched = enrich_query("q", Some(history.as_slice()));

        let line = enriched.lines().nth(1).unwrap();
        let content = line.strip_prefix("User: ").unwrap();
        assert_eq!(content.chars().count(), HISTORY_MESSAGE_CHARS);
    }

    #[test]
    fn test_deserializes_camel_case_flag() {
        let msg: ConversationMessage =
            serde_json::from_str(r#"{"isUser": true, "content": "hi"}"#).unwrap();
        assert!(msg.is_user);
    }

    #[test]
    fn test_truncate_chars_short_input() {
        assert_eq!(truncate_chars("abc", 200), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }
}
