//! Chat history sanitisation.

use crate::MAX_HISTORY_TURNS;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Reduce an untrusted `history` value to well-formed turns.
///
/// Malformed entries are discarded rather than rejected; only the most
/// recent [`MAX_HISTORY_TURNS`] survive.
pub fn sanitize_history(raw: Option<&Value>) -> Vec<ChatTurn> {
    let Some(Value::Array(entries)) = raw else {
        return Vec::new();
    };

    let mut turns: Vec<ChatTurn> = entries
        .iter()
        .filter_map(|entry| {
            let role = match entry.get("role").and_then(Value::as_str) {
                Some("user") => ChatRole::User,
                Some("assistant") => ChatRole::Assistant,
                _ => return None,
            };
            let content = entry.get("content").and_then(Value::as_str)?;
            if content.trim().is_empty() {
                return None;
            }
            Some(ChatTurn {
                role,
                content: content.to_string(),
            })
        })
        .collect();

    if turns.len() > MAX_HISTORY_TURNS {
        turns.drain(..turns.len() - MAX_HISTORY_TURNS);
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn discards_malformed_entries() {
        let raw = json!([
            {"role": "user", "content": "first"},
            {"role": "system", "content": "nope"},
            {"role": "assistant"},
            {"role": "assistant", "content": ""},
            {"content": "orphan"},
            "not an object",
            {"role": "assistant", "content": "second"},
        ]);
        let turns = sanitize_history(Some(&raw));
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "first");
        assert_eq!(turns[1].role, ChatRole::Assistant);
    }

    #[test]
    fn caps_at_most_recent_turns() {
        let entries: Vec<Value> = (0..30)
            .map(|i| json!({"role": "user", "content": format!("turn {i}")}))
            .collect();
        let turns = sanitize_history(Some(&Value::Array(entries)));
        assert_eq!(turns.len(), MAX_HISTORY_TURNS);
        assert_eq!(turns[0].content, "turn 10");
        assert_eq!(turns.last().unwrap().content, "turn 29");
    }

    #[test]
    fn tolerates_missing_or_non_array_history() {
        assert!(sanitize_history(None).is_empty());
        assert!(sanitize_history(Some(&json!("history"))).is_empty());
        assert!(sanitize_history(Some(&json!({}))).is_empty());
    }
}
