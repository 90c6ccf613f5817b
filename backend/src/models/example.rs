//! Training example record
//!
//! One JSON line per example: `{"messages": [system, user, assistant]}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A system/user/assistant conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub messages: Vec<ChatMessage>,
}

impl Example {
    pub fn new(system: String, user: String, assistant: String) -> Self {
        Self {
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: system,
                },
                ChatMessage {
                    role: Role::User,
                    content: user,
                },
                ChatMessage {
                    role: Role::Assistant,
                    content: assistant,
                },
            ],
        }
    }

    /// Content of the first message with the given role
    pub fn content(&self, role: Role) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }

    /// Serialize as one JSONL line (no trailing newline, spaced separators)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        crate::format::to_spaced_json(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_line_layout() {
        let example = Example::new("sys".into(), "usr".into(), "{}".into());
        assert_eq!(
            example.to_json_line().unwrap(),
            r#"{"messages": [{"role": "system", "content": "sys"}, {"role": "user", "content": "usr"}, {"role": "assistant", "content": "{}"}]}"#
        );
        assert_eq!(example.content(Role::User), Some("usr"));
    }
}
