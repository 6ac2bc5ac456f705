//! Chat message value objects exchanged with LLM providers.
//!
//! A semantic request is always a two-message exchange: the agent persona as
//! the system message, followed by the rendered prompt as the user message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (or a rendered prompt standing in for one)
    User,
    /// The model
    Assistant,
    /// Persona / system instructions
    System,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Build the `[system(persona), user(prompt)]` exchange used for a
    /// semantic (single-turn) completion. An empty persona is omitted.
    pub fn semantic_exchange(persona: &str, prompt: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if !persona.is_empty() {
            messages.push(Self::system(persona));
        }
        messages.push(Self::user(prompt));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::system("You are terse.");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"system\""));
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "You are terse.");
        assert_eq!(deserialized.role, Role::System);
    }

    #[test]
    fn semantic_exchange_puts_persona_first() {
        let msgs = Message::semantic_exchange("You are Adam.", "Hi");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(msgs[1].content, "Hi");
    }

    #[test]
    fn semantic_exchange_skips_empty_persona() {
        let msgs = Message::semantic_exchange("", "Hi");
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, Role::User);
    }
}
