//! Agent capability and agent profile types.
//!
//! To the template engine an agent is an opaque "ask the model" capability:
//! given a persona and a rendered prompt it returns the model's text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::AgentError;

/// A persona and preferences an agent speaks with.
///
/// Deserializes from the `agentProfile` mapping of a profile YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    pub name: String,

    #[serde(default)]
    pub avatar: String,

    /// System prompt sent ahead of every semantic request
    #[serde(default)]
    pub persona: String,

    #[serde(default)]
    pub preferred_functions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planners: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<serde_json::Value>,
}

/// The "ask the model" capability consumed by the template engine.
#[async_trait]
pub trait Agent: Send + Sync {
    /// The agent's registered name (e.g., "OpenAIAgent").
    fn name(&self) -> &str;

    /// The profile this agent currently speaks with, if any.
    fn profile(&self) -> Option<&AgentProfile> {
        None
    }

    /// The persona from the active profile, or empty.
    fn persona(&self) -> &str {
        self.profile().map(|p| p.persona.as_str()).unwrap_or("")
    }

    /// Single-turn completion: `persona` as system prompt, `prompt` as user input.
    async fn get_semantic_response(&self, persona: &str, prompt: &str) -> Result<String, AgentError>;
}
