//! The nexus facade: the system-facing service exposed to helper scripts.
//!
//! Helpers reach other agents and the participant roster only through this
//! trait; nothing is looked up from globals.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::agent::Agent;

/// Whether a participant is a human user or an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    User,
    Agent,
}

/// A member of the chat system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub username: String,
    pub display_name: String,
    pub participant_type: ParticipantType,
    /// "active" or "inactive"
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub avatar: String,
}

fn default_status() -> String {
    "inactive".into()
}

impl Participant {
    /// A participant record for a registered agent.
    pub fn agent(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            username: name,
            participant_type: ParticipantType::Agent,
            status: default_status(),
            avatar: avatar.into(),
        }
    }

    /// A participant record for a human user.
    pub fn user(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            participant_type: ParticipantType::User,
            status: default_status(),
            avatar: String::new(),
        }
    }
}

/// Cross-cutting lookups available to helper code.
pub trait Nexus: Send + Sync {
    /// Look up a registered agent by name.
    fn get_agent(&self, name: &str) -> Option<Arc<dyn Agent>>;

    /// Names of all registered agents.
    fn agent_names(&self) -> Vec<String>;

    /// All participants (users and agents), in registration order.
    fn participants(&self) -> Vec<Participant>;
}
