//! Agents and the chat system facade for Nexus.
//!
//! - [`ProviderAgent`] turns any LLM [`Provider`](nexus_core::Provider) into
//!   an [`Agent`](nexus_core::Agent) that speaks with a profile's persona.
//! - [`ProfileManager`] loads agent profiles from YAML files.
//! - [`AgentManager`] is the registry of named agents.
//! - [`ChatSystem`] ties them together and is the [`Nexus`](nexus_core::Nexus)
//!   handed to template helpers.

pub mod chat_system;
pub mod manager;
pub mod profiles;
pub mod provider_agent;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use chat_system::{ChatSystem, ChatSystemError};
pub use manager::AgentManager;
pub use profiles::ProfileManager;
pub use provider_agent::ProviderAgent;
