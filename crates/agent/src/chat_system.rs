//! The chat system: agents, profiles and participants behind the `Nexus` facade.

use std::sync::{Arc, PoisonError, RwLock};

use nexus_core::{Agent, AgentProfile, Nexus, Participant};
use thiserror::Error;
use tracing::info;

use crate::manager::AgentManager;
use crate::profiles::ProfileManager;

const AVATARS: [&str; 5] = ["🤖", "🧠", "🧮", "⚙️", "🔮"];

#[derive(Debug, Clone, Error)]
pub enum ChatSystemError {
    #[error("Participant already exists: {0}")]
    DuplicateParticipant(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
}

pub struct ChatSystem {
    agents: AgentManager,
    profiles: ProfileManager,
    participants: RwLock<Vec<Participant>>,
}

impl ChatSystem {
    /// Every registered agent joins as an `agent` participant, with avatars
    /// handed out in rotation.
    pub fn new(agents: AgentManager, profiles: ProfileManager) -> Self {
        let participants = agents
            .names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| Participant::agent(name, AVATARS[i % AVATARS.len()]))
            .collect::<Vec<_>>();

        info!(
            agents = agents.len(),
            profiles = profiles.profiles().len(),
            "Chat system ready"
        );

        Self {
            agents,
            profiles,
            participants: RwLock::new(participants),
        }
    }

    /// Add a participant; usernames are unique.
    pub fn add_participant(&self, participant: Participant) -> Result<(), ChatSystemError> {
        let mut participants = self.participants.write().unwrap_or_else(PoisonError::into_inner);
        if participants.iter().any(|p| p.username == participant.username) {
            return Err(ChatSystemError::DuplicateParticipant(participant.username));
        }
        info!(username = %participant.username, "Participant added");
        participants.push(participant);
        Ok(())
    }

    pub fn get_participant(&self, username: &str) -> Option<Participant> {
        self.participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.username == username)
            .cloned()
    }

    pub fn get_profile(&self, name: &str) -> Result<&AgentProfile, ChatSystemError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ChatSystemError::ProfileNotFound(name.to_string()))
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.names()
    }

    pub fn agents(&self) -> &AgentManager {
        &self.agents
    }
}

impl Nexus for ChatSystem {
    fn get_agent(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name)
    }

    fn agent_names(&self) -> Vec<String> {
        self.agents.names()
    }

    fn participants(&self) -> Vec<Participant> {
        self.participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider_agent::ProviderAgent;
    use crate::test_helpers::SequentialMockProvider;
    use nexus_core::ParticipantType;

    fn system() -> ChatSystem {
        let mut agents = AgentManager::new();
        for name in ["OpenAIAgent", "GroqAgent"] {
            agents.register(Arc::new(ProviderAgent::new(
                name,
                Arc::new(SequentialMockProvider::new(vec![])),
                "m",
            )));
        }
        let profiles = ProfileManager::from_profiles(vec![AgentProfile {
            name: "Adam".into(),
            persona: "You are Adam.".into(),
            ..Default::default()
        }]);
        ChatSystem::new(agents, profiles)
    }

    #[test]
    fn agents_join_as_participants() {
        let system = system();
        let participants = system.participants();
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].username, "OpenAIAgent");
        assert_eq!(participants[0].avatar, "🤖");
        assert_eq!(participants[1].avatar, "🧠");
        assert!(participants.iter().all(|p| p.participant_type == ParticipantType::Agent));
    }

    #[test]
    fn duplicate_participant_rejected() {
        let system = system();
        system.add_participant(Participant::user("alice", "Alice")).unwrap();
        let err = system
            .add_participant(Participant::user("alice", "Alice Again"))
            .unwrap_err();
        assert!(matches!(err, ChatSystemError::DuplicateParticipant(ref name) if name == "alice"));
        assert_eq!(system.get_participant("alice").unwrap().display_name, "Alice");
        assert_eq!(system.participants().len(), 3);
    }

    #[test]
    fn nexus_lookups() {
        let system = system();
        assert_eq!(system.agent_names(), vec!["OpenAIAgent", "GroqAgent"]);
        assert!(system.get_agent("GroqAgent").is_some());
        assert!(system.get_agent("Nobody").is_none());
    }

    #[test]
    fn profile_lookup() {
        let system = system();
        assert_eq!(system.get_profile("Adam").unwrap().persona, "You are Adam.");
        assert!(matches!(
            system.get_profile("Eve"),
            Err(ChatSystemError::ProfileNotFound(_))
        ));
        assert_eq!(system.profile_names(), vec!["Adam"]);
    }
}
