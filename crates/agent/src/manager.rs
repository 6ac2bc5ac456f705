//! Agent registry.

use std::sync::Arc;

use nexus_config::AppConfig;
use nexus_core::Agent;
use nexus_providers::ProviderRouter;
use tracing::{debug, info};

use crate::profiles::ProfileManager;
use crate::provider_agent::ProviderAgent;

/// Registered agents in registration order.
#[derive(Clone, Default)]
pub struct AgentManager {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// One `ProviderAgent` per routed provider, named after the provider.
    ///
    /// When `profiles.default_profile` names a loaded profile, every agent
    /// starts out speaking with it.
    pub fn from_config(config: &AppConfig, router: &ProviderRouter, profiles: &ProfileManager) -> Self {
        let default_profile = config
            .profiles
            .default_profile
            .as_deref()
            .and_then(|name| profiles.get(name));

        let mut manager = Self::new();
        for provider_name in router.list() {
            let Some(provider) = router.get(provider_name) else {
                continue;
            };
            let mut agent = ProviderAgent::from_config(agent_name(provider_name), provider, config);
            if let Some(profile) = default_profile {
                agent = agent.with_profile(profile.clone());
            }
            debug!(agent = agent.name(), model = agent.model(), "Registered agent");
            manager.register(Arc::new(agent));
        }

        info!(count = manager.len(), "Agents loaded");
        manager
    }

    /// Register an agent, replacing any agent with the same name.
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        match self.agents.iter_mut().find(|a| a.name() == agent.name()) {
            Some(existing) => *existing = agent,
            None => self.agents.push(agent),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    /// The first registered agent.
    pub fn first(&self) -> Option<Arc<dyn Agent>> {
        self.agents.first().cloned()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Agent name for a provider: `openai` -> `OpenAIAgent`, `mistral` -> `MistralAgent`.
pub fn agent_name(provider: &str) -> String {
    match provider {
        "openai" => "OpenAIAgent".into(),
        "openrouter" => "OpenRouterAgent".into(),
        "llamacpp" | "llama.cpp" => "LlamaCppAgent".into(),
        "vllm" => "VLLMAgent".into(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => format!("{}{}Agent", first.to_uppercase(), chars.as_str()),
                None => "Agent".into(),
            }
        }
    }
}
