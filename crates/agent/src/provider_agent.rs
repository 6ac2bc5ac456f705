//! An agent backed by an LLM provider.

use std::sync::Arc;

use async_trait::async_trait;
use nexus_config::AppConfig;
use nexus_core::error::{AgentError, ProviderError};
use nexus_core::{Agent, AgentProfile, Message, Provider, ProviderRequest};
use tracing::{debug, warn};

/// Sends each semantic request to a provider as a two-message exchange.
pub struct ProviderAgent {
    name: String,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout_secs: u64,
    profile: Option<AgentProfile>,
}

impl ProviderAgent {
    pub fn new(name: impl Into<String>, provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout_secs: 120,
            profile: None,
        }
    }

    /// Build an agent with model and sampling settings from configuration.
    ///
    /// A provider-specific `default_model` wins over the global default.
    pub fn from_config(name: impl Into<String>, provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(provider.name())
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        let mut agent = Self::new(name, provider, model);
        agent.temperature = config.default_temperature;
        agent.max_tokens = Some(config.default_max_tokens);
        agent.timeout_secs = config.templates.agent_timeout_secs;
        agent
    }

    pub fn with_profile(mut self, profile: AgentProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_error(&self, error: ProviderError) -> AgentError {
        match error {
            ProviderError::Timeout(_) => AgentError::Timeout {
                agent: self.name.clone(),
                timeout_secs: self.timeout_secs,
            },
            other => AgentError::CallFailed {
                agent: self.name.clone(),
                reason: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl Agent for ProviderAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> Option<&AgentProfile> {
        self.profile.as_ref()
    }

    async fn get_semantic_response(&self, persona: &str, prompt: &str) -> Result<String, AgentError> {
        let mut request = ProviderRequest::new(&self.model, Message::semantic_exchange(persona, prompt));
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        debug!(
            agent = %self.name,
            provider = self.provider.name(),
            model = %self.model,
            "Semantic request"
        );

        match self.provider.complete(request).await {
            Ok(response) => Ok(response.message.content),
            Err(e) => {
                warn!(agent = %self.name, error = %e, "Provider call failed");
                Err(self.map_error(e))
            }
        }
    }
}
