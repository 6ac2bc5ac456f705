//! Provider router: the named set of LLM backends agents are built on.

use std::collections::BTreeMap;
use std::sync::Arc;

use nexus_config::AppConfig;
use nexus_core::provider::Provider;
use tracing::{debug, warn};

use crate::openai_compat::OpenAiCompatProvider;

/// Named providers plus the one used when no name is given.
pub struct ProviderRouter {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.get(&self.default_provider)
    }

    pub fn default_name(&self) -> &str {
        &self.default_provider
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// All registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

/// Build one OpenAI-compatible provider per `[providers.<name>]` section,
/// plus the default provider when it has no section of its own.
///
/// A provider with neither a known endpoint nor an `api_url` is skipped.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    let mut names: Vec<&str> = config.providers.keys().map(String::as_str).collect();
    if !config.providers.contains_key(&config.default_provider) {
        names.push(&config.default_provider);
    }

    for name in names {
        let api_url = config.providers.get(name).and_then(|p| p.api_url.clone());
        let Some(base_url) = api_url.or_else(|| known_base_url(name).map(String::from)) else {
            warn!(provider = name, "No api_url configured for unknown provider, skipping");
            continue;
        };

        let api_key = config.provider_api_key(name).unwrap_or_default();
        if api_key.is_empty() && !is_local(name) {
            debug!(provider = name, "No API key configured");
        }

        router.register(name, Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)));
    }

    router
}

/// Endpoint of a well-known OpenAI-compatible service.
fn known_base_url(provider_name: &str) -> Option<&'static str> {
    Some(match provider_name {
        "openai" => "https://api.openai.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "together" => "https://api.together.xyz/v1",
        "mistral" => "https://api.mistral.ai/v1",
        "ollama" => "http://localhost:11434/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    })
}

/// Locally hosted servers that accept any key.
fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}
