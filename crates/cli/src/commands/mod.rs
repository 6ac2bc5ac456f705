//! CLI subcommands and the runtime they share.

pub mod config_cmd;
pub mod profiles;
pub mod template;

use std::sync::Arc;

use nexus_agent::{AgentManager, ChatSystem, ProfileManager};
use nexus_config::AppConfig;
use nexus_core::TemplateStore;
use nexus_store::{InMemoryTemplateStore, SqliteTemplateStore};
use nexus_templates::TemplateEngine;

/// Everything a command needs: configuration, agents and the template engine.
pub struct Runtime {
    pub config: AppConfig,
    pub chat: Arc<ChatSystem>,
    pub engine: TemplateEngine,
}

impl Runtime {
    /// Load configuration and wire the store, agents and engine.
    ///
    /// `profile` overrides `profiles.default_profile` and must name a loaded profile.
    pub async fn load(profile: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

        let profiles = ProfileManager::load_dir(&config.profiles_dir());
        if let Some(name) = profile {
            if profiles.get(name).is_none() {
                return Err(format!("Profile '{name}' not found").into());
            }
            config.profiles.default_profile = Some(name.to_string());
        }

        let router = nexus_providers::build_from_config(&config);
        let agents = AgentManager::from_config(&config, &router, &profiles);
        let chat = Arc::new(ChatSystem::new(agents, profiles));

        let store = open_store(&config).await?;
        let engine = TemplateEngine::from_config(&config.templates, store, chat.clone());

        Ok(Self { config, chat, engine })
    }
}

/// Open the template registry configured under `[database]`.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn TemplateStore>, Box<dyn std::error::Error>> {
    match config.database.backend.as_str() {
        "in_memory" => Ok(Arc::new(InMemoryTemplateStore::new())),
        _ => {
            let path = config.database_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let store = SqliteTemplateStore::new(&path.to_string_lossy()).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Parse a `key=value` command-line pair.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
