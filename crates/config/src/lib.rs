//! Configuration loading, validation, and management for Nexus.
//!
//! Loads configuration from `~/.nexus/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.nexus/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Template store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Template engine limits
    #[serde(default)]
    pub templates: TemplateEngineConfig,

    /// Agent profile configuration
    #[serde(default)]
    pub profiles: ProfilesConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("database", &self.database)
            .field("templates", &self.templates)
            .field("profiles", &self.profiles)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// "sqlite" or "in_memory"
    #[serde(default = "default_database_backend")]
    pub backend: String,

    /// SQLite database file; relative paths resolve against the config dir
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_backend() -> String {
    "sqlite".into()
}
fn default_database_path() -> String {
    "nexus.db".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_database_backend(),
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateEngineConfig {
    /// Maximum partial nesting depth before execution fails
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Timeout applied to every agent call made by a template
    #[serde(default = "default_agent_timeout")]
    pub agent_timeout_secs: u64,
}

fn default_max_depth() -> usize {
    32
}
fn default_agent_timeout() -> u64 {
    120
}

impl Default for TemplateEngineConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            agent_timeout_secs: default_agent_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesConfig {
    /// Directory scanned for `*.yaml` / `*.yml` agent profiles
    #[serde(default = "default_profiles_dir")]
    pub directory: String,

    /// Profile attached to agents when none is requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
}

fn default_profiles_dir() -> String {
    "profiles".into()
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            directory: default_profiles_dir(),
            default_profile: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.nexus/config.toml).
    ///
    /// Also checks environment variables:
    /// - `NEXUS_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `NEXUS_PROVIDER`, `NEXUS_MODEL`, `NEXUS_DATABASE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = Self::config_dir();
        let config_path = config_dir.join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("NEXUS_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("NEXUS_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("NEXUS_MODEL") {
            config.default_model = model;
        }

        if let Ok(path) = std::env::var("NEXUS_DATABASE") {
            config.database.path = path;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".nexus")
    }

    /// Resolve the SQLite database path against the config directory.
    pub fn database_path(&self) -> PathBuf {
        resolve(&self.database.path)
    }

    /// Resolve the profiles directory against the config directory.
    pub fn profiles_dir(&self) -> PathBuf {
        resolve(&self.profiles.directory)
    }

    /// API key for a provider: provider override first, then the global key.
    pub fn provider_api_key(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.templates.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "templates.max_depth must be at least 1".into(),
            ));
        }

        if self.templates.agent_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "templates.agent_timeout_secs must be > 0".into(),
            ));
        }

        match self.database.backend.as_str() {
            "sqlite" | "in_memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown database backend '{other}' (expected sqlite or in_memory)"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            database: DatabaseConfig::default(),
            templates: TemplateEngineConfig::default(),
            profiles: ProfilesConfig::default(),
            providers: HashMap::new(),
        }
    }
}

fn resolve(path: &str) -> PathBuf {
    let p = PathBuf::from(path);
    if p.is_absolute() {
        p
    } else {
        AppConfig::config_dir().join(p)
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.templates.max_depth, 32);
        assert_eq!(config.templates.agent_timeout_secs, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.database.path, config.database.path);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_depth_rejected() {
        let mut config = AppConfig::default();
        config.templates.max_depth = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.database.backend = "postgres".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn load_from_file_with_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_provider = "groq"
default_model = "llama3-70b-8192"

[database]
path = "/var/lib/nexus/templates.db"

[templates]
max_depth = 8
agent_timeout_secs = 15

[profiles]
directory = "/etc/nexus/profiles"
default_profile = "Adam"

[providers.groq]
api_key = "gsk-test"
api_url = "https://api.groq.com/openai/v1"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_provider, "groq");
        assert_eq!(config.templates.max_depth, 8);
        assert_eq!(config.templates.agent_timeout_secs, 15);
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/nexus/templates.db"));
        assert_eq!(config.profiles.default_profile.as_deref(), Some("Adam"));
        assert_eq!(config.provider_api_key("groq").as_deref(), Some("gsk-test"));
        assert_eq!(config.provider_api_key("openai"), None);
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_model = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openai"));
        assert!(toml_str.contains("max_depth"));
    }
}
