//! Agent profile loading.
//!
//! A profile file is YAML with a top-level `agentProfile` mapping:
//!
//! ```yaml
//! agentProfile:
//!   name: "Adam"
//!   avatar: "🧑"
//!   persona: "You are a helpful assistant."
//!   preferredFunctions: []
//! ```
//!
//! Files without that key are ignored. Files that fail to parse are skipped
//! with a warning so one bad profile never hides the rest.

use std::path::Path;

use nexus_core::AgentProfile;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct ProfileFile {
    #[serde(rename = "agentProfile")]
    agent_profile: Option<AgentProfile>,
}

/// Profiles in load order.
#[derive(Debug, Clone, Default)]
pub struct ProfileManager {
    profiles: Vec<AgentProfile>,
}

impl ProfileManager {
    pub fn from_profiles(profiles: Vec<AgentProfile>) -> Self {
        Self { profiles }
    }

    /// Load every `*.yaml` / `*.yml` profile in `dir`, sorted by file name.
    ///
    /// A missing directory yields an empty manager.
    pub fn load_dir(dir: &Path) -> Self {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "No profiles directory");
                return Self::default();
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        paths.sort();

        let mut profiles = Vec::new();
        for path in paths {
            match load_file(&path) {
                Ok(Some(profile)) => {
                    debug!(profile = %profile.name, path = %path.display(), "Loaded profile");
                    profiles.push(profile);
                }
                Ok(None) => debug!(path = %path.display(), "No agentProfile key, skipping"),
                Err(reason) => warn!(path = %path.display(), %reason, "Skipping invalid profile"),
            }
        }

        Self { profiles }
    }

    /// First profile with the given name.
    pub fn get(&self, name: &str) -> Option<&AgentProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    pub fn profiles(&self) -> &[AgentProfile] {
        &self.profiles
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn load_file(path: &Path) -> Result<Option<AgentProfile>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let file: ProfileFile = serde_yaml::from_str(&content).map_err(|e| e.to_string())?;
    Ok(file.agent_profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_yaml_and_yml_profiles() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "adam.yaml",
            "agentProfile:\n  name: Adam\n  avatar: \"🧑\"\n  persona: You are Adam.\n  preferredFunctions:\n    - search\n",
        );
        write(dir.path(), "eve.yml", "agentProfile:\n  name: Eve\n  persona: You are Eve.\n");
        write(dir.path(), "notes.txt", "agentProfile:\n  name: Ignored\n");

        let manager = ProfileManager::load_dir(dir.path());
        assert_eq!(manager.names(), vec!["Adam", "Eve"]);

        let adam = manager.get("Adam").unwrap();
        assert_eq!(adam.persona, "You are Adam.");
        assert_eq!(adam.avatar, "🧑");
        assert_eq!(adam.preferred_functions, vec!["search"]);
        assert!(manager.get("Nobody").is_none());
    }

    #[test]
    fn skips_files_without_profile_key() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "other.yaml", "settings:\n  theme: dark\n");
        assert!(ProfileManager::load_dir(dir.path()).is_empty());
    }

    #[test]
    fn skips_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.yaml", "agentProfile: [unclosed\n");
        write(dir.path(), "good.yaml", "agentProfile:\n  name: Good\n");

        let manager = ProfileManager::load_dir(dir.path());
        assert_eq!(manager.names(), vec!["Good"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ProfileManager::load_dir(&dir.path().join("absent"));
        assert!(manager.is_empty());
    }
}
