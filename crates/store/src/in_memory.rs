//! In-memory template registry: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use nexus_core::error::StoreError;
use nexus_core::template::{PromptTemplate, TemplateStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory registry keyed by template name.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryTemplateStore {
    templates: Arc<RwLock<BTreeMap<String, PromptTemplate>>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self {
            templates: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Seed a registry with templates (later duplicates overwrite earlier ones).
    pub fn with_templates(templates: impl IntoIterator<Item = PromptTemplate>) -> Self {
        let map = templates
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        Self {
            templates: Arc::new(RwLock::new(map)),
        }
    }
}

impl Default for InMemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn add(&self, mut template: PromptTemplate) -> Result<(), StoreError> {
        let mut templates = self.templates.write().await;
        if templates.contains_key(&template.name) {
            return Err(StoreError::Duplicate(template.name));
        }
        template.updated_at = Utc::now();
        templates.insert(template.name.clone(), template);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<PromptTemplate>, StoreError> {
        Ok(self.templates.read().await.get(name).cloned())
    }

    async fn update(&self, name: &str, mut template: PromptTemplate) -> Result<(), StoreError> {
        let mut templates = self.templates.write().await;
        if !templates.contains_key(name) {
            return Err(StoreError::NotFound(name.to_string()));
        }
        if template.name != name && templates.contains_key(&template.name) {
            return Err(StoreError::Duplicate(template.name));
        }
        templates.remove(name);
        template.updated_at = Utc::now();
        templates.insert(template.name.clone(), template);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<u64, StoreError> {
        Ok(u64::from(self.templates.write().await.remove(name).is_some()))
    }

    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.templates.read().await.keys().cloned().collect())
    }
}
