//! Template registry trait: named prompt template definitions.
//!
//! The registry is a passive fact table: the engine resolves partials
//! through `get` and never writes during execution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::StoreError;

/// A named prompt template definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Unique template name
    pub name: String,

    /// YAML document with optional `inputs`, `outputs` and `helpers` sections
    pub content: String,

    /// Declared input field names (informational)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,

    /// Declared output field names (informational)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,

    /// When this template was last written
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Attach the declared input and output field names.
    pub fn with_fields(mut self, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }
}

/// The core TemplateStore trait.
///
/// Implementations: SQLite, in-memory (for testing).
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Add a new template. Fails with `StoreError::Duplicate` if the name exists.
    async fn add(&self, template: PromptTemplate) -> std::result::Result<(), StoreError>;

    /// Get a template by name.
    async fn get(&self, name: &str) -> std::result::Result<Option<PromptTemplate>, StoreError>;

    /// Replace the template stored under `name`. The replacement may carry a
    /// new name, which must not collide with another template.
    async fn update(&self, name: &str, template: PromptTemplate) -> std::result::Result<(), StoreError>;

    /// Delete a template by name, returning the number of rows removed.
    async fn delete(&self, name: &str) -> std::result::Result<u64, StoreError>;

    /// All template names, ascending.
    async fn list_names(&self) -> std::result::Result<Vec<String>, StoreError>;
}
