//! Data model for template definitions.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::TemplateError;

/// Keys of a phase that are not user-defined context fields.
const RESERVED_KEYS: [&str; 2] = ["template", "type"];

/// A decoded template definition.
///
/// Can be loaded from YAML:
/// ```yaml
/// inputs:
///   type: prompt
///   name:
///     type: string
///     default: John
///   template: "I am {{name}}"
/// outputs:
///   template: "Hello, {{output}}!"
/// helpers:
///   upper: |
///     def upper(arg):
///         return arg.upper()
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateDefinition {
    #[serde(default)]
    pub inputs: Option<PhaseSpec>,

    #[serde(default)]
    pub outputs: Option<PhaseSpec>,

    /// Helper name → source snippet defining exactly that function.
    #[serde(default)]
    pub helpers: Option<BTreeMap<String, String>>,
}

/// One phase (`inputs` or `outputs`) of a template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhaseSpec {
    /// `prompt` sends the rendered text to the agent; anything else passes it through.
    #[serde(default, rename = "type")]
    pub phase_type: Option<String>,

    /// Template text for this phase.
    #[serde(default)]
    pub template: Option<String>,

    /// User-defined context fields and their declarations.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_yaml::Value>,
}

/// Declared field names of a definition, for discovery UIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateFields {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl TemplateDefinition {
    /// Decode a YAML definition.
    pub fn parse(content: &str) -> Result<Self, TemplateError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| {
            let (line, column) = e
                .location()
                .map(|loc| (loc.line(), loc.column()))
                .unwrap_or((0, 0));
            TemplateError::Definition {
                line,
                column,
                reason: e.to_string(),
                content: content.to_string(),
            }
        })
    }

    /// Declared field names of both phases.
    pub fn fields(&self) -> TemplateFields {
        TemplateFields {
            inputs: self
                .inputs
                .as_ref()
                .map(PhaseSpec::field_names)
                .unwrap_or_default(),
            outputs: self
                .outputs
                .as_ref()
                .map(PhaseSpec::field_names)
                .unwrap_or_default(),
        }
    }

    pub fn helper_sources(&self) -> BTreeMap<String, String> {
        self.helpers.clone().unwrap_or_default()
    }
}

impl PhaseSpec {
    /// Whether this phase sends its rendered text to the agent.
    pub fn is_prompt(&self) -> bool {
        self.phase_type.as_deref() == Some("prompt")
    }

    /// Field names, excluding the reserved `template` and `type` keys.
    pub fn field_names(&self) -> Vec<String> {
        self.fields
            .keys()
            .filter(|k| !RESERVED_KEYS.contains(&k.as_str()))
            .cloned()
            .collect()
    }

    /// Resolve effective variables: the seed wins, then the declared
    /// default, then empty string.
    pub fn resolve(&self, seed: &HashMap<String, String>) -> HashMap<String, String> {
        let mut vars = seed.clone();
        for name in self.field_names() {
            if vars.contains_key(&name) {
                continue;
            }
            let value = self
                .fields
                .get(&name)
                .and_then(declared_default)
                .unwrap_or_default();
            vars.insert(name, value);
        }
        vars
    }
}

/// The default carried by a field declaration, if any.
///
/// A plain scalar is its own default; a mapping carries it under `default`.
fn declared_default(decl: &serde_yaml::Value) -> Option<String> {
    match decl {
        serde_yaml::Value::Mapping(map) => map.get("default").and_then(scalar_to_string),
        other => scalar_to_string(other),
    }
}

/// Stringify a YAML value for use in an execution context. Null is absent.
pub(crate) fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        other => serde_json::to_string(other).ok(),
    }
}
