//! Prompt templates: a two-phase, Handlebars-flavoured prompt pipeline.
//!
//! A template is a YAML document with an `inputs` phase, an optional
//! `outputs` phase and optional `helpers`. Each phase holds a small
//! template text that is rendered against an execution context and, when
//! the phase `type` is `prompt`, sent to an agent.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌─────────────┐
//! │  YAML       │───▶│  Template    │───▶│   Agent      │
//! │  definition │    │  Engine      │    │  (model)     │
//! └─────────────┘    └──────┬───────┘    └─────────────┘
//!                           │
//!               ┌───────────┼───────────┐
//!               ▼           ▼           ▼
//!           parser     evaluator    helpers
//!                           │
//!                           ▼
//!                  partials (registry)
//! ```
//!
//! # Template syntax
//!
//! ```text
//! Hello {{name}}!                 variable (missing → empty)
//! {{#upper name}}                 helper call, args looked up in context
//! {{>signature name, role}}       partial, rendered from the registry
//! ```
//!
//! # Example definition
//!
//! ```yaml
//! inputs:
//!   type: prompt
//!   name:
//!     type: string
//!   template: |
//!     I am {{name}}, what is your name?
//! outputs:
//!   output:
//!     type: string
//!   template: "Hello, {{output}}!"
//! helpers:
//!   shout: |
//!     def shout(text):
//!         return text.upper() + "!"
//! ```

mod engine;
mod evaluator;
mod helpers;
mod model;
mod parser;

pub use engine::{Context, TemplateEngine, TemplateExecution};
pub use helpers::{HelperEnv, HelperSet};
pub use model::{PhaseSpec, TemplateDefinition, TemplateFields};
pub use parser::{Arg, Node, ParseTree, parse};

use nexus_core::error::{AgentError, StoreError};

/// Errors from the template subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Error parsing template definition at line {line}, column {column}: {reason}\n\n{content}")]
    Definition {
        line: usize,
        column: usize,
        reason: String,
        content: String,
    },

    #[error("{message}, at line {line} col {column}\n\n{excerpt}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        excerpt: String,
    },

    #[error("failed to compile helper '{name}': {reason}")]
    HelperCompilation { name: String, reason: String },

    #[error("helper '{name}' failed: {reason}")]
    HelperExecution { name: String, reason: String },

    #[error("partial '{name}' exceeds the maximum template nesting depth of {max_depth}")]
    Recursion { name: String, max_depth: usize },

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
