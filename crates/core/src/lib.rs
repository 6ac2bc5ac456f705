//! # Nexus Core
//!
//! Domain types, traits, and error definitions for the Nexus prompt template
//! engine. This crate has **zero framework dependencies**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the template engine is defined as a trait here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod agent;
pub mod nexus;
pub mod template;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, Error, ProviderError, Result, StoreError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use agent::{Agent, AgentProfile};
pub use nexus::{Nexus, Participant, ParticipantType};
pub use template::{PromptTemplate, TemplateStore};
