//! Template engine: runs a definition's input and output phases.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use nexus_config::TemplateEngineConfig;
use nexus_core::error::{AgentError, StoreError};
use nexus_core::{Agent, Nexus, PromptTemplate, TemplateStore};
use tracing::{debug, info, warn};

use crate::TemplateError;
use crate::evaluator::Evaluator;
use crate::helpers::{HelperEnv, HelperSet};
use crate::model::{TemplateDefinition, TemplateFields};
use crate::parser::parse;

/// Variables visible while rendering, by name.
pub type Context = HashMap<String, String>;

/// The artifacts of one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateExecution {
    /// Rendered input template
    pub iprompt: Option<String>,
    /// Agent reply to `iprompt`, or `iprompt` itself for non-prompt phases
    pub iresult: Option<String>,
    /// Rendered output template
    pub oprompt: Option<String>,
    /// Agent reply to `oprompt`, or `oprompt` itself for non-prompt phases
    pub oresult: Option<String>,
}

impl TemplateExecution {
    /// The final result: the output phase's when it ran, else the input phase's.
    pub fn result(&self) -> Option<&str> {
        self.oresult.as_deref().or(self.iresult.as_deref())
    }
}

/// Executes prompt templates against an agent.
///
/// The engine owns no templates itself; partials are resolved through the
/// injected store and every execution compiles its own helpers.
pub struct TemplateEngine {
    store: Arc<dyn TemplateStore>,
    nexus: Arc<dyn Nexus>,
    max_depth: usize,
    agent_timeout: Duration,
}

impl TemplateEngine {
    pub const DEFAULT_MAX_DEPTH: usize = 32;
    pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(store: Arc<dyn TemplateStore>, nexus: Arc<dyn Nexus>) -> Self {
        Self {
            store,
            nexus,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            agent_timeout: Self::DEFAULT_AGENT_TIMEOUT,
        }
    }

    /// Build an engine with limits taken from configuration.
    pub fn from_config(
        config: &TemplateEngineConfig,
        store: Arc<dyn TemplateStore>,
        nexus: Arc<dyn Nexus>,
    ) -> Self {
        Self::new(store, nexus)
            .with_max_depth(config.max_depth)
            .with_agent_timeout(Duration::from_secs(config.agent_timeout_secs))
    }

    /// Maximum partial nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Bound on each agent call.
    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn agent_timeout(&self) -> Duration {
        self.agent_timeout
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    /// Execute a definition and return all four phase artifacts.
    pub async fn execute_template(
        &self,
        agent: &Arc<dyn Agent>,
        content: &str,
        inputs: &Context,
    ) -> Result<TemplateExecution, TemplateError> {
        self.run(agent, content, inputs, 0).await
    }

    /// Execute a definition the way a partial is executed, returning only
    /// its final result.
    pub async fn execute_partial(
        &self,
        agent: &Arc<dyn Agent>,
        content: &str,
        inputs: &Context,
    ) -> Result<Option<String>, TemplateError> {
        let execution = self.run(agent, content, inputs, 0).await?;
        Ok(execution.result().map(String::from))
    }

    /// Load a stored template by name and execute it.
    pub async fn execute_named(
        &self,
        agent: &Arc<dyn Agent>,
        name: &str,
        inputs: &Context,
    ) -> Result<TemplateExecution, TemplateError> {
        let template = self
            .store
            .get(name)
            .await?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        info!(template = name, agent = agent.name(), "Executing template");
        self.execute_template(agent, &template.content, inputs).await
    }

    /// Declared input and output field names of a definition.
    pub fn template_fields(&self, content: &str) -> Result<TemplateFields, TemplateError> {
        Ok(TemplateDefinition::parse(content)?.fields())
    }

    pub async fn add_template(&self, name: &str, content: &str) -> Result<(), TemplateError> {
        self.store.add(describe(name, content)).await?;
        info!(template = name, "Template added");
        Ok(())
    }

    pub async fn get_template(&self, name: &str) -> Result<Option<PromptTemplate>, TemplateError> {
        Ok(self.store.get(name).await?)
    }

    /// Replace a template's content, optionally renaming it.
    pub async fn update_template(
        &self,
        name: &str,
        new_name: &str,
        content: &str,
    ) -> Result<(), TemplateError> {
        self.store.update(name, describe(new_name, content)).await?;
        info!(template = name, new_name, "Template updated");
        Ok(())
    }

    pub async fn delete_template(&self, name: &str) -> Result<u64, TemplateError> {
        Ok(self.store.delete(name).await?)
    }

    pub async fn template_names(&self) -> Result<Vec<String>, TemplateError> {
        Ok(self.store.list_names().await?)
    }

    /// One full execution at the given partial nesting depth.
    pub(crate) fn run<'a>(
        &'a self,
        agent: &'a Arc<dyn Agent>,
        content: &'a str,
        inputs: &'a Context,
        depth: usize,
    ) -> BoxFuture<'a, Result<TemplateExecution, TemplateError>> {
        Box::pin(async move {
            let definition = TemplateDefinition::parse(content)?;
            let helpers = HelperSet::compile(
                &definition.helper_sources(),
                HelperEnv {
                    agent: agent.clone(),
                    nexus: self.nexus.clone(),
                    agent_timeout: self.agent_timeout,
                },
            )?;
            debug!(depth, helpers = ?helpers.names(), "Definition loaded");

            let mut execution = TemplateExecution::default();

            if let Some(phase) = &definition.inputs {
                if let Some(template) = &phase.template {
                    let vars = phase.resolve(inputs);
                    let prompt = self.render(agent, &helpers, template, &vars, depth).await?;
                    let result = if phase.is_prompt() {
                        self.ask(agent, &prompt).await?
                    } else {
                        prompt.clone()
                    };
                    execution.iprompt = Some(prompt);
                    execution.iresult = Some(result);
                }
            }

            if let Some(phase) = &definition.outputs {
                if let Some(template) = &phase.template {
                    if phase.field_names().is_empty() {
                        debug!(depth, "Output phase skipped: no declared fields");
                    } else {
                        let mut seed = inputs.clone();
                        if let Some(result) = &execution.iresult {
                            seed.insert("output".to_string(), result.clone());
                        }
                        let vars = phase.resolve(&seed);
                        let prompt = self.render(agent, &helpers, template, &vars, depth).await?;
                        let result = if phase.is_prompt() {
                            self.ask(agent, &prompt).await?
                        } else {
                            prompt.clone()
                        };
                        execution.oprompt = Some(prompt);
                        execution.oresult = Some(result);
                    }
                }
            }

            Ok(execution)
        })
    }

    async fn render(
        &self,
        agent: &Arc<dyn Agent>,
        helpers: &HelperSet,
        source: &str,
        context: &Context,
        depth: usize,
    ) -> Result<String, TemplateError> {
        let tree = parse(source)?;
        let evaluator = Evaluator {
            engine: self,
            agent,
            helpers,
            context,
            depth,
        };
        evaluator.render(&tree).await
    }

    async fn ask(&self, agent: &Arc<dyn Agent>, prompt: &str) -> Result<String, TemplateError> {
        Ok(ask_agent(agent.as_ref(), agent.persona(), prompt, self.agent_timeout).await?)
    }
}

/// One bounded `get_semantic_response` call.
pub(crate) async fn ask_agent(
    agent: &dyn Agent,
    persona: &str,
    prompt: &str,
    timeout: Duration,
) -> Result<String, AgentError> {
    debug!(agent = agent.name(), prompt_len = prompt.len(), "Requesting semantic response");
    match tokio::time::timeout(timeout, agent.get_semantic_response(persona, prompt)).await {
        Ok(reply) => reply,
        Err(_) => {
            warn!(agent = agent.name(), ?timeout, "Agent call timed out");
            Err(AgentError::Timeout {
                agent: agent.name().to_string(),
                timeout_secs: timeout.as_secs(),
            })
        }
    }
}

/// A registry record for `content`, with its declared fields filled in.
fn describe(name: &str, content: &str) -> PromptTemplate {
    let fields = match TemplateDefinition::parse(content) {
        Ok(definition) => definition.fields(),
        Err(e) => {
            warn!(template = name, error = %e, "Definition unreadable; storing without fields");
            TemplateFields::default()
        }
    };
    PromptTemplate::new(name, content).with_fields(fields.inputs, fields.outputs)
}
