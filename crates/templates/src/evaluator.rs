//! Parse tree evaluation.
//!
//! Nodes are rendered strictly left to right. Missing variables render as
//! empty text; unknown helpers and partials render as empty text with a
//! warning. Everything else that fails aborts the render.

use std::sync::Arc;

use nexus_core::Agent;
use tracing::{debug, warn};

use crate::TemplateError;
use crate::engine::{Context, TemplateEngine};
use crate::helpers::HelperSet;
use crate::parser::{Arg, Node, ParseTree};

pub(crate) struct Evaluator<'a> {
    pub engine: &'a TemplateEngine,
    pub agent: &'a Arc<dyn Agent>,
    pub helpers: &'a HelperSet,
    pub context: &'a Context,
    /// Partial nesting depth of the template being rendered.
    pub depth: usize,
}

impl Evaluator<'_> {
    pub async fn render(&self, tree: &ParseTree) -> Result<String, TemplateError> {
        let mut out = String::new();
        for node in &tree.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable(name) => {
                    if let Some(value) = self.context.get(name) {
                        out.push_str(value);
                    }
                }
                Node::Helper { name, args } => out.push_str(&self.helper(name, args).await?),
                Node::Partial { name, args } => out.push_str(&self.partial(name, args).await?),
            }
        }
        Ok(out)
    }

    async fn helper(&self, name: &str, args: &[Arg]) -> Result<String, TemplateError> {
        let values: Vec<String> = self
            .resolve_args(args)
            .into_iter()
            .map(|(_, value)| value)
            .collect();

        if !self.helpers.contains(name) {
            warn!(helper = name, "Helper not found");
            return Ok(String::new());
        }

        debug!(helper = name, args = ?values, "Calling helper");
        self.helpers.call(name, values).await
    }

    async fn partial(&self, name: &str, args: &[Arg]) -> Result<String, TemplateError> {
        let Some(template) = self.engine.store().get(name).await? else {
            warn!(partial = name, "Partial not found");
            return Ok(String::new());
        };

        let depth = self.depth + 1;
        if depth > self.engine.max_depth() {
            return Err(TemplateError::Recursion {
                name: name.to_string(),
                max_depth: self.engine.max_depth(),
            });
        }

        // Partials see the caller's context; arguments only name what they use.
        let passed: Vec<String> = self
            .resolve_args(args)
            .into_iter()
            .map(|(token, _)| token)
            .collect();
        debug!(partial = name, depth, args = ?passed, "Rendering partial");
        let execution = self
            .engine
            .run(self.agent, &template.content, self.context, depth)
            .await?;
        Ok(execution.result().unwrap_or_default().to_string())
    }

    /// Evaluate raw arguments into one blob, split it into tokens and look
    /// each token up. Tokens without a non-empty value are dropped.
    fn resolve_args(&self, args: &[Arg]) -> Vec<(String, String)> {
        let blob: String = args
            .iter()
            .map(|arg| match arg {
                Arg::Text(text) => text.as_str(),
                Arg::Variable(name) => self.context.get(name).map(String::as_str).unwrap_or(""),
            })
            .collect();

        split_args(&blob)
            .into_iter()
            .filter_map(|token| {
                self.context
                    .get(token)
                    .filter(|value| !value.is_empty())
                    .map(|value| (token.to_string(), value.clone()))
            })
            .collect()
    }
}

/// Split an argument blob: on commas if it has any, else on spaces, else
/// as a single token. Tokens are trimmed and empty ones skipped.
pub(crate) fn split_args(blob: &str) -> Vec<&str> {
    let blob = blob.trim();
    let tokens: Vec<&str> = if blob.contains(',') {
        blob.split(',').collect()
    } else if blob.contains(' ') {
        blob.split(' ').collect()
    } else {
        vec![blob]
    };
    tokens
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_takes_precedence() {
        assert_eq!(split_args("hello,world"), vec!["hello", "world"]);
        assert_eq!(split_args(" a b, c "), vec!["a b", "c"]);
    }

    #[test]
    fn space_split_without_comma() {
        assert_eq!(split_args("hello world"), vec!["hello", "world"]);
        assert_eq!(split_args(" input  name"), vec!["input", "name"]);
    }

    #[test]
    fn single_token() {
        assert_eq!(split_args("hello"), vec!["hello"]);
        assert_eq!(split_args(" input "), vec!["input"]);
        assert!(split_args("   ").is_empty());
    }
}
