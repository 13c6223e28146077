//! Placeholder substitution.

use crate::{Error, Result};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
});

/// How undefined variables are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Fail the render on the first undefined variable.
    #[default]
    Strict,
    /// Leave undefined placeholders in the output untouched.
    Permissive,
}

/// Variable table plus render mode for one render call.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    variables: BTreeMap<String, String>,
    mode: RenderMode,
}

impl RenderContext {
    /// Create a strict context over a variable table.
    #[must_use]
    pub fn new(variables: BTreeMap<String, String>) -> Self {
        Self {
            variables,
            mode: RenderMode::Strict,
        }
    }

    /// Switch the context to permissive mode.
    #[must_use]
    pub fn permissive(mut self) -> Self {
        self.mode = RenderMode::Permissive;
        self
    }

    /// Add or replace a single variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Look up a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// The context's render mode.
    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }
}

/// Renders build-definition text.
pub trait Renderer: Send + Sync {
    /// Resolve every placeholder in `template` against `context`.
    fn render(&self, template: &str, context: &RenderContext) -> Result<String>;
}

/// The default `{{ name }}` substitution renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    /// Create a renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, template: &str, context: &RenderContext) -> Result<String> {
        let mut undefined: Option<String> = None;

        let rendered = PLACEHOLDER.replace_all(template, |captures: &Captures<'_>| {
            let name = &captures[1];
            match context.get(name) {
                Some(value) => value.to_string(),
                None => {
                    if context.mode() == RenderMode::Strict && undefined.is_none() {
                        undefined = Some(name.to_string());
                    }
                    captures[0].to_string()
                }
            }
        });

        if let Some(name) = undefined {
            return Err(Error::UndefinedVariable { name });
        }
        Ok(rendered.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> RenderContext {
        RenderContext::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn substitutes_variables() {
        let renderer = TemplateRenderer::new();
        let rendered = renderer
            .render(
                "FROM {{ namespace }}/{{base}}:{{ tag }}\n",
                &context(&[("namespace", "acme"), ("base", "base"), ("tag", "dev")]),
            )
            .unwrap();
        assert_eq!(rendered, "FROM acme/base:dev\n");
    }

    #[test]
    fn strict_mode_fails_on_undefined() {
        let renderer = TemplateRenderer::new();
        let err = renderer
            .render("FROM {{ missing }}/base", &context(&[]))
            .unwrap_err();
        assert!(matches!(err, Error::UndefinedVariable { name } if name == "missing"));
    }

    #[test]
    fn permissive_mode_keeps_placeholder() {
        let renderer = TemplateRenderer::new();
        let rendered = renderer
            .render("FROM {{ missing }}/base", &context(&[]).permissive())
            .unwrap();
        assert_eq!(rendered, "FROM {{ missing }}/base");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let renderer = TemplateRenderer::new();
        let rendered = renderer
            .render("RUN apt-get update\n", &context(&[]))
            .unwrap();
        assert_eq!(rendered, "RUN apt-get update\n");
    }
}
