// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use minijinja::{Environment, UndefinedBehavior};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::TemplateError;

/// Values delivered by upstream nodes, keyed by their template key.
pub type TemplateContext = BTreeMap<String, Value>;

/// Pluggable template engine used for hydration and output rendering.
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` to text against `context`
    fn render(&self, template: &str, context: &TemplateContext) -> Result<String, TemplateError>;

    /// Evaluate a bare expression (the inside of `{{ ... }}`) to a value
    fn evaluate(&self, expression: &str, context: &TemplateContext) -> Result<Value, TemplateError>;
}

/// [`TemplateRenderer`] backed by MiniJinja.
///
/// Undefined lookups are chainable, so `{{ a.b.c }}` renders empty while `a`
/// has not been delivered yet. The output node relies on this when it renders
/// partial results during streaming.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &TemplateContext) -> Result<String, TemplateError> {
        self.env
            .render_str(template, context)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }

    fn evaluate(&self, expression: &str, context: &TemplateContext) -> Result<Value, TemplateError> {
        let to_error = |e: minijinja::Error| TemplateError::Expression {
            expression: expression.to_string(),
            reason: e.to_string(),
        };

        let compiled = self.env.compile_expression(expression).map_err(to_error)?;
        let value = compiled.eval(context).map_err(to_error)?;

        if value.is_undefined() || value.is_none() {
            return Ok(Value::Null);
        }
        Ok(serde_json::to_value(&value)?)
    }
}
