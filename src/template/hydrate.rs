// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Substitution pass over a node's template-bearing input or config.
//!
//! Every string leaf is rendered against the values delivered by upstream
//! nodes. A string made of exactly one `{{ expression }}` is replaced by the
//! expression's value instead of its text, so `"{{ search.rows }}"` hydrates
//! to the array itself. The hydrated JSON is then decoded into the
//! processor's typed input/config (see [`Typed`](crate::traits::Typed)).

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::errors::TemplateError;
use crate::template::{TemplateContext, TemplateRenderer};

static SINGLE_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*\{\{-?\s*(?P<expr>.*?)\s*-?\}\}\s*$").expect("valid single expression regex")
});

pub fn hydrate(
    value: &Value,
    context: &TemplateContext,
    renderer: &dyn TemplateRenderer,
) -> Result<Value, TemplateError> {
    match value {
        Value::String(s) => hydrate_str(s, context, renderer),
        Value::Array(items) => items
            .iter()
            .map(|item| hydrate(item, context, renderer))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut hydrated = Map::with_capacity(map.len());
            for (key, item) in map {
                hydrated.insert(key.clone(), hydrate(item, context, renderer)?);
            }
            Ok(Value::Object(hydrated))
        }
        other => Ok(other.clone()),
    }
}

fn hydrate_str(
    s: &str,
    context: &TemplateContext,
    renderer: &dyn TemplateRenderer,
) -> Result<Value, TemplateError> {
    if !s.contains("{{") && !s.contains("{%") {
        return Ok(Value::String(s.to_string()));
    }

    if let Some(captures) = SINGLE_EXPRESSION.captures(s) {
        let expression = &captures["expr"];
        if !expression.contains("{{") && !expression.contains("}}") && !s.contains("{%") {
            return renderer.evaluate(expression, context);
        }
    }

    renderer.render(s, context).map(Value::String)
}
