// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

use crate::config::consts::{
    BOOKKEEPING_NODE_NAME, BOOKKEEPING_TEMPLATE_KEY, INPUT_NODE_NAME, INPUT_TEMPLATE_KEY,
    OUTPUT_NODE_NAME, OUTPUT_TEMPLATE_KEY,
};
use crate::template::{extract_dependencies, extract_from_str, root_identifier};

/// What a node does in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Input,
    Processor,
    Output,
    #[serde(rename = "bookkeeping")]
    BookKeeping,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Input => "input",
            NodeRole::Processor => "processor",
            NodeRole::Output => "output",
            NodeRole::BookKeeping => "bookkeeping",
        }
    }
}

/// Static description of one node for one run.
///
/// # Example
/// ```
/// use the_switchboard::config::NodeConfig;
/// use serde_json::json;
///
/// let node = NodeConfig::processor("shout", "change_text_case")
///     .with_input(json!({"text": "{{ _inputs0.text }}"}))
///     .with_config(json!({"case_type": "upper"}));
///
/// assert!(node.dependencies().contains("_inputs0"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub template_key: String,
    pub role: NodeRole,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Registered processor kind (processor nodes only)
    #[serde(default)]
    pub processor: Option<String>,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub config: Value,
    /// Output template (output node only)
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub wait_for_bookkeeping: bool,
    #[serde(default)]
    pub options: HashMap<String, Value>,
}

impl NodeConfig {
    fn with_role(name: impl Into<String>, template_key: impl Into<String>, role: NodeRole) -> Self {
        Self {
            name: name.into(),
            template_key: template_key.into(),
            role,
            depends_on: Vec::new(),
            processor: None,
            input: Value::Null,
            config: Value::Null,
            template: None,
            wait_for_bookkeeping: false,
            options: HashMap::new(),
        }
    }

    pub fn input() -> Self {
        Self::with_role(INPUT_NODE_NAME, INPUT_TEMPLATE_KEY, NodeRole::Input)
    }

    /// A processor node; its template key defaults to its name.
    pub fn processor(name: impl Into<String>, kind: impl Into<String>) -> Self {
        let name = name.into();
        let mut node = Self::with_role(name.clone(), name, NodeRole::Processor);
        node.processor = Some(kind.into());
        node
    }

    pub fn output(template: Option<&str>) -> Self {
        let mut node = Self::with_role(OUTPUT_NODE_NAME, OUTPUT_TEMPLATE_KEY, NodeRole::Output);
        node.template = template.map(str::to_string);
        node
    }

    pub fn bookkeeping() -> Self {
        Self::with_role(
            BOOKKEEPING_NODE_NAME,
            BOOKKEEPING_TEMPLATE_KEY,
            NodeRole::BookKeeping,
        )
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_template_key(mut self, template_key: impl Into<String>) -> Self {
        self.template_key = template_key.into();
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn wait_for_bookkeeping(mut self, wait: bool) -> Self {
        self.wait_for_bookkeeping = wait;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Declared plus template-discovered dependencies, truncated to their
    /// root identifiers.
    ///
    /// The bookkeeping node's dependencies depend on the rest of the graph
    /// and are computed when the graph is wired.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut dependencies: BTreeSet<String> = self
            .depends_on
            .iter()
            .map(|d| root_identifier(d).to_string())
            .filter(|d| !d.is_empty())
            .collect();

        match self.role {
            NodeRole::Processor => {
                dependencies.extend(extract_dependencies(&self.input));
                dependencies.extend(extract_dependencies(&self.config));
            }
            NodeRole::Output => {
                if let Some(template) = &self.template {
                    dependencies.extend(extract_from_str(template));
                }
            }
            NodeRole::Input | NodeRole::BookKeeping => {}
        }

        dependencies
    }
}
