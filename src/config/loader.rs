// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::{DEFAULT_HISTORY_QUEUE_CAPACITY, DEFAULT_RUN_TIMEOUT_SECS};
use crate::config::{validate_node_configs, NodeConfig, ProcessorRegistry};
use crate::errors::ConfigError;

/// A pipeline definition: ordered processing steps plus the boundary nodes.
///
/// # Example
/// ```yaml
/// run:
///   timeout_seconds: 10
///   history_path: history.jsonl
/// processors:
///   - name: shout
///     processor: change_text_case
///     input:
///       text: "{{ _inputs0.text }}"
///     config:
///       case_type: upper
///   - name: flip
///     processor: reverse_text
///     input:
///       text: "{{ shout.text }}"
/// output:
///   template: "{{ flip.text }}"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub run: RunOptions,
    pub processors: Vec<ProcessorStep>,
    #[serde(default)]
    pub output: OutputConfig,
    /// Add a bookkeeping node to the run (defaults to true)
    #[serde(default = "default_true")]
    pub bookkeeping: bool,
}

fn default_true() -> bool {
    true
}

/// Options that apply to the whole run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunOptions {
    pub timeout_seconds: Option<u64>,
    pub history_queue_capacity: Option<usize>,
    /// Append run history as JSON lines to this file
    pub history_path: Option<String>,
}

impl RunOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_RUN_TIMEOUT_SECS))
    }

    pub fn history_queue_capacity(&self) -> usize {
        self.history_queue_capacity
            .unwrap_or(DEFAULT_HISTORY_QUEUE_CAPACITY)
    }
}

/// One processing step.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorStep {
    pub name: String,
    /// Defaults to `name`
    pub template_key: Option<String>,
    pub processor: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub options: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    pub template: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub wait_for_bookkeeping: bool,
}

impl PipelineConfig {
    /// Node configurations for one run, boundary nodes included.
    ///
    /// An output with neither a template nor explicit dependencies passes
    /// through the value of the last processing step.
    pub fn node_configs(&self) -> Vec<NodeConfig> {
        let mut nodes = Vec::with_capacity(self.processors.len() + 3);
        nodes.push(NodeConfig::input());

        for step in &self.processors {
            let mut node = NodeConfig::processor(&step.name, &step.processor)
                .with_input(step.input.clone())
                .with_config(step.config.clone())
                .depends_on(step.depends_on.iter().cloned());
            if let Some(key) = &step.template_key {
                node = node.with_template_key(key);
            }
            node.options = step.options.clone();
            nodes.push(node);
        }

        let mut output = NodeConfig::output(self.output.template.as_deref())
            .depends_on(self.output.depends_on.iter().cloned())
            .wait_for_bookkeeping(self.output.wait_for_bookkeeping);
        if output.template.is_none() && output.depends_on.is_empty() {
            if let Some(last) = self.processors.last() {
                output = output.depends_on([last.name.clone()]);
            }
        }
        nodes.push(output);

        if self.bookkeeping {
            nodes.push(NodeConfig::bookkeeping());
        }

        nodes
    }
}

/// Load a pipeline from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let content = fs::read_to_string(path)?;
    match extension.as_str() {
        "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
        "toml" => Ok(toml::from_str(&content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Load a pipeline and validate the node graph it produces.
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
    registry: &ProcessorRegistry,
) -> Result<PipelineConfig, ConfigError> {
    let cfg = load_config(path)?;
    validate_node_configs(&cfg.node_configs(), registry).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
