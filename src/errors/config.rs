// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::config::NodeRole;

/// Errors that can occur while validating the node configurations of a run
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A circular dependency was detected in the node graph
    CyclicDependency {
        /// The cycle path showing the circular dependency
        cycle: Vec<String>,
    },
    /// A node references a dependency that doesn't resolve to any node
    UnresolvedDependency {
        /// The node that has the unresolved dependency
        node: String,
        /// The dependency that couldn't be resolved
        missing_dependency: String,
    },
    /// Two nodes share a name
    DuplicateNodeName { name: String },
    /// Two nodes share a template key
    DuplicateTemplateKey { template_key: String },
    /// More than one node was configured for a role that allows only one
    DuplicateRole { role: NodeRole, nodes: Vec<String> },
    /// A processor node did not name its processor kind
    MissingProcessorKind { node: String },
    /// A processor node names a kind that is not registered
    UnknownProcessorKind { node: String, kind: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedDependency {
                node,
                missing_dependency,
            } => {
                write!(
                    f,
                    "Unknown dependency: node '{}' depends on '{}' which does not exist",
                    node, missing_dependency
                )
            }
            ValidationError::DuplicateNodeName { name } => {
                write!(f, "Duplicate node name: '{}'", name)
            }
            ValidationError::DuplicateTemplateKey { template_key } => {
                write!(f, "Duplicate template key: '{}'", template_key)
            }
            ValidationError::DuplicateRole { role, nodes } => {
                write!(
                    f,
                    "Only one {:?} node is allowed per run, found: {}",
                    role,
                    nodes.join(", ")
                )
            }
            ValidationError::MissingProcessorKind { node } => {
                write!(f, "Processor node '{}' is missing its 'processor' kind", node)
            }
            ValidationError::UnknownProcessorKind { node, kind } => {
                write!(
                    f,
                    "Processor node '{}' uses unknown processor kind '{}'",
                    node, kind
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a pipeline file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read pipeline file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML pipeline: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse TOML pipeline: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported pipeline file extension '{0}' (expected yaml, yml or toml)")]
    UnsupportedFormat(String),

    #[error("configuration validation failed:\n{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    Invalid(Vec<ValidationError>),
}
