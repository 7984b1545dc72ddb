// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Validation and dependency resolution for the nodes of one run.
//!
//! # Validation Pipeline
//!
//! 1. **Uniqueness**: node names and template keys are unique
//! 2. **Roles**: at most one input, output and bookkeeping node
//! 3. **Processors**: every processor node names a registered kind
//! 4. **References**: every declared or template-discovered dependency
//!    resolves to a node, first by template key and then by name
//! 5. **Cycles**: DFS with a recursion stack, reporting the cycle path
//!
//! Errors from stages 1 to 4 accumulate. Cycle detection needs a fully
//! resolved graph, so it only runs when the earlier stages found nothing.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::config::{DependencyGraph, EntryPoints, NodeConfig, NodeRole, ProcessorRegistry};
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    ValidationCompleted, ValidationFailed, ValidationStarted,
};
use crate::observability::messages::StructuredLog;

/// Wiring of a validated run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedGraph {
    /// Node name → template keys the node waits on
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Node name → nodes that receive its output
    pub dependents: DependencyGraph,
    pub entry_points: EntryPoints,
}

impl ResolvedGraph {
    pub fn dependencies_of(&self, node: &str) -> BTreeSet<String> {
        self.dependencies.get(node).cloned().unwrap_or_default()
    }
}

/// Validate `nodes` and resolve every dependency to a template key.
///
/// # Example
/// ```
/// use the_switchboard::config::{validate_node_configs, NodeConfig, ProcessorRegistry};
/// use serde_json::json;
///
/// let nodes = vec![
///     NodeConfig::input(),
///     NodeConfig::processor("shout", "change_text_case")
///         .with_input(json!({"text": "{{ _inputs0.text }}"})),
///     NodeConfig::output(Some("{{ shout }}")),
/// ];
///
/// let graph = validate_node_configs(&nodes, &ProcessorRegistry::with_local_processors()).unwrap();
/// assert_eq!(graph.dependents.get_dependents("input"), ["shout".to_string()]);
/// ```
pub fn validate_node_configs(
    nodes: &[NodeConfig],
    registry: &ProcessorRegistry,
) -> Result<ResolvedGraph, Vec<ValidationError>> {
    ValidationStarted {
        node_count: nodes.len(),
    }
    .log();

    let mut errors = Vec::new();
    errors.extend(validate_unique_names(nodes));
    errors.extend(validate_unique_template_keys(nodes));
    errors.extend(validate_roles(nodes));
    errors.extend(validate_processor_kinds(nodes, registry));

    let resolved = match resolve_dependencies(nodes) {
        Ok(resolved) => Some(resolved),
        Err(unresolved) => {
            errors.extend(unresolved);
            None
        }
    };

    if let (true, Some(resolved)) = (errors.is_empty(), resolved) {
        if let Err(cycle) = validate_acyclic_graph(nodes, &resolved) {
            errors.push(cycle);
        } else {
            ValidationCompleted {
                node_count: nodes.len(),
                edge_count: resolved.dependents.edge_count(),
            }
            .log();
            return Ok(resolved);
        }
    }

    ValidationFailed { errors: &errors }.log();
    Err(errors)
}

fn validate_unique_names(nodes: &[NodeConfig]) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .filter(|node| !seen.insert(node.name.as_str()))
        .map(|node| ValidationError::DuplicateNodeName {
            name: node.name.clone(),
        })
        .collect()
}

fn validate_unique_template_keys(nodes: &[NodeConfig]) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .filter(|node| !seen.insert(node.template_key.as_str()))
        .map(|node| ValidationError::DuplicateTemplateKey {
            template_key: node.template_key.clone(),
        })
        .collect()
}

fn validate_roles(nodes: &[NodeConfig]) -> Vec<ValidationError> {
    [NodeRole::Input, NodeRole::Output, NodeRole::BookKeeping]
        .into_iter()
        .filter_map(|role| {
            let named: Vec<String> = nodes
                .iter()
                .filter(|node| node.role == role)
                .map(|node| node.name.clone())
                .collect();
            (named.len() > 1).then_some(ValidationError::DuplicateRole { role, nodes: named })
        })
        .collect()
}

fn validate_processor_kinds(nodes: &[NodeConfig], registry: &ProcessorRegistry) -> Vec<ValidationError> {
    nodes
        .iter()
        .filter(|node| node.role == NodeRole::Processor)
        .filter_map(|node| match node.processor.as_deref() {
            None | Some("") => Some(ValidationError::MissingProcessorKind {
                node: node.name.clone(),
            }),
            Some(kind) if !registry.contains(kind) => Some(ValidationError::UnknownProcessorKind {
                node: node.name.clone(),
                kind: kind.to_string(),
            }),
            Some(_) => None,
        })
        .collect()
}

fn resolve_dependencies(nodes: &[NodeConfig]) -> Result<ResolvedGraph, Vec<ValidationError>> {
    let by_key: HashMap<&str, &NodeConfig> =
        nodes.iter().map(|n| (n.template_key.as_str(), n)).collect();
    let by_name: HashMap<&str, &NodeConfig> = nodes.iter().map(|n| (n.name.as_str(), n)).collect();

    let mut errors = Vec::new();
    let mut graph = ResolvedGraph::default();

    for node in nodes {
        graph.dependents.add_node(&node.name);

        let mut resolved = BTreeSet::new();
        for dependency in node.dependencies() {
            let target = by_key
                .get(dependency.as_str())
                .or_else(|| by_name.get(dependency.as_str()));
            match target {
                Some(target) => {
                    resolved.insert(target.template_key.clone());
                    graph.dependents.add_edge(&target.name, &node.name);
                }
                None => errors.push(ValidationError::UnresolvedDependency {
                    node: node.name.clone(),
                    missing_dependency: dependency,
                }),
            }
        }

        let waits_on_start = resolved.is_empty()
            && matches!(node.role, NodeRole::Processor | NodeRole::Output);
        if waits_on_start {
            graph.entry_points.add(node.name.clone());
        }
        graph.dependencies.insert(node.name.clone(), resolved);
    }

    // The bookkeeping node waits on a record from every processor and from
    // the output node.
    let reporting_keys: BTreeSet<String> = nodes
        .iter()
        .filter(|n| matches!(n.role, NodeRole::Processor | NodeRole::Output))
        .map(|n| n.template_key.clone())
        .collect();
    for node in nodes.iter().filter(|n| n.role == NodeRole::BookKeeping) {
        graph
            .dependencies
            .insert(node.name.clone(), reporting_keys.clone());
    }

    if errors.is_empty() {
        Ok(graph)
    } else {
        Err(errors)
    }
}

fn validate_acyclic_graph(nodes: &[NodeConfig], graph: &ResolvedGraph) -> Result<(), ValidationError> {
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for node in nodes {
        if !visited.contains(node.name.as_str()) {
            if let Some(cycle) = dfs_cycle_detection(
                &node.name,
                &graph.dependents,
                &mut visited,
                &mut rec_stack,
                &mut path,
            ) {
                return Err(ValidationError::CyclicDependency { cycle });
            }
        }
    }

    Ok(())
}

/// Three-colour DFS over forward edges. A neighbour still on the recursion
/// stack closes a cycle; the path from it to the current node is returned.
fn dfs_cycle_detection(
    node: &str,
    graph: &DependencyGraph,
    visited: &mut HashSet<String>,
    rec_stack: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    visited.insert(node.to_string());
    rec_stack.insert(node.to_string());
    path.push(node.to_string());

    for neighbor in graph.get_dependents(node) {
        if !visited.contains(neighbor) {
            if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                return Some(cycle);
            }
        } else if rec_stack.contains(neighbor) {
            let cycle_start = path.iter().position(|x| x == neighbor).unwrap_or(0);
            let mut cycle = path[cycle_start..].to_vec();
            cycle.push(neighbor.clone());
            return Some(cycle);
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}
