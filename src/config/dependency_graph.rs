// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

/// Forward edges of a run: node name → names of the nodes that depend on it.
///
/// Bookkeeping edges are not part of this graph; records travel on their own
/// channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph(pub BTreeMap<String, Vec<String>>);

impl DependencyGraph {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Ensure a node is present even if nothing depends on it
    pub fn add_node(&mut self, node: impl Into<String>) {
        self.0.entry(node.into()).or_default();
    }

    pub fn add_edge(&mut self, dependency: &str, dependent: &str) {
        let dependents = self.0.entry(dependency.to_string()).or_default();
        if !dependents.iter().any(|d| d == dependent) {
            dependents.push(dependent.to_string());
        }
    }

    pub fn get_dependents(&self, node: &str) -> &[String] {
        self.0.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn edge_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl From<BTreeMap<String, Vec<String>>> for DependencyGraph {
    fn from(graph: BTreeMap<String, Vec<String>>) -> Self {
        Self(graph)
    }
}
