// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{NodeConfig, NodeRole, ProcessorRegistry};
use crate::errors::CoordinatorError;
use crate::observability::messages::processor::ProcessorInstantiationFailed;
use crate::observability::messages::StructuredLog;
use crate::traits::Processor;
use std::collections::HashMap;
use std::sync::Arc;

/// Processor instances for one run, keyed by node name.
///
/// Built only after the node configurations validated, so every processor
/// node is known to name a registered kind.
#[derive(Clone, Default)]
pub struct ProcessorMap(pub HashMap<String, Arc<dyn Processor>>);

impl ProcessorMap {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Instantiate the processor of every processor node
    pub fn from_nodes(
        nodes: &[NodeConfig],
        registry: &ProcessorRegistry,
    ) -> Result<Self, CoordinatorError> {
        let mut map = HashMap::new();

        for node in nodes.iter().filter(|n| n.role == NodeRole::Processor) {
            let kind = node.processor.as_deref().unwrap_or_default();
            let processor = registry.create(kind, node).map_err(|e| {
                let reason = e.to_string();
                ProcessorInstantiationFailed {
                    node: &node.name,
                    kind,
                    reason: &reason,
                }
                .log();
                CoordinatorError::ProcessorCreation {
                    node: node.name.clone(),
                    reason,
                }
            })?;
            map.insert(node.name.clone(), processor);
        }

        Ok(Self(map))
    }

    pub fn get(&self, node: &str) -> Option<&Arc<dyn Processor>> {
        self.0.get(node)
    }

    pub fn take(&mut self, node: &str) -> Option<Arc<dyn Processor>> {
        self.0.remove(node)
    }

    pub fn contains_key(&self, node: &str) -> bool {
        self.0.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
