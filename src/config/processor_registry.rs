// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::NodeConfig;
use crate::errors::ProcessorError;
use crate::traits::Processor;

/// Builds a processor instance for one node.
pub type ProcessorFactory =
    Arc<dyn Fn(&NodeConfig) -> Result<Arc<dyn Processor>, ProcessorError> + Send + Sync>;

/// Explicit map from processor kind to factory, injected into the
/// coordinator.
///
/// # Example
/// ```
/// use the_switchboard::config::ProcessorRegistry;
///
/// let registry = ProcessorRegistry::with_local_processors();
/// assert!(registry.contains("change_text_case"));
/// assert!(!registry.contains("llm_chat"));
/// ```
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    factories: BTreeMap<String, ProcessorFactory>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every processor of the local backend
    pub fn with_local_processors() -> Self {
        let mut registry = Self::new();
        crate::backends::local::register_local_processors(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&NodeConfig) -> Result<Arc<dyn Processor>, ProcessorError> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    /// Register a processor that is shared by every node using `kind`
    pub fn register_instance(&mut self, kind: impl Into<String>, processor: Arc<dyn Processor>) -> &mut Self {
        self.register(kind, move |_| Ok(processor.clone()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, kind: &str, node: &NodeConfig) -> Result<Arc<dyn Processor>, ProcessorError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ProcessorError::InvalidConfig(format!("unknown processor kind '{}'", kind)))?;
        factory(node)
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
