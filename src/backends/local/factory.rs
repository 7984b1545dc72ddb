// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::processors::*;
use crate::config::{NodeConfig, ProcessorRegistry};
use crate::errors::ProcessorError;
use crate::traits::{Processor, Typed};

/// Factory for creating local (in-process) processor instances
pub struct LocalProcessorFactory;

impl LocalProcessorFactory {
    /// Create a processor instance for `kind`.
    ///
    /// Local processors read their settings from the node's hydrated
    /// `config` at call time, so the node itself is only used for error
    /// reporting.
    pub fn create_processor(kind: &str, node: &NodeConfig) -> Result<Arc<dyn Processor>, ProcessorError> {
        match kind {
            "echo" => Ok(Arc::new(EchoProcessor::new())),
            "change_text_case" => Ok(Arc::new(Typed(ChangeTextCaseProcessor::new()))),
            "reverse_text" => Ok(Arc::new(Typed(ReverseTextProcessor::new()))),
            "token_counter" => Ok(Arc::new(Typed(TokenCounterProcessor::new()))),
            "word_stream" => Ok(Arc::new(Typed(WordStreamProcessor::new()))),
            "session_counter" => Ok(Arc::new(Typed(SessionCounterProcessor::new()))),
            "fail" => Ok(Arc::new(Typed(FailProcessor::new()))),
            _ => Err(ProcessorError::InvalidConfig(format!(
                "Unknown local processor '{}' for node '{}'",
                kind, node.name
            ))),
        }
    }

    pub fn list_available_implementations() -> &'static [&'static str] {
        &[
            "echo",
            "change_text_case",
            "reverse_text",
            "token_counter",
            "word_stream",
            "session_counter",
            "fail",
        ]
    }
}

/// Add a factory for every local processor kind to `registry`
pub fn register_local_processors(registry: &mut ProcessorRegistry) {
    for kind in LocalProcessorFactory::list_available_implementations() {
        let kind = *kind;
        registry.register(kind, move |node: &NodeConfig| {
            LocalProcessorFactory::create_processor(kind, node)
        });
    }
}
