// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for processor execution and lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Processor instantiation from the registry
//! * Processor execution lifecycle (start, completion, failure)

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Processor execution started.
///
/// # Log Level
/// `debug!`
///
/// # Example
/// ```
/// use the_switchboard::observability::messages::processor::ProcessorExecutionStarted;
///
/// let msg = ProcessorExecutionStarted {
///     processor_id: "reverse_text",
///     node: "reverse",
///     input_size: 11,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ProcessorExecutionStarted<'a> {
    pub processor_id: &'a str,
    pub node: &'a str,
    pub input_size: usize,
}

impl Display for ProcessorExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' on node '{}' execution started: input_size={} chars",
            self.processor_id, self.node, self.input_size
        )
    }
}

impl StructuredLog for ProcessorExecutionStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            processor_id = self.processor_id,
            node = self.node,
            input_size = self.input_size,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "processor_execution",
            span_name = name,
            processor_id = self.processor_id,
            node = self.node,
        )
    }
}

/// Processor execution completed successfully.
///
/// # Log Level
/// `debug!`
pub struct ProcessorExecutionCompleted<'a> {
    pub processor_id: &'a str,
    pub input_size: usize,
    pub output_size: usize,
    pub duration: std::time::Duration,
}

impl Display for ProcessorExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' completed: input={} chars, output={} chars, duration={:?}",
            self.processor_id, self.input_size, self.output_size, self.duration
        )
    }
}

impl StructuredLog for ProcessorExecutionCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            processor_id = self.processor_id,
            input_size = self.input_size,
            output_size = self.output_size,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// Processor instantiation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ProcessorInstantiationFailed<'a> {
    pub node: &'a str,
    pub kind: &'a str,
    pub reason: &'a str,
}

impl Display for ProcessorInstantiationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to instantiate processor '{}' for node '{}': {}",
            self.kind, self.node, self.reason
        )
    }
}

impl StructuredLog for ProcessorInstantiationFailed<'_> {
    fn log(&self) {
        tracing::error!(node = self.node, kind = self.kind, reason = self.reason, "{}", self);
    }
}
