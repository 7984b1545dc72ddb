// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for coordinator and graph lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A graph was validated, wired and all of its node tasks spawned.
///
/// # Log Level
/// `info!` - Important operational event
pub struct GraphStarted<'a> {
    pub session_id: &'a str,
    pub run_id: &'a str,
    pub node_count: usize,
    pub entry_point_count: usize,
}

impl Display for GraphStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Started graph for session '{}' (run {}): {} nodes, {} entry points",
            self.session_id, self.run_id, self.node_count, self.entry_point_count
        )
    }
}

impl StructuredLog for GraphStarted<'_> {
    fn log(&self) {
        tracing::info!(
            session_id = self.session_id,
            run_id = self.run_id,
            node_count = self.node_count,
            entry_point_count = self.entry_point_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            session_id = self.session_id,
            run_id = self.run_id,
        )
    }
}

/// Graph construction was rejected before any node was spawned.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct GraphStartFailed<'a> {
    pub session_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for GraphStartFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to start graph for session '{}': {}",
            self.session_id, self.error
        )
    }
}

impl StructuredLog for GraphStartFailed<'_> {
    fn log(&self) {
        tracing::error!(session_id = self.session_id, error = %self.error, "{}", self);
    }
}

/// The run input was written to the input node.
///
/// # Log Level
/// `debug!`
pub struct InputWritten<'a> {
    pub run_id: &'a str,
    pub input_node: &'a str,
    pub entry_point_count: usize,
}

impl Display for InputWritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Input written to '{}' for run {}, starting {} entry points",
            self.input_node, self.run_id, self.entry_point_count
        )
    }
}

impl StructuredLog for InputWritten<'_> {
    fn log(&self) {
        tracing::debug!(
            run_id = self.run_id,
            input_node = self.input_node,
            entry_point_count = self.entry_point_count,
            "{}", self
        );
    }
}

/// Every node task of the graph has finished its stop hook.
///
/// # Log Level
/// `info!` - Important operational event
pub struct GraphStopped<'a> {
    pub run_id: &'a str,
    pub node_count: usize,
    pub duration: Duration,
}

impl Display for GraphStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stopped graph for run {}: {} nodes torn down after {:?}",
            self.run_id, self.node_count, self.duration
        )
    }
}

impl StructuredLog for GraphStopped<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            node_count = self.node_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// The run did not produce a terminal output before its deadline.
///
/// # Log Level
/// `warn!` - Degraded behavior
pub struct RunTimedOut<'a> {
    pub run_id: &'a str,
    pub timeout: Duration,
}

impl Display for RunTimedOut<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Run {} timed out after {:?}, stopping graph", self.run_id, self.timeout)
    }
}

impl StructuredLog for RunTimedOut<'_> {
    fn log(&self) {
        tracing::warn!(
            run_id = self.run_id,
            timeout_ms = self.timeout.as_millis() as u64,
            "{}", self
        );
    }
}

/// A node task panicked or was aborted while the graph was being stopped.
///
/// # Log Level
/// `warn!`
pub struct NodeTaskJoinFailed<'a> {
    pub run_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for NodeTaskJoinFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node task of run {} ended abnormally: {}", self.run_id, self.error)
    }
}

impl StructuredLog for NodeTaskJoinFailed<'_> {
    fn log(&self) {
        tracing::warn!(run_id = self.run_id, error = %self.error, "{}", self);
    }
}
