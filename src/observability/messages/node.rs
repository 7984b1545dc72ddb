// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node activation and message delivery.

use crate::engine::NodeError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// All dependencies of a node delivered and it is about to run.
///
/// # Log Level
/// `debug!`
pub struct NodeActivated<'a> {
    pub node: &'a str,
    pub role: &'a str,
    pub dependency_count: usize,
}

impl Display for NodeActivated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} node '{}' activated after {} dependencies delivered",
            self.role, self.node, self.dependency_count
        )
    }
}

impl StructuredLog for NodeActivated<'_> {
    fn log(&self) {
        tracing::debug!(
            node = self.node,
            role = self.role,
            dependency_count = self.dependency_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("node", span_name = name, node = self.node, role = self.role)
    }
}

/// A node produced its output and broadcast it.
///
/// # Log Level
/// `info!` - Important operational event
pub struct NodeCompleted<'a> {
    pub node: &'a str,
    pub dependent_count: usize,
    pub duration: Duration,
}

impl Display for NodeCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' completed in {:?}, notified {} dependents",
            self.node, self.duration, self.dependent_count
        )
    }
}

impl StructuredLog for NodeCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            node = self.node,
            dependent_count = self.dependent_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// A node emitted an error value downstream instead of an output.
///
/// # Log Level
/// `warn!` - the run continues, the error travels as data
pub struct NodeFailed<'a> {
    pub node: &'a str,
    pub error: &'a NodeError,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' failed: {}", self.node, self.error)
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            node = self.node,
            source_node = self.error.node.as_str(),
            error_kind = self.error.kind.as_str(),
            "{}", self
        );
    }
}

/// A dependency delivered a second value; it is ignored.
///
/// # Log Level
/// `debug!`
pub struct DuplicateDelivery<'a> {
    pub node: &'a str,
    pub sender: &'a str,
}

impl Display for DuplicateDelivery<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' ignored a repeated delivery from '{}'",
            self.node, self.sender
        )
    }
}

impl StructuredLog for DuplicateDelivery<'_> {
    fn log(&self) {
        tracing::debug!(node = self.node, sender = self.sender, "{}", self);
    }
}

/// A node received a message it has no use for.
///
/// # Log Level
/// `debug!`
pub struct UnexpectedMessage<'a> {
    pub node: &'a str,
    pub kind: &'a str,
    pub sender: Option<&'a str>,
}

impl Display for UnexpectedMessage<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.sender {
            Some(sender) => write!(
                f,
                "Node '{}' ignored {} message from '{}'",
                self.node, self.kind, sender
            ),
            None => write!(f, "Node '{}' ignored {} message", self.node, self.kind),
        }
    }
}

impl StructuredLog for UnexpectedMessage<'_> {
    fn log(&self) {
        tracing::debug!(node = self.node, kind = self.kind, sender = self.sender, "{}", self);
    }
}

/// A node was stopped before it reached a terminal state.
///
/// # Log Level
/// `debug!`
pub struct NodeStopped<'a> {
    pub node: &'a str,
    pub state: &'a str,
}

impl Display for NodeStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' stopped while {}", self.node, self.state)
    }
}

impl StructuredLog for NodeStopped<'_> {
    fn log(&self) {
        tracing::debug!(node = self.node, state = self.state, "{}", self);
    }
}
