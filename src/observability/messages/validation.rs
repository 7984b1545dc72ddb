// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node configuration validation.

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Configuration validation started.
///
/// # Log Level
/// `debug!`
///
/// # Example
/// ```
/// use the_switchboard::observability::messages::validation::ValidationStarted;
///
/// let msg = ValidationStarted {
///     node_count: 5,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ValidationStarted {
    pub node_count: usize,
}

impl Display for ValidationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting configuration validation for {} nodes",
            self.node_count
        )
    }
}

impl StructuredLog for ValidationStarted {
    fn log(&self) {
        tracing::debug!(node_count = self.node_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            node_count = self.node_count,
        )
    }
}

/// Configuration validation completed successfully.
///
/// # Log Level
/// `debug!`
pub struct ValidationCompleted {
    pub node_count: usize,
    pub edge_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Configuration validation completed successfully for {} nodes and {} dependency edges",
            self.node_count, self.edge_count
        )
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::debug!(
            node_count = self.node_count,
            edge_count = self.edge_count,
            "{}", self
        );
    }
}

/// Configuration validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationFailed<'a> {
    pub errors: &'a [ValidationError],
}

impl Display for ValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Configuration validation failed with {} errors",
            self.errors.len()
        )?;
        for error in self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl StructuredLog for ValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(error_count = self.errors.len(), "{}", self);
    }
}
