// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the output node.

use crate::engine::NodeError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// Output rendered its final value.
///
/// # Log Level
/// `info!`
pub struct OutputRendered<'a> {
    pub node: &'a str,
    pub chunk_count: usize,
    pub awaiting_bookkeeping: bool,
}

impl Display for OutputRendered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.awaiting_bookkeeping {
            write!(
                f,
                "Output '{}' rendered after {} chunks, waiting for bookkeeping",
                self.node, self.chunk_count
            )
        } else {
            write!(f, "Output '{}' rendered after {} chunks", self.node, self.chunk_count)
        }
    }
}

impl StructuredLog for OutputRendered<'_> {
    fn log(&self) {
        tracing::info!(
            node = self.node,
            chunk_count = self.chunk_count,
            awaiting_bookkeeping = self.awaiting_bookkeeping,
            "{}", self
        );
    }
}

/// Output finalized with an error payload.
///
/// # Log Level
/// `warn!`
pub struct OutputFailed<'a> {
    pub node: &'a str,
    pub error: &'a NodeError,
}

impl Display for OutputFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Output '{}' finished with error: {}", self.node, self.error)
    }
}

impl StructuredLog for OutputFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            node = self.node,
            source_node = self.error.node.as_str(),
            error_kind = self.error.kind.as_str(),
            "{}", self
        );
    }
}

/// A streamed chunk could not be rendered; the final render still runs.
///
/// # Log Level
/// `debug!`
pub struct PartialRenderSkipped<'a> {
    pub node: &'a str,
    pub sender: &'a str,
    pub reason: &'a str,
}

impl Display for PartialRenderSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Output '{}' skipped partial render for chunk from '{}': {}",
            self.node, self.sender, self.reason
        )
    }
}

impl StructuredLog for PartialRenderSkipped<'_> {
    fn log(&self) {
        tracing::debug!(node = self.node, sender = self.sender, reason = self.reason, "{}", self);
    }
}
