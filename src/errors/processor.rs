// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by processor business logic.

use thiserror::Error;

/// Failure returned from a processor call.
///
/// The node that wraps the processor converts this into a
/// [`NodeError`](crate::engine::NodeError) and sends it downstream in place
/// of an output, so it never crosses a node boundary as a Rust error.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Failed(String),

    #[error("failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProcessorError {
    pub fn failed(message: impl Into<String>) -> Self {
        ProcessorError::Failed(message.into())
    }
}
