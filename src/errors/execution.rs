// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::{StoreError, ValidationError};

/// Errors raised by [`Coordinator::start`](crate::engine::Coordinator::start).
///
/// All of these happen before any node task is spawned.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("configuration validation failed:\n{}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("failed to create processor for node '{node}': {reason}")]
    ProcessorCreation { node: String, reason: String },

    #[error("failed to read session state for node '{node}': {source}")]
    SessionState {
        node: String,
        #[source]
        source: StoreError,
    },
}

impl CoordinatorError {
    /// Validation errors carried by this error, if any
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            CoordinatorError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors raised while driving a running graph.
#[derive(Debug, Error, PartialEq)]
pub enum ExecutionError {
    #[error("graph has no input node")]
    NoInputNode,

    #[error("graph has no output node")]
    NoOutputNode,

    #[error("input was already written for this run")]
    InputAlreadyWritten,

    #[error("node '{0}' not found")]
    NodeNotFound(String),

    #[error("mailbox of node '{0}' is closed")]
    MailboxClosed(String),
}
