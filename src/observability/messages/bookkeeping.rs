// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for record collection, session persistence and history jobs.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

pub struct RecordCollected<'a> {
    pub sender: &'a str,
    pub collected: usize,
    pub expected: usize,
    pub is_error: bool,
}

impl Display for RecordCollected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Collected record from '{}' ({}/{})",
            self.sender, self.collected, self.expected
        )
    }
}

impl StructuredLog for RecordCollected<'_> {
    fn log(&self) {
        tracing::debug!(
            sender = self.sender,
            collected = self.collected,
            expected = self.expected,
            is_error = self.is_error,
            "{}", self
        );
    }
}

/// Every expected record arrived.
///
/// # Log Level
/// `info!`
pub struct BookkeepingCompleted<'a> {
    pub run_id: &'a str,
    pub record_count: usize,
    pub error_count: usize,
}

impl Display for BookkeepingCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Bookkeeping for run {} complete: {} records, {} errors",
            self.run_id, self.record_count, self.error_count
        )
    }
}

impl StructuredLog for BookkeepingCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            record_count = self.record_count,
            error_count = self.error_count,
            "{}", self
        );
    }
}

pub struct SessionStatePersisted<'a> {
    pub session_id: &'a str,
    pub node_key: &'a str,
}

impl Display for SessionStatePersisted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Persisted session state for '{}' in session '{}'",
            self.node_key, self.session_id
        )
    }
}

impl StructuredLog for SessionStatePersisted<'_> {
    fn log(&self) {
        tracing::debug!(session_id = self.session_id, node_key = self.node_key, "{}", self);
    }
}

/// Writing session state failed. The run continues.
///
/// # Log Level
/// `error!`
pub struct SessionStatePersistFailed<'a> {
    pub session_id: &'a str,
    pub node_key: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for SessionStatePersistFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to persist session state for '{}' in session '{}': {}",
            self.node_key, self.session_id, self.error
        )
    }
}

impl StructuredLog for SessionStatePersistFailed<'_> {
    fn log(&self) {
        tracing::error!(
            session_id = self.session_id,
            node_key = self.node_key,
            error = %self.error,
            "{}", self
        );
    }
}

pub struct HistoryEnqueued<'a> {
    pub run_id: &'a str,
    pub record_count: usize,
    pub complete: bool,
}

impl Display for HistoryEnqueued<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Enqueued history for run {} with {} records (complete={})",
            self.run_id, self.record_count, self.complete
        )
    }
}

impl StructuredLog for HistoryEnqueued<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            record_count = self.record_count,
            complete = self.complete,
            "{}", self
        );
    }
}

/// The history job could not be enqueued. Teardown continues.
///
/// # Log Level
/// `error!`
pub struct HistoryEnqueueFailed<'a> {
    pub run_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for HistoryEnqueueFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to enqueue history for run {}: {}", self.run_id, self.error)
    }
}

impl StructuredLog for HistoryEnqueueFailed<'_> {
    fn log(&self) {
        tracing::error!(run_id = self.run_id, error = %self.error, "{}", self);
    }
}

pub struct HistoryWriteFailed<'a> {
    pub run_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for HistoryWriteFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "History worker failed to write run {}: {}", self.run_id, self.error)
    }
}

impl StructuredLog for HistoryWriteFailed<'_> {
    fn log(&self) {
        tracing::error!(run_id = self.run_id, error = %self.error, "{}", self);
    }
}

/// A run summary was dropped because no history writer is configured.
///
/// # Log Level
/// `debug!`
pub struct HistoryDiscarded<'a> {
    pub run_id: &'a str,
    pub session_id: &'a str,
    pub complete: bool,
}

impl Display for HistoryDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No history writer configured, dropping run {} of session '{}'",
            self.run_id, self.session_id
        )
    }
}

impl StructuredLog for HistoryDiscarded<'_> {
    fn log(&self) {
        tracing::debug!(
            run_id = self.run_id,
            session_id = self.session_id,
            complete = self.complete,
            "{}", self
        );
    }
}

/// The history queue is still shared at shutdown, so queued jobs are not
/// awaited.
///
/// # Log Level
/// `warn!`
pub struct HistoryFlushSkipped {
    pub references: usize,
}

impl Display for HistoryFlushSkipped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "History queue still has {} other owners, skipping flush on shutdown",
            self.references
        )
    }
}

impl StructuredLog for HistoryFlushSkipped {
    fn log(&self) {
        tracing::warn!(references = self.references, "{}", self);
    }
}
