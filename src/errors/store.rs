// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for the session store and history collaborators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("session state for '{session_id}/{node_key}' is corrupt: {reason}")]
    Corrupt {
        session_id: String,
        node_key: String,
        reason: String,
    },
}

/// A history job could not be handed to the background worker.
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("history queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("history worker has shut down")]
    Closed,
}

/// A history writer failed to persist a job.
#[derive(Debug, Error)]
pub enum HistoryWriteError {
    #[error("failed to write history: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}
