// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it through `tracing` with typed fields.
//!
//! * `engine` - coordinator and graph lifecycle events
//! * `node` - per-node activation, completion and delivery events
//! * `output` - output node finalization
//! * `bookkeeping` - record collection, session persistence and history jobs
//! * `processor` - processor execution inside the local backend
//! * `validation` - configuration validation
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_switchboard::observability::messages::engine::GraphStarted;
//! use the_switchboard::observability::messages::StructuredLog;
//!
//! let msg = GraphStarted {
//!     session_id: "session-1",
//!     run_id: "run-1",
//!     node_count: 4,
//!     entry_point_count: 1,
//! };
//!
//! msg.log();
//! ```

use std::fmt::Display;
use tracing::Span;

pub mod bookkeeping;
pub mod engine;
pub mod node;
pub mod output;
pub mod processor;
pub mod validation;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog: Display {
    /// Emit the message at its level with its fields attached
    fn log(&self);

    /// Build a span carrying the message's fields
    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("event", span_name = name)
    }
}
