// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Actor engine: one tokio task per node, wired by mailboxes.
//!
//! The [`Coordinator`] validates a set of node configurations, builds the
//! nodes and returns a [`GraphHandle`]. Writing an input payload to the
//! handle activates the entry points; every node then runs once all of its
//! dependencies have delivered, and the output node publishes the result
//! through an [`OutputHandle`].

pub mod actor;
pub mod bookkeeping_node;
pub mod coordinator;
pub mod graph;
pub mod input_node;
pub mod message;
pub mod output_node;
pub mod output_state;
pub mod processor_node;
pub mod records;

#[cfg(test)]
pub mod integration_tests;

pub use actor::{Actor, ActorContext, NodeState};
pub use coordinator::{Coordinator, CoordinatorBuilder, CoordinatorOptions};
pub use graph::{GraphHandle, NodeHandle};
pub use message::{ControlMessage, Message, NodeError, NodeErrorKind, Payload};
pub use output_state::{OutputEvent, OutputHandle, OutputResult, OutputState};
pub use records::{BookKeepingRecord, HistoryJob, RunRecord, RunSummary};
