// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Messages exchanged between nodes, and the mailboxes that carry them.
//!
//! Every node owns one unbounded inbound channel. Nothing else is shared
//! between nodes: values are cloned into the message at send time.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use tokio::sync::mpsc;

use crate::engine::records::BookKeepingRecord;
use crate::errors::ExecutionError;

/// An addressed payload routed to exactly one node.
#[derive(Debug, Clone)]
pub enum Message {
    /// Output of an upstream node, keyed by the sender's template key
    ProcessorOutput { sender: String, payload: Payload },
    /// Structured error sent downstream in place of an output
    Error { sender: String, error: NodeError },
    /// Execution record sent to the bookkeeping node
    Bookkeeping {
        sender: String,
        record: BookKeepingRecord,
    },
    Control(ControlMessage),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Partial output; more chunks or a `Complete` follow
    Chunk(Value),
    /// Final output of the sender
    Complete(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// Request payload written to the input node
    Input(Value),
    /// The run started; nodes without dependencies activate
    Start,
    /// The bookkeeping node collected every expected record
    BookkeepingComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Bookkeeping,
    ProcessorOutput,
    Error,
    Control,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Bookkeeping => "bookkeeping",
            MessageKind::ProcessorOutput => "processor_output",
            MessageKind::Error => "error",
            MessageKind::Control => "control",
        }
    }
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::ProcessorOutput { .. } => MessageKind::ProcessorOutput,
            Message::Error { .. } => MessageKind::Error,
            Message::Bookkeeping { .. } => MessageKind::Bookkeeping,
            Message::Control(_) => MessageKind::Control,
        }
    }

    /// Template key of the sending node, if the message came from a node
    pub fn sender(&self) -> Option<&str> {
        match self {
            Message::ProcessorOutput { sender, .. }
            | Message::Error { sender, .. }
            | Message::Bookkeeping { sender, .. } => Some(sender),
            Message::Control(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeErrorKind {
    /// The wrapped processor returned an error
    Processor,
    /// Input or config could not be hydrated from upstream values
    Hydration,
    /// The output template failed to render
    Render,
    /// A dependency failed, so the node never ran
    Upstream,
    /// The wrapped processor panicked
    Panicked,
}

impl NodeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeErrorKind::Processor => "processor",
            NodeErrorKind::Hydration => "hydration",
            NodeErrorKind::Render => "render",
            NodeErrorKind::Upstream => "upstream",
            NodeErrorKind::Panicked => "panicked",
        }
    }
}

/// Structured error value that travels through the graph like an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeError {
    /// Name of the node the error originated at
    pub node: String,
    pub kind: NodeErrorKind,
    pub message: String,
}

impl NodeError {
    pub fn new(node: impl Into<String>, kind: NodeErrorKind, message: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            kind,
            message: message.into(),
        }
    }

    /// Error payload handed to the transport layer
    pub fn to_payload(&self) -> Value {
        json!({
            "errors": [{
                "node": self.node,
                "kind": self.kind,
                "message": self.message,
            }]
        })
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error in '{}': {}", self.kind.as_str(), self.node, self.message)
    }
}

/// Sending half of a node's inbound channel.
#[derive(Debug, Clone)]
pub struct Mailbox {
    node: String,
    tx: mpsc::UnboundedSender<Message>,
}

impl Mailbox {
    pub fn new(node: impl Into<String>, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            node: node.into(),
            tx,
        }
    }

    /// Name of the node that owns this mailbox
    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn send(&self, message: Message) -> Result<(), ExecutionError> {
        self.tx
            .send(message)
            .map_err(|_| ExecutionError::MailboxClosed(self.node.clone()))
    }
}

/// Fan-out of one node's results to the mailboxes of its dependents.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    sender: String,
    targets: Vec<Mailbox>,
}

impl Outbox {
    pub fn new(sender: impl Into<String>, targets: Vec<Mailbox>) -> Self {
        Self {
            sender: sender.into(),
            targets,
        }
    }

    /// Template key stamped on every outgoing message
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn emit_chunk(&self, chunk: Value) {
        self.broadcast(|sender| Message::ProcessorOutput {
            sender,
            payload: Payload::Chunk(chunk.clone()),
        });
    }

    pub fn complete(&self, value: Value) {
        self.broadcast(|sender| Message::ProcessorOutput {
            sender,
            payload: Payload::Complete(value.clone()),
        });
    }

    pub fn fail(&self, error: NodeError) {
        self.broadcast(|sender| Message::Error {
            sender,
            error: error.clone(),
        });
    }

    fn broadcast(&self, build: impl Fn(String) -> Message) {
        for target in &self.targets {
            // A closed mailbox means the graph is being torn down.
            if let Err(e) = target.send(build(self.sender.clone())) {
                tracing::trace!(sender = self.sender.as_str(), error = %e, "dropped outgoing message");
            }
        }
    }
}
