// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{EntryPoints, NodeRole};
use crate::engine::actor::NodeState;
use crate::engine::message::{ControlMessage, Mailbox, Message};
use crate::engine::output_state::{OutputHandle, OutputResult};
use crate::errors::ExecutionError;
use crate::observability::messages::engine::{
    GraphStopped, InputWritten, NodeTaskJoinFailed, RunTimedOut,
};
use crate::observability::messages::StructuredLog;

/// External view of one live node.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    name: String,
    template_key: String,
    role: NodeRole,
    dependencies: BTreeSet<String>,
    mailbox: Mailbox,
    state: watch::Receiver<NodeState>,
}

impl NodeHandle {
    pub(crate) fn new(
        name: String,
        template_key: String,
        role: NodeRole,
        dependencies: BTreeSet<String>,
        mailbox: Mailbox,
        state: watch::Receiver<NodeState>,
    ) -> Self {
        Self {
            name,
            template_key,
            role,
            dependencies,
            mailbox,
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template_key(&self) -> &str {
        &self.template_key
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Template keys this node waits on
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    pub fn state(&self) -> NodeState {
        *self.state.borrow()
    }

    /// Wait until the node reaches a terminal state
    pub async fn wait_for_terminal(&self) -> NodeState {
        let mut rx = self.state.clone();
        let result = rx.wait_for(NodeState::is_terminal).await.map(|s| *s);
        result.unwrap_or_else(|_| *rx.borrow())
    }

    /// Deliver a message straight into the node's mailbox
    pub fn send(&self, message: Message) -> Result<(), ExecutionError> {
        self.mailbox.send(message)
    }
}

/// A running graph for one session and one run.
///
/// Dropping the handle cancels the run without waiting for the node tasks;
/// call [`GraphHandle::stop`] to wait for them.
pub struct GraphHandle {
    session_id: String,
    run_id: Uuid,
    nodes: BTreeMap<String, NodeHandle>,
    input: Option<String>,
    entry_points: EntryPoints,
    output: Option<OutputHandle>,
    run_timeout: Duration,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    input_written: AtomicBool,
    started_at: Instant,
}

pub(crate) struct GraphParts {
    pub session_id: String,
    pub run_id: Uuid,
    pub nodes: BTreeMap<String, NodeHandle>,
    pub input: Option<String>,
    pub entry_points: EntryPoints,
    pub output: Option<OutputHandle>,
    pub run_timeout: Duration,
    pub cancel: CancellationToken,
    pub tasks: Vec<JoinHandle<()>>,
}

impl GraphHandle {
    pub(crate) fn new(parts: GraphParts) -> Self {
        Self {
            session_id: parts.session_id,
            run_id: parts.run_id,
            nodes: parts.nodes,
            input: parts.input,
            entry_points: parts.entry_points,
            output: parts.output,
            run_timeout: parts.run_timeout,
            cancel: parts.cancel,
            tasks: Mutex::new(parts.tasks),
            input_written: AtomicBool::new(false),
            started_at: Instant::now(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn get_node(&self, name: &str) -> Option<&NodeHandle> {
        self.nodes.get(name)
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn output(&self) -> Option<OutputHandle> {
        self.output.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Write the request payload and start the run.
    ///
    /// The payload goes to the input node; nodes without dependencies get
    /// the start signal. Only the first write is accepted.
    pub fn write_input(&self, payload: Value) -> Result<(), ExecutionError> {
        let input = self
            .input
            .as_deref()
            .and_then(|name| self.nodes.get(name))
            .ok_or(ExecutionError::NoInputNode)?;

        if self.input_written.swap(true, Ordering::SeqCst) {
            return Err(ExecutionError::InputAlreadyWritten);
        }

        input.send(Message::Control(ControlMessage::Input(payload)))?;
        for name in self.entry_points.iter() {
            if let Some(node) = self.nodes.get(name) {
                node.send(Message::Control(ControlMessage::Start))?;
            }
        }

        let run_id = self.run_id.to_string();
        InputWritten {
            run_id: &run_id,
            input_node: input.name(),
            entry_point_count: self.entry_points.len(),
        }
        .log();
        Ok(())
    }

    /// Write `payload`, wait for the output under the default run timeout,
    /// then stop the graph.
    pub async fn run(&self, payload: Value) -> Result<OutputResult, ExecutionError> {
        self.run_with_timeout(payload, self.run_timeout).await
    }

    /// Like [`run`](Self::run) with an explicit timeout. The graph is
    /// stopped on every return path, including errors.
    pub async fn run_with_timeout(
        &self,
        payload: Value,
        timeout: Duration,
    ) -> Result<OutputResult, ExecutionError> {
        let started = self
            .output
            .clone()
            .ok_or(ExecutionError::NoOutputNode)
            .and_then(|output| self.write_input(payload).map(|()| output));
        let output = match started {
            Ok(output) => output,
            Err(e) => {
                self.stop().await;
                return Err(e);
            }
        };

        let result = match tokio::time::timeout(timeout, output.get_output()).await {
            Ok(result) => result,
            Err(_) => {
                let run_id = self.run_id.to_string();
                RunTimedOut {
                    run_id: &run_id,
                    timeout,
                }
                .log();
                OutputResult::Stopped
            }
        };

        self.stop().await;
        Ok(result)
    }

    /// Stop every node and wait for their tasks to finish.
    ///
    /// Safe to call repeatedly and from several tasks at once: later callers
    /// wait for the first one to finish tearing down.
    pub async fn stop(&self) {
        self.cancel.cancel();

        let mut tasks = self.tasks.lock().await;
        if tasks.is_empty() {
            return;
        }

        let run_id = self.run_id.to_string();
        for task in tasks.drain(..) {
            if let Err(e) = task.await {
                NodeTaskJoinFailed {
                    run_id: &run_id,
                    error: &e,
                }
                .log();
            }
        }

        GraphStopped {
            run_id: &run_id,
            node_count: self.nodes.len(),
            duration: self.started_at.elapsed(),
        }
        .log();
    }
}

impl Drop for GraphHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
