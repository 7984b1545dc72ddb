// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The per-node task loop.
//!
//! Every node runs as one tokio task that owns its state and pulls messages
//! from a private mailbox strictly in arrival order. Nodes never share
//! mutable state; the only things visible from outside are the node's
//! [`NodeState`] (published through a watch channel) and, for the output
//! node, its output state.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::NodeRole;
use crate::engine::message::Message;
use crate::observability::messages::node::{NodeStopped, UnexpectedMessage};
use crate::observability::messages::StructuredLog;

/// Lifecycle of a node within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    Created,
    /// Accumulating dependency values
    Waiting,
    /// Running its work (processor call, render)
    Activating,
    /// Processor and input nodes: output emitted
    Completed,
    /// Output and bookkeeping nodes: finished normally
    Done,
    Stopped,
    Errored,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Created => "created",
            NodeState::Waiting => "waiting",
            NodeState::Activating => "activating",
            NodeState::Completed => "completed",
            NodeState::Done => "done",
            NodeState::Stopped => "stopped",
            NodeState::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeState::Completed | NodeState::Done | NodeState::Stopped | NodeState::Errored
        )
    }
}

/// What a node task can see of the run while handling a message.
pub struct ActorContext {
    state: watch::Sender<NodeState>,
    cancel: CancellationToken,
}

impl ActorContext {
    pub fn new(state: watch::Sender<NodeState>, cancel: CancellationToken) -> Self {
        Self { state, cancel }
    }

    pub fn state(&self) -> NodeState {
        *self.state.borrow()
    }

    pub fn set_state(&self, state: NodeState) {
        self.state.send_replace(state);
    }

    /// Cancelled when the graph is stopped
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[async_trait]
pub trait Actor: Send + 'static {
    fn name(&self) -> &str;

    fn role(&self) -> NodeRole;

    /// Handle one message. Called strictly sequentially.
    async fn handle(&mut self, message: Message, ctx: &ActorContext);

    /// Called once when the graph stops, before the task exits
    async fn on_stop(&mut self, _ctx: &ActorContext) {}
}

/// Log and drop a message the node has no use for.
pub(crate) fn ignore(node: &str, message: &Message) {
    UnexpectedMessage {
        node,
        kind: message.kind().as_str(),
        sender: message.sender(),
    }
    .log();
}

/// Drive `actor` until the run is cancelled or every sender is gone.
///
/// Cancellation is checked before each message, so a stop never waits for
/// the mailbox to drain. Nodes still short of a terminal state end as
/// [`NodeState::Stopped`].
pub async fn run_actor<A: Actor>(
    mut actor: A,
    mut mailbox: mpsc::UnboundedReceiver<Message>,
    ctx: ActorContext,
) {
    if ctx.state() == NodeState::Created {
        ctx.set_state(NodeState::Waiting);
    }

    loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            message = mailbox.recv() => match message {
                Some(message) => actor.handle(message, &ctx).await,
                None => break,
            },
        }
    }

    actor.on_stop(&ctx).await;

    let state = ctx.state();
    if !state.is_terminal() {
        NodeStopped {
            node: actor.name(),
            state: state.as_str(),
        }
        .log();
        ctx.set_state(NodeState::Stopped);
    }
}
