// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::NodeRole;
use crate::engine::actor::{ignore, Actor, ActorContext, NodeState};
use crate::engine::message::{ControlMessage, Message, Outbox};
use crate::observability::messages::node::{DuplicateDelivery, NodeCompleted};
use crate::observability::messages::StructuredLog;

/// Entry node of the graph: broadcasts the request payload once.
pub struct InputNode {
    name: String,
    outbox: Outbox,
    written: bool,
}

impl InputNode {
    pub fn new(name: impl Into<String>, outbox: Outbox) -> Self {
        Self {
            name: name.into(),
            outbox,
            written: false,
        }
    }
}

#[async_trait]
impl Actor for InputNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> NodeRole {
        NodeRole::Input
    }

    async fn handle(&mut self, message: Message, ctx: &ActorContext) {
        match message {
            Message::Control(ControlMessage::Input(payload)) => {
                if self.written {
                    DuplicateDelivery {
                        node: &self.name,
                        sender: "client",
                    }
                    .log();
                    return;
                }
                self.written = true;

                let started = std::time::Instant::now();
                ctx.set_state(NodeState::Activating);
                self.outbox.complete(payload);
                ctx.set_state(NodeState::Completed);

                NodeCompleted {
                    node: &self.name,
                    dependent_count: self.outbox.len(),
                    duration: started.elapsed(),
                }
                .log();
            }
            other => ignore(&self.name, &other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::message::{Mailbox, Payload};
    use serde_json::json;
    use tokio::sync::{mpsc, watch};
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_payload_is_broadcast_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let outbox = Outbox::new("_inputs0", vec![Mailbox::new("proc", tx)]);
        let mut node = InputNode::new("input", outbox);
        let (state_tx, state_rx) = watch::channel(NodeState::Waiting);
        let ctx = ActorContext::new(state_tx, CancellationToken::new());

        node.handle(Message::Control(ControlMessage::Input(json!({"text": "hi"}))), &ctx)
            .await;
        node.handle(Message::Control(ControlMessage::Input(json!({"text": "again"}))), &ctx)
            .await;

        match rx.try_recv().unwrap() {
            Message::ProcessorOutput {
                sender,
                payload: Payload::Complete(value),
            } => {
                assert_eq!(sender, "_inputs0");
                assert_eq!(value, json!({"text": "hi"}));
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(*state_rx.borrow(), NodeState::Completed);
    }
}
