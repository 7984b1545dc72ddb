// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Node wrapping a [`Processor`].
//!
//! The node waits for one complete value from every dependency, hydrates
//! its input and config against those values, calls the processor exactly
//! once and then broadcasts the result (or a [`NodeError`]) to its
//! dependents and a record to the bookkeeping node.

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::config::NodeRole;
use crate::engine::actor::{ignore, Actor, ActorContext, NodeState};
use crate::engine::message::{
    ControlMessage, Mailbox, Message, NodeError, NodeErrorKind, Outbox, Payload,
};
use crate::engine::records::BookKeepingRecord;
use crate::observability::messages::node::{
    DuplicateDelivery, NodeActivated, NodeCompleted, NodeFailed,
};
use crate::observability::messages::StructuredLog;
use crate::template::{hydrate, TemplateContext, TemplateRenderer};
use crate::traits::{Processor, ProcessorContext};

pub struct ProcessorNode {
    name: String,
    template_key: String,
    dependencies: BTreeSet<String>,
    input: Value,
    config: Value,
    processor: Arc<dyn Processor>,
    renderer: Arc<dyn TemplateRenderer>,
    session_id: String,
    session_state: Option<Value>,
    outbox: Outbox,
    bookkeeping: Option<Mailbox>,
    received: TemplateContext,
    activated: bool,
}

/// Everything a processor node needs besides its processor.
pub struct ProcessorNodeParts {
    pub name: String,
    pub template_key: String,
    pub dependencies: BTreeSet<String>,
    pub input: Value,
    pub config: Value,
    pub session_id: String,
    pub session_state: Option<Value>,
    pub outbox: Outbox,
    pub bookkeeping: Option<Mailbox>,
}

impl ProcessorNode {
    pub fn new(
        parts: ProcessorNodeParts,
        processor: Arc<dyn Processor>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            name: parts.name,
            template_key: parts.template_key,
            dependencies: parts.dependencies,
            input: parts.input,
            config: parts.config,
            processor,
            renderer,
            session_id: parts.session_id,
            session_state: parts.session_state,
            outbox: parts.outbox,
            bookkeeping: parts.bookkeeping,
            received: BTreeMap::new(),
            activated: false,
        }
    }

    fn all_delivered(&self) -> bool {
        self.dependencies.iter().all(|d| self.received.contains_key(d))
    }

    /// Accept a delivery from `sender`. Returns `false` if it must be dropped.
    fn accept(&self, sender: &str) -> bool {
        if !self.dependencies.contains(sender) {
            return false;
        }
        if self.activated || self.received.contains_key(sender) {
            DuplicateDelivery {
                node: &self.name,
                sender,
            }
            .log();
            return false;
        }
        true
    }

    async fn activate(&mut self, ctx: &ActorContext) {
        self.activated = true;
        ctx.set_state(NodeState::Activating);
        NodeActivated {
            node: &self.name,
            role: NodeRole::Processor.as_str(),
            dependency_count: self.dependencies.len(),
        }
        .log();

        let started = Instant::now();
        let renderer = self.renderer.as_ref();
        let hydrated = hydrate(&self.input, &self.received, renderer).and_then(|input| {
            hydrate(&self.config, &self.received, renderer).map(|config| (input, config))
        });
        let (input, config) = match hydrated {
            Ok(hydrated) => hydrated,
            Err(e) => {
                let error = NodeError::new(&self.name, NodeErrorKind::Hydration, e.to_string());
                let (input, config) = (self.input.clone(), self.config.clone());
                self.fail(error, input, config, ctx);
                return;
            }
        };

        let processor_ctx = ProcessorContext::new(
            &self.name,
            &self.session_id,
            self.session_state.clone(),
        )
        .with_outbox(self.outbox.clone());

        let call = AssertUnwindSafe(self.processor.process(
            input.clone(),
            config.clone(),
            &processor_ctx,
        ))
        .catch_unwind();

        let outcome = tokio::select! {
            // The run loop marks the node stopped.
            _ = ctx.cancel_token().cancelled() => return,
            outcome = call => outcome,
        };

        match outcome {
            Ok(Ok(output)) => {
                self.outbox.complete(output.clone());
                let record = BookKeepingRecord::success(&self.name, input, config, output)
                    .with_session_data(processor_ctx.take_session_update());
                self.report(record);
                ctx.set_state(NodeState::Completed);

                NodeCompleted {
                    node: &self.name,
                    dependent_count: self.outbox.len(),
                    duration: started.elapsed(),
                }
                .log();
            }
            Ok(Err(e)) => {
                let error = NodeError::new(&self.name, NodeErrorKind::Processor, e.to_string());
                self.fail(error, input, config, ctx);
            }
            Err(panic) => {
                let error = NodeError::new(
                    &self.name,
                    NodeErrorKind::Panicked,
                    panic_message(panic.as_ref()),
                );
                self.fail(error, input, config, ctx);
            }
        }
    }

    /// A dependency delivered an error: skip the processor and pass the
    /// original error on.
    fn skip(&mut self, sender: &str, error: NodeError, ctx: &ActorContext) {
        self.activated = true;
        NodeFailed {
            node: &self.name,
            error: &error,
        }
        .log();

        self.outbox.fail(error.clone());
        let reason = NodeError::new(
            &self.name,
            NodeErrorKind::Upstream,
            format!("dependency '{}' failed: {}", sender, error.message),
        );
        let record = BookKeepingRecord::failure(&self.name, self.input.clone(), self.config.clone(), reason);
        self.report(record);
        ctx.set_state(NodeState::Errored);
    }

    fn fail(&self, error: NodeError, input: Value, config: Value, ctx: &ActorContext) {
        NodeFailed {
            node: &self.name,
            error: &error,
        }
        .log();

        self.outbox.fail(error.clone());
        self.report(BookKeepingRecord::failure(&self.name, input, config, error));
        ctx.set_state(NodeState::Errored);
    }

    fn report(&self, record: BookKeepingRecord) {
        if let Some(bookkeeping) = &self.bookkeeping {
            let message = Message::Bookkeeping {
                sender: self.template_key.clone(),
                record,
            };
            if let Err(e) = bookkeeping.send(message) {
                tracing::debug!(node = self.name.as_str(), error = %e, "bookkeeping record dropped");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("processor panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("processor panicked: {}", message)
    } else {
        "processor panicked".to_string()
    }
}

#[async_trait]
impl Actor for ProcessorNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> NodeRole {
        NodeRole::Processor
    }

    async fn handle(&mut self, message: Message, ctx: &ActorContext) {
        match message {
            Message::Control(ControlMessage::Start) => {
                if self.dependencies.is_empty() && !self.activated {
                    self.activate(ctx).await;
                }
            }
            Message::ProcessorOutput {
                sender,
                payload: Payload::Complete(value),
            } => {
                if !self.accept(&sender) {
                    return;
                }
                self.received.insert(sender, value);
                if self.all_delivered() {
                    self.activate(ctx).await;
                }
            }
            // Processor nodes only consume complete values.
            Message::ProcessorOutput {
                payload: Payload::Chunk(_),
                ..
            } => {}
            Message::Error { sender, error } => {
                if self.accept(&sender) {
                    self.skip(&sender, error, ctx);
                }
            }
            other => ignore(&self.name, &other),
        }
    }
}
