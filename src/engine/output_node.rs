// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Terminal aggregator of a run.
//!
//! With a template, every partial chunk re-renders the template against the
//! stitched upstream values. Only the prefix shared by two consecutive
//! renders is streamed: text after the streaming variable (a closing
//! literal, a later dependency) is held back until the final render. Partial
//! renders only happen once every other dependency has delivered. With no
//! template, upstream chunks pass through untouched and the final value is
//! the upstream value itself.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::NodeRole;
use crate::engine::actor::{ignore, Actor, ActorContext, NodeState};
use crate::engine::message::{
    ControlMessage, Mailbox, Message, NodeError, NodeErrorKind, Payload,
};
use crate::engine::output_state::OutputState;
use crate::engine::records::{BookKeepingRecord, RunSummary};
use crate::observability::messages::node::{DuplicateDelivery, NodeActivated};
use crate::observability::messages::output::{OutputFailed, OutputRendered, PartialRenderSkipped};
use crate::observability::messages::StructuredLog;
use crate::template::{TemplateContext, TemplateRenderer};
use crate::utils::stitch_chunk;

pub struct OutputNode {
    name: String,
    template_key: String,
    template: Option<String>,
    dependencies: BTreeSet<String>,
    renderer: Arc<dyn TemplateRenderer>,
    state: watch::Sender<OutputState>,
    bookkeeping: Option<Mailbox>,
    wait_for_bookkeeping: bool,
    received: TemplateContext,
    partial: BTreeMap<String, Value>,
    streamed_text: String,
    last_render: Option<String>,
    bookkeeping_complete: bool,
    pending: Option<Value>,
    finalized: bool,
}

impl OutputNode {
    pub fn new(
        name: impl Into<String>,
        template_key: impl Into<String>,
        template: Option<String>,
        dependencies: BTreeSet<String>,
        renderer: Arc<dyn TemplateRenderer>,
        state: watch::Sender<OutputState>,
    ) -> Self {
        Self {
            name: name.into(),
            template_key: template_key.into(),
            template,
            dependencies,
            renderer,
            state,
            bookkeeping: None,
            wait_for_bookkeeping: false,
            received: BTreeMap::new(),
            partial: BTreeMap::new(),
            streamed_text: String::new(),
            last_render: None,
            bookkeeping_complete: false,
            pending: None,
            finalized: false,
        }
    }

    /// Report the run summary to the bookkeeping node, and optionally hold
    /// `done` until it has collected every record.
    pub fn with_bookkeeping(mut self, bookkeeping: Mailbox, wait: bool) -> Self {
        self.bookkeeping = Some(bookkeeping);
        self.wait_for_bookkeeping = wait;
        self
    }

    fn push_chunk(&self, chunk: Value) {
        self.state.send_modify(|s| s.chunks.push(chunk));
    }

    fn chunk_count(&self) -> usize {
        self.state.borrow().chunks.len()
    }

    fn on_chunk(&mut self, sender: String, chunk: Value, ctx: &ActorContext) {
        if ctx.state() == NodeState::Waiting {
            ctx.set_state(NodeState::Activating);
            NodeActivated {
                node: &self.name,
                role: NodeRole::Output.as_str(),
                dependency_count: self.dependencies.len(),
            }
            .log();
        }

        if self.template.is_none() {
            self.push_chunk(chunk);
            return;
        }

        let stitched = stitch_chunk(self.partial.remove(&sender), chunk);
        self.partial.insert(sender, stitched);
        self.advance_stream();
    }

    /// Stream the part of the template that can no longer change.
    fn advance_stream(&mut self) {
        let Some(template) = self.template.clone() else {
            return;
        };
        let mut outstanding = self
            .dependencies
            .iter()
            .filter(|d| !self.received.contains_key(*d));
        let (Some(streaming), None) = (outstanding.next(), outstanding.next()) else {
            return;
        };
        let Some(partial) = self.partial.get(streaming).cloned() else {
            return;
        };
        let streaming = streaming.clone();

        if self.last_render.is_none() {
            // Render without the streaming value to anchor the first comparison.
            self.last_render = self.renderer.render(&template, &self.received).ok();
        }

        let mut context = self.received.clone();
        context.insert(streaming.clone(), partial);
        let text = match self.renderer.render(&template, &context) {
            Ok(text) => text,
            Err(e) => {
                let reason = e.to_string();
                PartialRenderSkipped {
                    node: &self.name,
                    sender: &streaming,
                    reason: &reason,
                }
                .log();
                return;
            }
        };

        let stable = self
            .last_render
            .as_deref()
            .map(|previous| common_prefix_len(previous, &text))
            .unwrap_or(0);
        if stable > self.streamed_text.len() && text[..stable].starts_with(&self.streamed_text) {
            let delta = text[self.streamed_text.len()..stable].to_string();
            self.streamed_text = text[..stable].to_string();
            self.push_chunk(Value::String(delta));
        } else if !text.starts_with(&self.streamed_text) {
            PartialRenderSkipped {
                node: &self.name,
                sender: &streaming,
                reason: "rendered text does not extend the streamed text",
            }
            .log();
        }
        self.last_render = Some(text);
    }

    fn final_value(&self) -> Result<Value, NodeError> {
        match &self.template {
            Some(template) => self
                .renderer
                .render(template, &self.received)
                .map(Value::String)
                .map_err(|e| NodeError::new(&self.name, NodeErrorKind::Render, e.to_string())),
            None => Ok(match self.received.len() {
                0 => Value::Null,
                1 => self.received.values().next().cloned().unwrap_or(Value::Null),
                _ => Value::Object(
                    self.received
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect::<Map<_, _>>(),
                ),
            }),
        }
    }

    fn finalize(&mut self, ctx: &ActorContext) {
        self.finalized = true;
        let value = match self.final_value() {
            Ok(value) => value,
            Err(error) => return self.finalize_error(error, ctx),
        };

        // Stream whatever the consumer has not seen yet.
        match &value {
            Value::String(text) if self.template.is_some() => {
                match text.strip_prefix(self.streamed_text.as_str()) {
                    Some(rest) if !rest.is_empty() => self.push_chunk(Value::String(rest.to_string())),
                    Some(_) => {}
                    None if self.streamed_text.is_empty() => self.push_chunk(value.clone()),
                    None => PartialRenderSkipped {
                        node: &self.name,
                        sender: &self.template_key,
                        reason: "final render diverged from the streamed text",
                    }
                    .log(),
                }
            }
            _ => {
                if self.chunk_count() == 0 {
                    self.push_chunk(value.clone());
                }
            }
        }

        let summary = RunSummary::rendered(&value);
        self.report(BookKeepingRecord::success(
            &self.name,
            self.context_value(),
            json!({ "template": self.template }),
            summary_value(&summary),
        ));

        let awaiting = self.wait_for_bookkeeping && !self.bookkeeping_complete;
        OutputRendered {
            node: &self.name,
            chunk_count: self.chunk_count(),
            awaiting_bookkeeping: awaiting,
        }
        .log();

        if awaiting {
            self.pending = Some(value);
        } else {
            self.publish(value, ctx);
        }
    }

    fn finalize_error(&mut self, error: NodeError, ctx: &ActorContext) {
        self.finalized = true;
        OutputFailed {
            node: &self.name,
            error: &error,
        }
        .log();

        let mut record = BookKeepingRecord::failure(
            &self.name,
            self.context_value(),
            json!({ "template": self.template }),
            error.clone(),
        );
        record.output = Some(summary_value(&RunSummary::failed(&error)));
        self.report(record);

        self.state.send_modify(|s| {
            s.error = Some(error);
            s.done = true;
        });
        ctx.set_state(NodeState::Errored);
    }

    fn publish(&mut self, value: Value, ctx: &ActorContext) {
        self.state.send_modify(|s| {
            s.rendered_value = Some(value);
            s.done = true;
        });
        ctx.set_state(NodeState::Done);
    }

    fn context_value(&self) -> Value {
        Value::Object(
            self.received
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    fn report(&self, record: BookKeepingRecord) {
        if let Some(bookkeeping) = &self.bookkeeping {
            let message = Message::Bookkeeping {
                sender: self.template_key.clone(),
                record,
            };
            if let Err(e) = bookkeeping.send(message) {
                tracing::debug!(node = self.name.as_str(), error = %e, "run summary dropped");
            }
        }
    }
}

/// Byte length of the longest common prefix, on a char boundary
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, left), right)| left != right)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()))
}

fn summary_value(summary: &RunSummary) -> Value {
    serde_json::to_value(summary).unwrap_or(Value::Null)
}

#[async_trait]
impl Actor for OutputNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> NodeRole {
        NodeRole::Output
    }

    async fn handle(&mut self, message: Message, ctx: &ActorContext) {
        match message {
            Message::Control(ControlMessage::BookkeepingComplete) => {
                self.bookkeeping_complete = true;
                if let Some(value) = self.pending.take() {
                    self.publish(value, ctx);
                }
            }
            Message::Control(ControlMessage::Start) => {
                if self.dependencies.is_empty() && !self.finalized {
                    self.finalize(ctx);
                }
            }
            _ if self.finalized => {
                if let Some(sender) = message.sender() {
                    DuplicateDelivery {
                        node: &self.name,
                        sender,
                    }
                    .log();
                }
            }
            Message::ProcessorOutput { sender, payload } if self.dependencies.contains(&sender) => {
                if self.received.contains_key(&sender) {
                    DuplicateDelivery {
                        node: &self.name,
                        sender: &sender,
                    }
                    .log();
                    return;
                }
                match payload {
                    Payload::Chunk(chunk) => self.on_chunk(sender, chunk, ctx),
                    Payload::Complete(value) => {
                        self.partial.remove(&sender);
                        self.received.insert(sender, value);
                        if self.dependencies.iter().all(|d| self.received.contains_key(d)) {
                            self.finalize(ctx);
                        } else {
                            self.advance_stream();
                        }
                    }
                }
            }
            Message::Error { sender, error } if self.dependencies.contains(&sender) => {
                self.finalize_error(error, ctx);
            }
            other => ignore(&self.name, &other),
        }
    }

    async fn on_stop(&mut self, _ctx: &ActorContext) {
        self.state.send_if_modified(|s| {
            if s.done {
                false
            } else {
                s.stopped = true;
                true
            }
        });
    }
}
