// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Side-effect sink of a run.
//!
//! Collects one record per processor node and one run summary from the
//! output node. Session state reported in a record is persisted as soon as
//! the record arrives; the collected records are handed to the history sink
//! when the graph stops, complete or not.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::NodeRole;
use crate::engine::actor::{ignore, Actor, ActorContext, NodeState};
use crate::engine::message::{ControlMessage, Mailbox, Message};
use crate::engine::records::{BookKeepingRecord, HistoryJob, RunRecord};
use crate::observability::messages::bookkeeping::{
    BookkeepingCompleted, HistoryEnqueueFailed, HistoryEnqueued, RecordCollected,
    SessionStatePersistFailed, SessionStatePersisted,
};
use crate::observability::messages::node::DuplicateDelivery;
use crate::observability::messages::StructuredLog;
use crate::traits::{HistorySink, SessionStore};

pub struct BookKeepingNode {
    name: String,
    run_id: Uuid,
    session_id: String,
    expected: BTreeSet<String>,
    senders: BTreeSet<String>,
    run: RunRecord,
    session_store: Arc<dyn SessionStore>,
    history: Arc<dyn HistorySink>,
    output: Option<Mailbox>,
}

impl BookKeepingNode {
    pub fn new(
        name: impl Into<String>,
        run_id: Uuid,
        session_id: impl Into<String>,
        expected: BTreeSet<String>,
        session_store: Arc<dyn SessionStore>,
        history: Arc<dyn HistorySink>,
    ) -> Self {
        let run = RunRecord::new(expected.len());
        Self {
            name: name.into(),
            run_id,
            session_id: session_id.into(),
            expected,
            senders: BTreeSet::new(),
            run,
            session_store,
            history,
            output: None,
        }
    }

    /// Notify the output node once every record arrived
    pub fn with_output(mut self, output: Mailbox) -> Self {
        self.output = Some(output);
        self
    }

    fn is_complete(&self) -> bool {
        self.senders.len() == self.expected.len()
    }

    async fn collect(&mut self, sender: String, record: BookKeepingRecord, ctx: &ActorContext) {
        if self.senders.contains(&sender) {
            DuplicateDelivery {
                node: &self.name,
                sender: &sender,
            }
            .log();
            return;
        }

        if let Some(state) = &record.session_data {
            self.persist(&record.node, state.clone()).await;
        }

        RecordCollected {
            sender: &sender,
            collected: self.senders.len() + 1,
            expected: self.expected.len(),
            is_error: record.is_error(),
        }
        .log();

        self.senders.insert(sender);
        self.run.insert(record);

        if self.is_complete() {
            let run_id = self.run_id.to_string();
            BookkeepingCompleted {
                run_id: &run_id,
                record_count: self.run.len(),
                error_count: self.run.error_count(),
            }
            .log();

            if let Some(output) = &self.output {
                if let Err(e) = output.send(Message::Control(ControlMessage::BookkeepingComplete)) {
                    tracing::debug!(node = self.name.as_str(), error = %e, "output node gone");
                }
            }
            ctx.set_state(NodeState::Done);
        }
    }

    async fn persist(&self, node_key: &str, state: serde_json::Value) {
        match self
            .session_store
            .put_session_state(&self.session_id, node_key, state)
            .await
        {
            Ok(()) => SessionStatePersisted {
                session_id: &self.session_id,
                node_key,
            }
            .log(),
            Err(e) => SessionStatePersistFailed {
                session_id: &self.session_id,
                node_key,
                error: &e,
            }
            .log(),
        }
    }
}

#[async_trait]
impl Actor for BookKeepingNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> NodeRole {
        NodeRole::BookKeeping
    }

    async fn handle(&mut self, message: Message, ctx: &ActorContext) {
        match message {
            Message::Bookkeeping { sender, record } if self.expected.contains(&sender) => {
                self.collect(sender, record, ctx).await;
            }
            other => ignore(&self.name, &other),
        }
    }

    async fn on_stop(&mut self, _ctx: &ActorContext) {
        let run_id = self.run_id.to_string();
        let job = HistoryJob {
            run_id: self.run_id,
            session_id: self.session_id.clone(),
            records: self.run.clone(),
            complete: self.is_complete(),
            finished_at: Utc::now(),
        };
        let record_count = job.records.len();
        let complete = job.complete;

        match self.history.enqueue(job) {
            Ok(()) => HistoryEnqueued {
                run_id: &run_id,
                record_count,
                complete,
            }
            .log(),
            Err(e) => HistoryEnqueueFailed {
                run_id: &run_id,
                error: &e,
            }
            .log(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::message::{NodeError, NodeErrorKind};
    use crate::errors::EnqueueError;
    use crate::stores::InMemorySessionStore;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::{mpsc, watch};
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<HistoryJob>>);

    impl HistorySink for CollectingSink {
        fn enqueue(&self, job: HistoryJob) -> Result<(), EnqueueError> {
            self.0.lock().unwrap().push(job);
            Ok(())
        }
    }

    struct ClosedSink;

    impl HistorySink for ClosedSink {
        fn enqueue(&self, _job: HistoryJob) -> Result<(), EnqueueError> {
            Err(EnqueueError::Closed)
        }
    }

    fn ctx() -> (ActorContext, watch::Receiver<NodeState>) {
        let (tx, rx) = watch::channel(NodeState::Waiting);
        (ActorContext::new(tx, CancellationToken::new()), rx)
    }

    fn record_from(sender: &str, record: BookKeepingRecord) -> Message {
        Message::Bookkeeping {
            sender: sender.to_string(),
            record,
        }
    }

    #[tokio::test]
    async fn test_collects_persists_and_signals_output() {
        let store = Arc::new(InMemorySessionStore::new());
        let sink = Arc::new(CollectingSink::default());
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let expected: BTreeSet<String> = ["a", "_output"].iter().map(|s| s.to_string()).collect();

        let mut node = BookKeepingNode::new("bookkeeping", Uuid::new_v4(), "s1", expected, store.clone(), sink.clone())
            .with_output(Mailbox::new("output", out_tx));
        let (ctx, state) = ctx();

        let stateful = BookKeepingRecord::success("A", json!({}), json!({}), json!(1))
            .with_session_data(Some(json!({"count": 1})));
        node.handle(record_from("a", stateful.clone()), &ctx).await;
        node.handle(record_from("a", stateful), &ctx).await;
        node.handle(record_from("stranger", BookKeepingRecord::success("x", json!({}), json!({}), json!(0))), &ctx)
            .await;
        assert!(out_rx.try_recv().is_err());

        assert_eq!(
            store.get_session_state("s1", "A").await.unwrap(),
            Some(json!({"count": 1}))
        );

        node.handle(
            record_from("_output", BookKeepingRecord::success("output", json!({}), json!({}), json!("ok"))),
            &ctx,
        )
        .await;
        assert!(matches!(
            out_rx.try_recv().unwrap(),
            Message::Control(ControlMessage::BookkeepingComplete)
        ));
        assert_eq!(*state.borrow(), NodeState::Done);

        node.on_stop(&ctx).await;
        let jobs = sink.0.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].complete);
        assert_eq!(jobs[0].records.len(), 2);
        assert!(jobs[0].records.get("A").is_some());
    }

    #[tokio::test]
    async fn test_partial_run_still_enqueues_history() {
        let sink = Arc::new(CollectingSink::default());
        let expected: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let mut node = BookKeepingNode::new(
            "bookkeeping",
            Uuid::new_v4(),
            "s1",
            expected,
            Arc::new(InMemorySessionStore::new()),
            sink.clone(),
        );
        let (ctx, _state) = ctx();

        let error = NodeError::new("A", NodeErrorKind::Processor, "boom");
        node.handle(record_from("a", BookKeepingRecord::failure("A", json!({}), json!({}), error)), &ctx)
            .await;
        node.on_stop(&ctx).await;

        let jobs = sink.0.lock().unwrap();
        assert!(!jobs[0].complete);
        assert_eq!(jobs[0].records.error_count(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_failure_does_not_panic() {
        let mut node = BookKeepingNode::new(
            "bookkeeping",
            Uuid::new_v4(),
            "s1",
            BTreeSet::new(),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(ClosedSink),
        );
        let (ctx, _state) = ctx();
        node.on_stop(&ctx).await;
    }
}
