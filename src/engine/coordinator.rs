// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Builds, wires and launches the node graph of one run.
//!
//! # Example
//!
//! ```rust
//! use the_switchboard::config::NodeConfig;
//! use the_switchboard::engine::{Coordinator, OutputResult};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let coordinator = Coordinator::builder().build();
//! let graph = coordinator
//!     .start(
//!         "session-1",
//!         vec![
//!             NodeConfig::input(),
//!             NodeConfig::processor("shout", "change_text_case")
//!                 .with_input(json!({"text": "{{ _inputs0.text }}"}))
//!                 .with_config(json!({"case_type": "upper"})),
//!             NodeConfig::output(Some("{{ shout.text }}")),
//!         ],
//!     )
//!     .await
//!     .unwrap();
//!
//! let result = graph.run(json!({"text": "hi"})).await.unwrap();
//! assert_eq!(result, OutputResult::Completed(json!("HI")));
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::consts::DEFAULT_RUN_TIMEOUT_SECS;
use crate::config::{validate_node_configs, NodeConfig, NodeRole, ProcessorMap, ProcessorRegistry};
use crate::engine::actor::{run_actor, ActorContext, NodeState};
use crate::engine::bookkeeping_node::BookKeepingNode;
use crate::engine::graph::{GraphHandle, GraphParts, NodeHandle};
use crate::engine::input_node::InputNode;
use crate::engine::message::{Mailbox, Message, Outbox};
use crate::engine::output_node::OutputNode;
use crate::engine::output_state::{OutputHandle, OutputState};
use crate::engine::processor_node::{ProcessorNode, ProcessorNodeParts};
use crate::errors::CoordinatorError;
use crate::observability::messages::engine::{GraphStartFailed, GraphStarted};
use crate::observability::messages::StructuredLog;
use crate::stores::{DiscardHistorySink, InMemorySessionStore};
use crate::template::{MiniJinjaRenderer, TemplateRenderer};
use crate::traits::{HistorySink, SessionStore};

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Limit applied by [`GraphHandle::run`]
    pub run_timeout: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
        }
    }
}

/// Owner of the collaborators shared by every run.
#[derive(Clone)]
pub struct Coordinator {
    registry: Arc<ProcessorRegistry>,
    renderer: Arc<dyn TemplateRenderer>,
    session_store: Arc<dyn SessionStore>,
    history: Arc<dyn HistorySink>,
    options: CoordinatorOptions,
}

#[derive(Default)]
pub struct CoordinatorBuilder {
    registry: Option<ProcessorRegistry>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    session_store: Option<Arc<dyn SessionStore>>,
    history: Option<Arc<dyn HistorySink>>,
    options: CoordinatorOptions,
}

impl CoordinatorBuilder {
    pub fn registry(mut self, registry: ProcessorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn history_sink(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn options(mut self, options: CoordinatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.options.run_timeout = timeout;
        self
    }

    /// Build the coordinator. Without an explicit history sink, run history
    /// is logged and dropped.
    pub fn build(self) -> Coordinator {
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(DiscardHistorySink));

        Coordinator {
            registry: Arc::new(
                self.registry
                    .unwrap_or_else(ProcessorRegistry::with_local_processors),
            ),
            renderer: self
                .renderer
                .unwrap_or_else(|| Arc::new(MiniJinjaRenderer::new())),
            session_store: self
                .session_store
                .unwrap_or_else(|| Arc::new(InMemorySessionStore::new())),
            history,
            options: self.options,
        }
    }
}

/// Channel ends created for each node before any task is spawned.
struct Wiring {
    mailboxes: HashMap<String, Mailbox>,
    receivers: HashMap<String, mpsc::UnboundedReceiver<Message>>,
}

impl Wiring {
    fn new(nodes: &[NodeConfig]) -> Self {
        let mut mailboxes = HashMap::new();
        let mut receivers = HashMap::new();
        for node in nodes {
            let (tx, rx) = mpsc::unbounded_channel();
            mailboxes.insert(node.name.clone(), Mailbox::new(&node.name, tx));
            receivers.insert(node.name.clone(), rx);
        }
        Self {
            mailboxes,
            receivers,
        }
    }

    fn mailbox(&self, name: &str) -> Option<Mailbox> {
        self.mailboxes.get(name).cloned()
    }

    fn mailbox_for_role(&self, nodes: &[NodeConfig], role: NodeRole) -> Option<Mailbox> {
        nodes
            .iter()
            .find(|n| n.role == role)
            .and_then(|n| self.mailbox(&n.name))
    }
}

impl Coordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::default()
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Validate `nodes`, then build and launch the graph for one run.
    ///
    /// Every check happens before the first node task is spawned, so a
    /// failed start has no side effects.
    pub async fn start(
        &self,
        session_id: &str,
        nodes: Vec<NodeConfig>,
    ) -> Result<GraphHandle, CoordinatorError> {
        match self.build_graph(session_id, nodes).await {
            Ok(graph) => Ok(graph),
            Err(e) => {
                GraphStartFailed {
                    session_id,
                    error: &e,
                }
                .log();
                Err(e)
            }
        }
    }

    async fn build_graph(
        &self,
        session_id: &str,
        nodes: Vec<NodeConfig>,
    ) -> Result<GraphHandle, CoordinatorError> {
        let resolved =
            validate_node_configs(&nodes, &self.registry).map_err(CoordinatorError::Validation)?;
        let mut processors = ProcessorMap::from_nodes(&nodes, &self.registry)?;

        let mut session_states = HashMap::new();
        for node in nodes.iter().filter(|n| n.role == NodeRole::Processor) {
            let state = self
                .session_store
                .get_session_state(session_id, &node.name)
                .await
                .map_err(|source| CoordinatorError::SessionState {
                    node: node.name.clone(),
                    source,
                })?;
            session_states.insert(node.name.clone(), state);
        }

        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let mut wiring = Wiring::new(&nodes);
        let bookkeeping = wiring.mailbox_for_role(&nodes, NodeRole::BookKeeping);
        let output_mailbox = wiring.mailbox_for_role(&nodes, NodeRole::Output);

        let mut handles = BTreeMap::new();
        let mut launches: Vec<Box<dyn FnOnce() -> tokio::task::JoinHandle<()> + Send>> = Vec::new();
        let mut input = None;
        let mut output = None;

        for node in &nodes {
            let dependencies = resolved.dependencies_of(&node.name);
            let targets: Vec<Mailbox> = resolved
                .dependents
                .get_dependents(&node.name)
                .iter()
                .filter_map(|name| wiring.mailbox(name))
                .collect();
            let outbox = Outbox::new(&node.template_key, targets);

            let (state_tx, state_rx) = watch::channel(NodeState::Created);
            let ctx = ActorContext::new(state_tx, cancel.child_token());
            let (Some(mailbox), Some(rx)) = (
                wiring.mailbox(&node.name),
                wiring.receivers.remove(&node.name),
            ) else {
                continue;
            };

            handles.insert(
                node.name.clone(),
                NodeHandle::new(
                    node.name.clone(),
                    node.template_key.clone(),
                    node.role,
                    dependencies.clone(),
                    mailbox,
                    state_rx,
                ),
            );

            match node.role {
                NodeRole::Input => {
                    input = Some(node.name.clone());
                    let actor = InputNode::new(&node.name, outbox);
                    launches.push(Box::new(move || tokio::spawn(run_actor(actor, rx, ctx))));
                }
                NodeRole::Processor => {
                    let Some(processor) = processors.take(&node.name) else {
                        continue;
                    };
                    let parts = ProcessorNodeParts {
                        name: node.name.clone(),
                        template_key: node.template_key.clone(),
                        dependencies,
                        input: node.input.clone(),
                        config: node.config.clone(),
                        session_id: session_id.to_string(),
                        session_state: session_states.remove(&node.name).flatten(),
                        outbox,
                        bookkeeping: bookkeeping.clone(),
                    };
                    let actor = ProcessorNode::new(parts, processor, self.renderer.clone());
                    launches.push(Box::new(move || tokio::spawn(run_actor(actor, rx, ctx))));
                }
                NodeRole::Output => {
                    let (output_tx, output_rx) = watch::channel(OutputState::default());
                    output = Some(OutputHandle::new(output_rx));
                    let mut actor = OutputNode::new(
                        &node.name,
                        &node.template_key,
                        node.template.clone(),
                        dependencies,
                        self.renderer.clone(),
                        output_tx,
                    );
                    if let Some(bookkeeping) = &bookkeeping {
                        actor = actor.with_bookkeeping(bookkeeping.clone(), node.wait_for_bookkeeping);
                    }
                    launches.push(Box::new(move || tokio::spawn(run_actor(actor, rx, ctx))));
                }
                NodeRole::BookKeeping => {
                    let mut actor = BookKeepingNode::new(
                        &node.name,
                        run_id,
                        session_id,
                        dependencies,
                        self.session_store.clone(),
                        self.history.clone(),
                    );
                    if let Some(output) = &output_mailbox {
                        actor = actor.with_output(output.clone());
                    }
                    launches.push(Box::new(move || tokio::spawn(run_actor(actor, rx, ctx))));
                }
            }
        }

        let tasks = launches.into_iter().map(|launch| launch()).collect();

        let run_id_text = run_id.to_string();
        GraphStarted {
            session_id,
            run_id: &run_id_text,
            node_count: handles.len(),
            entry_point_count: resolved.entry_points.len(),
        }
        .log();

        Ok(GraphHandle::new(GraphParts {
            session_id: session_id.to_string(),
            run_id,
            nodes: handles,
            input,
            entry_points: resolved.entry_points,
            output,
            run_timeout: self.options.run_timeout,
            cancel,
            tasks,
        }))
    }
}
