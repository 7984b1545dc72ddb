// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::config::{validate_node_configs, NodeConfig, PipelineConfig, ProcessorRegistry};
use crate::engine::{Coordinator, CoordinatorOptions};
use crate::errors::ConfigError;
use crate::observability::messages::bookkeeping::HistoryFlushSkipped;
use crate::observability::messages::StructuredLog;
use crate::stores::{JsonLinesHistoryWriter, QueuedHistorySink};

/// Everything needed to execute a loaded pipeline.
pub struct PipelineRuntime {
    pub coordinator: Coordinator,
    /// Node configurations to pass to [`Coordinator::start`] for each run
    pub nodes: Vec<NodeConfig>,
    history: Option<Arc<QueuedHistorySink>>,
}

impl PipelineRuntime {
    /// Drop the coordinator and wait for queued history jobs to be written.
    ///
    /// Graph handles started from this runtime must be dropped first,
    /// otherwise the queue stays open and pending jobs are not awaited.
    pub async fn shutdown(self) {
        let PipelineRuntime {
            coordinator,
            history,
            ..
        } = self;
        drop(coordinator);
        let Some(history) = history else {
            return;
        };
        match Arc::try_unwrap(history) {
            Ok(sink) => sink.shutdown().await,
            Err(shared) => HistoryFlushSkipped {
                references: Arc::strong_count(&shared) - 1,
            }
            .log(),
        }
    }
}

/// Pipeline runtime builder - turns a [`PipelineConfig`] into a ready
/// coordinator.
///
/// # Examples
///
/// ```
/// use the_switchboard::config::{PipelineConfig, ProcessorRegistry, RuntimeBuilder};
///
/// # #[tokio::main]
/// # async fn main() {
/// let cfg: PipelineConfig = serde_yaml::from_str(
///     r#"
/// processors:
///   - name: shout
///     processor: change_text_case
///     input: "{{ _inputs0.text }}"
///     config:
///       case_type: upper
/// output:
///   template: "{{ shout.text }}"
/// "#,
/// )
/// .unwrap();
///
/// let runtime = RuntimeBuilder::from_config(&cfg, ProcessorRegistry::with_local_processors()).unwrap();
/// assert_eq!(runtime.nodes.len(), 4);
/// # }
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Validate the pipeline and build its coordinator.
    ///
    /// History goes to a JSON lines file when `run.history_path` is set and
    /// is dropped otherwise. With a history file this spawns the history
    /// worker, so it must be called inside a tokio runtime.
    pub fn from_config(
        cfg: &PipelineConfig,
        registry: ProcessorRegistry,
    ) -> Result<PipelineRuntime, ConfigError> {
        let nodes = cfg.node_configs();
        validate_node_configs(&nodes, &registry).map_err(ConfigError::Invalid)?;

        let history = cfg.run.history_path.as_ref().map(|path| {
            Arc::new(QueuedHistorySink::spawn(
                Arc::new(JsonLinesHistoryWriter::new(path)),
                cfg.run.history_queue_capacity(),
            ))
        });

        let mut builder = Coordinator::builder()
            .registry(registry)
            .options(CoordinatorOptions {
                run_timeout: cfg.run.timeout(),
            });
        if let Some(history) = &history {
            builder = builder.history_sink(history.clone());
        }
        let coordinator = builder.build();

        Ok(PipelineRuntime {
            coordinator,
            nodes,
            history,
        })
    }
}
