// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observable state of the output node and the consumer API over it.
//!
//! The output node is the only writer. Consumers hold an [`OutputHandle`],
//! a watch receiver, and block on change notifications instead of polling.

use futures::Stream;
use serde_json::Value;
use tokio::sync::watch;

use crate::engine::message::NodeError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputState {
    pub rendered_value: Option<Value>,
    pub error: Option<NodeError>,
    /// Streamed chunks in arrival order; only ever appended to
    pub chunks: Vec<Value>,
    pub done: bool,
    pub stopped: bool,
}

impl OutputState {
    pub fn is_finished(&self) -> bool {
        self.done || self.stopped
    }

    /// Terminal result, if the output has finished
    pub fn result(&self) -> Option<OutputResult> {
        if let Some(error) = &self.error {
            Some(OutputResult::Failed(error.clone()))
        } else if self.done {
            Some(OutputResult::Completed(
                self.rendered_value.clone().unwrap_or(Value::Null),
            ))
        } else if self.stopped {
            Some(OutputResult::Stopped)
        } else {
            None
        }
    }
}

/// Final outcome of a run as seen by a consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputResult {
    Completed(Value),
    Failed(NodeError),
    /// The run was stopped (cancelled or timed out) before finishing
    Stopped,
}

impl OutputResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, OutputResult::Completed(_))
    }

    /// Value for the transport layer: the rendered value, or the error
    /// payload.
    pub fn into_payload(self) -> Value {
        match self {
            OutputResult::Completed(value) => value,
            OutputResult::Failed(error) => error.to_payload(),
            OutputResult::Stopped => serde_json::json!({
                "errors": [{"kind": "stopped", "message": "run was stopped before it finished"}]
            }),
        }
    }
}

/// One item of the output stream.
///
/// The stream yields every chunk once, in order, and then exactly one of
/// the terminal events.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Chunk(Value),
    Completed(Value),
    Failed(NodeError),
    Stopped,
}

impl OutputEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OutputEvent::Chunk(_))
    }
}

impl From<OutputResult> for OutputEvent {
    fn from(result: OutputResult) -> Self {
        match result {
            OutputResult::Completed(value) => OutputEvent::Completed(value),
            OutputResult::Failed(error) => OutputEvent::Failed(error),
            OutputResult::Stopped => OutputEvent::Stopped,
        }
    }
}

/// Read side of the output node.
#[derive(Debug, Clone)]
pub struct OutputHandle {
    rx: watch::Receiver<OutputState>,
}

impl OutputHandle {
    pub fn new(rx: watch::Receiver<OutputState>) -> Self {
        Self { rx }
    }

    pub fn snapshot(&self) -> OutputState {
        self.rx.borrow().clone()
    }

    /// Wait for the final result.
    ///
    /// If the output node goes away without finishing, the run counts as
    /// stopped.
    pub async fn get_output(&self) -> OutputResult {
        let mut rx = self.rx.clone();
        loop {
            if let Some(result) = rx.borrow_and_update().result() {
                return result;
            }
            if rx.changed().await.is_err() {
                return rx.borrow().result().unwrap_or(OutputResult::Stopped);
            }
        }
    }

    /// Stream chunks as they arrive, followed by one terminal event.
    pub fn get_output_stream(&self) -> impl Stream<Item = OutputEvent> + Send + 'static {
        let mut rx = self.rx.clone();
        async_stream::stream! {
            let mut next = 0;
            loop {
                let (fresh, result) = {
                    let state = rx.borrow_and_update();
                    let fresh = state.chunks.get(next..).map(<[Value]>::to_vec).unwrap_or_default();
                    (fresh, state.result())
                };
                next += fresh.len();
                for chunk in fresh {
                    yield OutputEvent::Chunk(chunk);
                }
                if let Some(result) = result {
                    yield result.into();
                    break;
                }
                if rx.changed().await.is_err() {
                    let (fresh, result) = {
                        let state = rx.borrow();
                        let fresh = state.chunks.get(next..).map(<[Value]>::to_vec).unwrap_or_default();
                        (fresh, state.result())
                    };
                    for chunk in fresh {
                        yield OutputEvent::Chunk(chunk);
                    }
                    yield result.unwrap_or(OutputResult::Stopped).into();
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::message::NodeErrorKind;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_stream_yields_each_chunk_once_then_terminal() {
        let (tx, rx) = watch::channel(OutputState::default());
        let handle = OutputHandle::new(rx);
        let stream = handle.get_output_stream();

        let producer = tokio::spawn(async move {
            for chunk in ["a", "b", "c"] {
                tx.send_modify(|s| s.chunks.push(json!(chunk)));
                tokio::task::yield_now().await;
            }
            tx.send_modify(|s| {
                s.rendered_value = Some(json!("abc"));
                s.done = true;
            });
        });

        let events: Vec<_> = stream.collect().await;
        producer.await.unwrap();

        assert_eq!(
            events,
            vec![
                OutputEvent::Chunk(json!("a")),
                OutputEvent::Chunk(json!("b")),
                OutputEvent::Chunk(json!("c")),
                OutputEvent::Completed(json!("abc")),
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_writer_counts_as_stopped() {
        let (tx, rx) = watch::channel(OutputState::default());
        let handle = OutputHandle::new(rx);
        tx.send_modify(|s| s.chunks.push(json!("partial")));
        drop(tx);

        assert_eq!(handle.get_output().await, OutputResult::Stopped);
        let events: Vec<_> = handle.get_output_stream().collect().await;
        assert_eq!(
            events,
            vec![OutputEvent::Chunk(json!("partial")), OutputEvent::Stopped]
        );
    }

    #[test]
    fn test_error_wins_over_done() {
        let state = OutputState {
            error: Some(NodeError::new("p", NodeErrorKind::Render, "bad")),
            done: true,
            ..Default::default()
        };
        assert!(matches!(state.result(), Some(OutputResult::Failed(_))));
        assert!(OutputResult::Failed(NodeError::new("p", NodeErrorKind::Render, "bad"))
            .into_payload()["errors"][0]["message"]
            .as_str()
            .unwrap()
            .contains("bad"));
    }
}
