// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end runs through the coordinator using local and stub processors.

use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::backends::stub::{CountingProcessor, SlowProcessor, StreamingProcessor};
use crate::config::{NodeConfig, ProcessorRegistry};
use crate::engine::{
    Coordinator, ControlMessage, GraphHandle, HistoryJob, Message, NodeErrorKind, NodeState,
    OutputEvent, OutputResult, Payload,
};
use crate::errors::{CoordinatorError, ExecutionError, ValidationError};
use crate::stores::{InMemorySessionStore, MemoryHistoryWriter, QueuedHistorySink};
use crate::traits::SessionStore;

struct Harness {
    coordinator: Coordinator,
    history: Arc<MemoryHistoryWriter>,
    sessions: Arc<InMemorySessionStore>,
}

fn harness(registry: ProcessorRegistry) -> Harness {
    let (sink, history) = QueuedHistorySink::in_memory();
    let sessions = Arc::new(InMemorySessionStore::new());
    let coordinator = Coordinator::builder()
        .registry(registry)
        .session_store(sessions.clone())
        .history_sink(Arc::new(sink))
        .run_timeout(Duration::from_secs(5))
        .build();
    Harness {
        coordinator,
        history,
        sessions,
    }
}

fn local() -> Harness {
    harness(ProcessorRegistry::with_local_processors())
}

fn text_step(name: &str, kind: &str, source: &str) -> NodeConfig {
    NodeConfig::processor(name, kind).with_input(json!({ "text": format!("{{{{ {} }}}}", source) }))
}

async fn wait_for_jobs(history: &MemoryHistoryWriter, count: usize) -> Vec<HistoryJob> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let jobs = history.jobs().await;
            if jobs.len() >= count {
                return jobs;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap()
}

async fn wait_terminal(graph: &GraphHandle, node: &str) -> NodeState {
    let handle = graph.get_node(node).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle.wait_for_terminal())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_linear_chain_renders_output() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        text_step("shout", "change_text_case", "_inputs0.text")
            .with_config(json!({"case_type": "upper"})),
        text_step("flip", "reverse_text", "shout.text"),
        NodeConfig::output(Some("{{ flip.text }}")),
        NodeConfig::bookkeeping(),
    ];

    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    let result = graph.run(json!({"text": "hello world"})).await.unwrap();

    assert_eq!(result, OutputResult::Completed(json!("DLROW OLLEH")));
    assert_eq!(graph.get_node("shout").unwrap().state(), NodeState::Completed);
    assert_eq!(graph.get_node("flip").unwrap().state(), NodeState::Completed);
    assert_eq!(graph.get_node("output").unwrap().state(), NodeState::Done);
}

#[tokio::test]
async fn test_fan_in_activates_join_exactly_once() {
    let join = Arc::new(CountingProcessor::new());
    let mut registry = ProcessorRegistry::with_local_processors();
    registry.register_instance("count", join.clone());
    let h = harness(registry);

    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("root", "echo").with_input(json!("{{ _inputs0.text }}")),
        NodeConfig::processor("up", "change_text_case")
            .with_input(json!("{{ root }}"))
            .with_config(json!({"case_type": "upper"})),
        NodeConfig::processor("down", "change_text_case")
            .with_input(json!("{{ root }}"))
            .with_config(json!({"case_type": "lower"})),
        NodeConfig::processor("join", "count")
            .with_input(json!({"left": "{{ up.text }}", "right": "{{ down.text }}"})),
        NodeConfig::output(Some("{{ join.left }}|{{ join.right }}")),
    ];

    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    assert_eq!(
        graph.get_node("join").unwrap().dependencies().iter().collect::<Vec<_>>(),
        vec!["down", "up"]
    );

    let result = graph.run(json!({"text": "MiXeD"})).await.unwrap();
    assert_eq!(result, OutputResult::Completed(json!("MIXED|mixed")));
    assert_eq!(join.calls(), 1);
}

#[tokio::test]
async fn test_node_order_does_not_change_result() {
    let nodes = vec![
        NodeConfig::input(),
        text_step("shout", "change_text_case", "_inputs0.text")
            .with_config(json!({"case_type": "upper"})),
        text_step("flip", "reverse_text", "shout.text"),
        NodeConfig::processor("stats", "token_counter").with_input(json!("{{ flip.text }}")),
        NodeConfig::output(Some("{{ flip.text }} {{ stats.word_count }}")),
        NodeConfig::bookkeeping(),
    ];
    let mut reversed = nodes.clone();
    reversed.reverse();
    let mut rotated = nodes.clone();
    rotated.rotate_left(3);

    let h = local();
    let mut results = Vec::new();
    for order in [nodes, reversed, rotated] {
        let graph = h.coordinator.start("s1", order).await.unwrap();
        results.push(graph.run(json!({"text": "ab cd"})).await.unwrap());
    }

    for result in results {
        assert_eq!(result, OutputResult::Completed(json!("DC BA 2")));
    }
}

#[tokio::test]
async fn test_untemplated_output_passes_value_through() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("stats", "token_counter").with_input(json!("{{ _inputs0 }}")),
        NodeConfig::output(None).depends_on(["stats"]),
    ];

    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    let result = graph.run(json!("one two\nthree")).await.unwrap();

    assert_eq!(
        result,
        OutputResult::Completed(json!({"char_count": 13, "word_count": 3, "line_count": 2}))
    );
}

#[tokio::test]
async fn test_processor_without_dependencies_starts_on_input() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("fixed", "change_text_case")
            .with_input(json!("static text"))
            .with_config(json!({"case_type": "title"})),
        NodeConfig::output(Some("{{ fixed.text }}")),
    ];

    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    let result = graph.run(json!(null)).await.unwrap();
    assert_eq!(result, OutputResult::Completed(json!("Static Text")));
}

#[tokio::test]
async fn test_failure_skips_dependents_and_keeps_siblings() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        text_step("broken", "fail", "_inputs0.text")
            .with_config(json!({"message": "upstream service unavailable"})),
        text_step("after", "reverse_text", "broken.text"),
        text_step("sibling", "reverse_text", "_inputs0.text"),
        NodeConfig::output(Some("{{ after.text }}")),
        NodeConfig::bookkeeping(),
    ];

    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    graph.write_input(json!({"text": "abc"})).unwrap();
    let output = graph.output().unwrap();

    let result = output.get_output().await;
    let OutputResult::Failed(error) = result else {
        panic!("expected a failed run, got {:?}", result);
    };
    assert_eq!(error.node, "broken");
    assert_eq!(error.kind, NodeErrorKind::Processor);
    assert_eq!(error.message, "upstream service unavailable");

    assert_eq!(wait_terminal(&graph, "sibling").await, NodeState::Completed);
    assert_eq!(wait_terminal(&graph, "after").await, NodeState::Errored);
    assert_eq!(wait_terminal(&graph, "bookkeeping").await, NodeState::Done);
    graph.stop().await;

    let jobs = wait_for_jobs(&h.history, 1).await;
    let job = &jobs[0];
    assert!(job.complete);
    assert_eq!(job.run_id, graph.run_id());
    assert_eq!(job.records.len(), 4);
    assert_eq!(job.records.error_count(), 3);

    let skipped = job.records.get("after").unwrap().error.as_ref().unwrap();
    assert_eq!(skipped.kind, NodeErrorKind::Upstream);
    assert!(skipped.message.contains("dependency 'broken' failed"));

    let summary = job.records.get("output").unwrap().output.as_ref().unwrap();
    assert_eq!(summary["status"], json!(500));
    assert!(job.records.get("sibling").unwrap().error.is_none());
}

#[tokio::test]
async fn test_invalid_processor_input_fails_the_node() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("shout", "change_text_case")
            .with_input(json!("{{ _inputs0 }}"))
            .with_config(json!({"case_type": "sideways"})),
        NodeConfig::output(Some("{{ shout.text }}")),
    ];

    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    let result = graph.run(json!("hi")).await.unwrap();

    let OutputResult::Failed(error) = result else {
        panic!("expected a failed run");
    };
    assert_eq!(error.node, "shout");
    assert!(error.message.contains("invalid config"));
}

#[tokio::test]
async fn test_cycle_is_rejected_before_spawning() {
    let counter = Arc::new(CountingProcessor::new());
    let mut registry = ProcessorRegistry::new();
    registry.register_instance("count", counter.clone());
    let h = harness(registry);

    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("a", "count").with_input(json!("{{ b }}")),
        NodeConfig::processor("b", "count").with_input(json!("{{ a }}")),
        NodeConfig::output(Some("{{ a }}")),
    ];

    let err = h.coordinator.start("s1", nodes).await.err().unwrap();
    let CoordinatorError::Validation(errors) = err else {
        panic!("expected validation errors");
    };
    assert!(matches!(
        errors.as_slice(),
        [ValidationError::CyclicDependency { .. }]
    ));
    assert_eq!(counter.calls(), 0);
}

#[tokio::test]
async fn test_unknown_dependency_is_rejected() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("a", "echo").with_input(json!("{{ ghost.text }}")),
        NodeConfig::output(Some("{{ a }}")),
    ];

    let err = h.coordinator.start("s1", nodes).await.err().unwrap();
    let CoordinatorError::Validation(errors) = err else {
        panic!("expected validation errors");
    };
    assert_eq!(
        errors,
        vec![ValidationError::UnresolvedDependency {
            node: "a".to_string(),
            missing_dependency: "ghost".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_duplicate_delivery_is_ignored() {
    let counter = Arc::new(CountingProcessor::new());
    let mut registry = ProcessorRegistry::new();
    registry.register_instance("count", counter.clone());
    let h = harness(registry);

    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("p", "count").with_input(json!("{{ _inputs0 }}")),
        NodeConfig::output(Some("{{ p }}")),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();

    // The forged delivery arrives first; the real one is a duplicate.
    graph
        .get_node("p")
        .unwrap()
        .send(Message::ProcessorOutput {
            sender: "_inputs0".to_string(),
            payload: Payload::Complete(json!("forged")),
        })
        .unwrap();
    let result = graph.run(json!("real")).await.unwrap();

    assert_eq!(result, OutputResult::Completed(json!("forged")));
    assert_eq!(counter.calls(), 1);
}

#[tokio::test]
async fn test_second_input_write_is_rejected() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("p", "echo").with_input(json!("{{ _inputs0 }}")),
        NodeConfig::output(Some("{{ p }}")),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();

    graph.write_input(json!("first")).unwrap();
    assert!(matches!(
        graph.write_input(json!("second")),
        Err(ExecutionError::InputAlreadyWritten)
    ));

    let result = graph.output().unwrap().get_output().await;
    assert_eq!(result, OutputResult::Completed(json!("first")));
    graph.stop().await;
}

#[tokio::test]
async fn test_missing_boundary_nodes() {
    let h = local();

    let no_input = vec![
        NodeConfig::processor("p", "echo").with_input(json!("static")),
        NodeConfig::output(Some("{{ p }}")),
    ];
    let graph = h.coordinator.start("s1", no_input).await.unwrap();
    assert!(matches!(
        graph.write_input(json!(1)),
        Err(ExecutionError::NoInputNode)
    ));
    graph.stop().await;

    let no_output = vec![
        NodeConfig::input(),
        NodeConfig::processor("p", "echo").with_input(json!("{{ _inputs0 }}")),
    ];
    let graph = h.coordinator.start("s1", no_output).await.unwrap();
    assert!(graph.output().is_none());
    assert!(matches!(
        graph.run(json!(1)).await,
        Err(ExecutionError::NoOutputNode)
    ));
    graph.stop().await;
}

#[tokio::test]
async fn test_failed_run_still_stops_graph() {
    let h = local();
    let nodes = vec![
        NodeConfig::processor("p", "echo").with_input(json!("static")),
        NodeConfig::output(Some("{{ p }}")),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();

    assert!(matches!(
        graph.run(json!(1)).await,
        Err(ExecutionError::NoInputNode)
    ));
    assert!(graph.is_stopped());
    for name in ["p", "output"] {
        assert_eq!(graph.get_node(name).unwrap().state(), NodeState::Stopped, "{}", name);
    }
    assert_eq!(graph.output().unwrap().get_output().await, OutputResult::Stopped);
}

#[tokio::test]
async fn test_rerun_after_write_is_rejected_and_stops() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("p", "echo").with_input(json!("{{ _inputs0 }}")),
        NodeConfig::output(Some("{{ p }}")),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    graph.write_input(json!("first")).unwrap();

    assert!(matches!(
        graph.run(json!("second")).await,
        Err(ExecutionError::InputAlreadyWritten)
    ));
    assert!(graph.is_stopped());
    for name in ["input", "p", "output"] {
        assert!(graph.get_node(name).unwrap().state().is_terminal(), "{}", name);
    }
}

#[test]
fn test_default_builder_needs_no_history_worker() {
    // No history sink and no runtime: building must not spawn anything.
    let coordinator = Coordinator::builder().build();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(async {
        let nodes = vec![
            NodeConfig::input(),
            NodeConfig::processor("p", "echo").with_input(json!("{{ _inputs0 }}")),
            NodeConfig::output(Some("{{ p }}")),
            NodeConfig::bookkeeping(),
        ];
        for i in 0..5 {
            let graph = coordinator.start("s1", nodes.clone()).await.unwrap();
            let result = graph.run(json!(i)).await.unwrap();
            assert_eq!(result, OutputResult::Completed(json!(i)));
        }
    });
}

#[tokio::test]
async fn test_stop_is_idempotent_and_concurrent() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("p", "echo").with_input(json!("{{ _inputs0 }}")),
        NodeConfig::output(Some("{{ p }}")),
        NodeConfig::bookkeeping(),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();

    tokio::join!(graph.stop(), graph.stop());
    graph.stop().await;

    assert!(graph.is_stopped());
    for name in ["input", "p", "output", "bookkeeping"] {
        assert_eq!(graph.get_node(name).unwrap().state(), NodeState::Stopped, "{}", name);
    }
    assert_eq!(graph.output().unwrap().get_output().await, OutputResult::Stopped);

    // Bookkeeping still hands over what it has, marked incomplete.
    let jobs = wait_for_jobs(&h.history, 1).await;
    assert!(!jobs[0].complete);
    assert!(jobs[0].records.is_empty());
}

#[tokio::test]
async fn test_run_timeout_stops_the_graph() {
    let mut registry = ProcessorRegistry::new();
    registry.register_instance("slow", Arc::new(SlowProcessor::new(Duration::from_secs(10))));
    let h = harness(registry);

    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("p", "slow").with_input(json!("{{ _inputs0 }}")),
        NodeConfig::output(Some("{{ p }}")),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();

    let result = graph
        .run_with_timeout(json!("x"), Duration::from_millis(50))
        .await
        .unwrap();

    assert_eq!(result, OutputResult::Stopped);
    assert_eq!(graph.get_node("p").unwrap().state(), NodeState::Stopped);
    assert_eq!(graph.get_node("input").unwrap().state(), NodeState::Completed);
}

#[tokio::test]
async fn test_word_stream_reaches_output_stream() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("words", "word_stream").with_input(json!("{{ _inputs0.text }}")),
        NodeConfig::output(Some("{{ words.text }}")),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    let stream = graph.output().unwrap().get_output_stream();

    graph.write_input(json!({"text": "one two three"})).unwrap();
    let events: Vec<OutputEvent> = stream.collect().await;
    graph.stop().await;

    let (last, chunks) = events.split_last().unwrap();
    assert_eq!(*last, OutputEvent::Completed(json!("one two three")));
    let streamed: String = chunks
        .iter()
        .map(|event| match event {
            OutputEvent::Chunk(Value::String(text)) => text.clone(),
            other => panic!("unexpected event {:?}", other),
        })
        .collect();
    assert_eq!(streamed, "one two three");
    assert!(chunks.len() >= 3);
}

#[tokio::test]
async fn test_untemplated_output_streams_raw_chunks() {
    let mut registry = ProcessorRegistry::new();
    registry.register_instance(
        "stream",
        Arc::new(StreamingProcessor::new(
            vec![json!([1]), json!([2, 3])],
            json!([1, 2, 3]),
        )),
    );
    let h = harness(registry);

    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("nums", "stream").with_input(json!("{{ _inputs0 }}")),
        NodeConfig::output(None).depends_on(["nums"]),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    let stream = graph.output().unwrap().get_output_stream();

    graph.write_input(json!(null)).unwrap();
    let events: Vec<OutputEvent> = stream.collect().await;
    graph.stop().await;

    assert_eq!(
        events,
        vec![
            OutputEvent::Chunk(json!([1])),
            OutputEvent::Chunk(json!([2, 3])),
            OutputEvent::Completed(json!([1, 2, 3])),
        ]
    );
}

#[tokio::test]
async fn test_session_state_carries_across_runs() {
    let h = local();
    let nodes = || {
        vec![
            NodeConfig::input(),
            NodeConfig::processor("counter", "session_counter").depends_on(["_inputs0"]),
            NodeConfig::output(Some("run {{ counter.count }}")).wait_for_bookkeeping(true),
            NodeConfig::bookkeeping(),
        ]
    };

    for expected in ["run 1", "run 2", "run 3"] {
        let graph = h.coordinator.start("alice", nodes()).await.unwrap();
        let result = graph.run(json!({})).await.unwrap();
        assert_eq!(result, OutputResult::Completed(json!(expected)));
    }

    let graph = h.coordinator.start("bob", nodes()).await.unwrap();
    let result = graph.run(json!({})).await.unwrap();
    assert_eq!(result, OutputResult::Completed(json!("run 1")));

    let stored = h.sessions.get_session_state("alice", "counter").await.unwrap();
    assert_eq!(stored, Some(json!({"count": 3})));
}

#[tokio::test]
async fn test_output_waits_for_bookkeeping() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        text_step("shout", "change_text_case", "_inputs0")
            .with_config(json!({"case_type": "upper"})),
        NodeConfig::output(Some("{{ shout.text }}")).wait_for_bookkeeping(true),
        NodeConfig::bookkeeping(),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();
    graph.write_input(json!("quiet")).unwrap();

    let result = graph.output().unwrap().get_output().await;
    assert_eq!(result, OutputResult::Completed(json!("QUIET")));
    assert_eq!(wait_terminal(&graph, "bookkeeping").await, NodeState::Done);
    graph.stop().await;

    let jobs = wait_for_jobs(&h.history, 1).await;
    assert!(jobs[0].complete);
    assert_eq!(jobs[0].session_id, "s1");
    let summary = jobs[0].records.get("output").unwrap().output.clone().unwrap();
    assert_eq!(
        summary,
        json!({"status": 200, "body": "QUIET", "content_type": "text/plain"})
    );
}

#[tokio::test]
async fn test_control_start_before_input_is_harmless() {
    let h = local();
    let nodes = vec![
        NodeConfig::input(),
        NodeConfig::processor("p", "echo").with_input(json!("{{ _inputs0 }}")),
        NodeConfig::output(Some("{{ p }}")),
    ];
    let graph = h.coordinator.start("s1", nodes).await.unwrap();

    // p has a dependency, so a stray start signal must not activate it.
    graph
        .get_node("p")
        .unwrap()
        .send(Message::Control(ControlMessage::Start))
        .unwrap();
    let result = graph.run(json!("value")).await.unwrap();
    assert_eq!(result, OutputResult::Completed(json!("value")));
}
