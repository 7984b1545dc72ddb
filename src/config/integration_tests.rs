// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use serde_json::json;
    use std::io::Write;
    use std::time::Duration;

    use crate::config::{
        load_and_validate_config, load_config, validate_node_configs, NodeRole, ProcessorRegistry,
        RuntimeBuilder,
    };
    use crate::engine::{OutputEvent, OutputResult};
    use crate::errors::{ConfigError, ValidationError};
    use crate::stores::JsonLinesHistoryWriter;
    use futures::StreamExt;

    fn registry() -> ProcessorRegistry {
        ProcessorRegistry::with_local_processors()
    }

    /// Every bundled pipeline loads and validates against the local processors
    #[test]
    fn test_bundled_configs_validate() {
        for file in [
            "configs/simple-pipeline.yaml",
            "configs/fan-in.yaml",
            "configs/streaming.yaml",
            "configs/session-counter.yaml",
            "configs/failure.yaml",
        ] {
            let cfg = load_and_validate_config(file, &registry())
                .unwrap_or_else(|e| panic!("{} failed to validate: {}", file, e));
            assert!(!cfg.processors.is_empty(), "{}", file);
        }
    }

    #[test]
    fn test_simple_pipeline_yaml_loading() {
        let cfg = load_config("configs/simple-pipeline.yaml").unwrap();

        assert_eq!(cfg.run.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.processors.len(), 2);
        assert_eq!(cfg.processors[0].name, "uppercase");
        assert_eq!(cfg.processors[1].name, "reverse");
        assert_eq!(cfg.processors[0].config, json!({"case_type": "upper"}));
        assert_eq!(cfg.output.template.as_deref(), Some("{{ reverse.text }}"));

        let graph = validate_node_configs(&cfg.node_configs(), &registry()).unwrap();
        assert_eq!(graph.dependents.get_dependents("input"), ["uppercase".to_string()]);
        assert_eq!(graph.dependents.get_dependents("uppercase"), ["reverse".to_string()]);
        assert!(graph.entry_points.is_empty());
    }

    #[test]
    fn test_fan_in_resolves_renamed_template_key() {
        let cfg = load_config("configs/fan-in.yaml").unwrap();
        let nodes = cfg.node_configs();
        let stats = nodes.iter().find(|n| n.name == "stats").unwrap();
        assert_eq!(stats.template_key, "counts");

        let graph = validate_node_configs(&nodes, &registry()).unwrap();
        let output_deps: Vec<_> = graph.dependencies_of("output").into_iter().collect();
        assert_eq!(output_deps, vec!["counts", "shout", "whisper"]);
        assert_eq!(
            graph.dependencies_of("bookkeeping").len(),
            4,
            "three processors plus the output"
        );
    }

    #[test]
    fn test_session_counter_config_has_history_file() {
        let cfg = load_config("configs/session-counter.yaml").unwrap();
        assert_eq!(cfg.run.history_path.as_deref(), Some("switchboard-history.jsonl"));
        assert!(cfg.output.wait_for_bookkeeping);
        assert!(cfg.bookkeeping);

        let roles: Vec<_> = cfg.node_configs().iter().map(|n| n.role).collect();
        assert_eq!(
            roles,
            vec![NodeRole::Input, NodeRole::Processor, NodeRole::Output, NodeRole::BookKeeping]
        );
    }

    #[test]
    fn test_unknown_processor_kind_fails_validation() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(
            br#"
processors:
  - name: chat
    processor: llm_chat
    input: "{{ _inputs0 }}"
"#,
        )
        .unwrap();

        let err = load_and_validate_config(file.path(), &registry()).unwrap_err();
        let ConfigError::Invalid(errors) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(
            errors,
            vec![ValidationError::UnknownProcessorKind {
                node: "chat".to_string(),
                kind: "llm_chat".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_runtime_runs_simple_pipeline() {
        let cfg = load_config("configs/simple-pipeline.yaml").unwrap();
        let runtime = RuntimeBuilder::from_config(&cfg, registry()).unwrap();
        assert_eq!(runtime.coordinator.options().run_timeout, Duration::from_secs(10));

        let graph = runtime
            .coordinator
            .start("config-test", runtime.nodes.clone())
            .await
            .unwrap();
        let result = graph.run(json!({"text": "hello world"})).await.unwrap();
        assert_eq!(result, OutputResult::Completed(json!("DLROW OLLEH")));

        drop(graph);
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_runtime_reports_failure_pipeline_error() {
        let cfg = load_config("configs/failure.yaml").unwrap();
        let runtime = RuntimeBuilder::from_config(&cfg, registry()).unwrap();

        let graph = runtime
            .coordinator
            .start("config-test", runtime.nodes.clone())
            .await
            .unwrap();
        let result = graph.run(json!({"text": "hello"})).await.unwrap();

        let OutputResult::Failed(error) = result else {
            panic!("expected failure");
        };
        assert_eq!(error.node, "broken");
        assert_eq!(error.message, "upstream service unavailable");
    }

    #[tokio::test]
    async fn test_runtime_streams_fan_in_template() {
        let cfg = load_config("configs/fan-in.yaml").unwrap();
        let runtime = RuntimeBuilder::from_config(&cfg, registry()).unwrap();

        let graph = runtime
            .coordinator
            .start("config-test", runtime.nodes.clone())
            .await
            .unwrap();
        let stream = graph.output().unwrap().get_output_stream();
        graph.write_input(json!({"text": "Hello There"})).unwrap();
        let events: Vec<OutputEvent> = stream.collect().await;
        graph.stop().await;

        assert_eq!(
            events.last(),
            Some(&OutputEvent::Completed(json!("HELLO THERE / hello there (2 words)")))
        );
    }

    #[tokio::test]
    async fn test_runtime_writes_history_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let mut cfg = load_config("configs/session-counter.yaml").unwrap();
        cfg.run.history_path = Some(path.to_string_lossy().into_owned());

        let runtime = RuntimeBuilder::from_config(&cfg, registry()).unwrap();
        for expected in ["run 1", "run 2"] {
            let graph = runtime
                .coordinator
                .start("history-test", runtime.nodes.clone())
                .await
                .unwrap();
            let result = graph.run(json!({})).await.unwrap();
            assert_eq!(result, OutputResult::Completed(json!(expected)));
        }
        runtime.shutdown().await;

        let writer = JsonLinesHistoryWriter::new(&path);
        let contents = std::fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|job| job["session_id"] == "history-test"));
        assert!(lines.iter().all(|job| job["complete"] == true));
    }
}
