// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use futures::StreamExt;
use serde_json::{json, Value};
use std::env;
use std::io::{self, Write};
use the_switchboard::config::{load_config, ProcessorRegistry, RuntimeBuilder};
use the_switchboard::engine::{OutputEvent, OutputResult};
use tracing_subscriber::EnvFilter;

const DEFAULT_SESSION: &str = "cli";

struct Args {
    pipeline: String,
    input: Value,
    stream: bool,
    session: String,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} <pipeline.yaml|pipeline.toml> <input> [--stream] [--session <id>]\n\
         Example: {} configs/simple-pipeline.yaml '{{\"text\": \"hello world\"}}'\n\
         Example: {} configs/streaming.yaml \"one word at a time\" --stream",
        program, program, program
    )
}

/// Input that is not valid JSON is treated as `{"text": <input>}`
fn parse_input(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "text": raw }))
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("the-switchboard");

    let mut positional = Vec::new();
    let mut stream = false;
    let mut session = DEFAULT_SESSION.to_string();
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--stream" => stream = true,
            "--session" => {
                session = rest
                    .next()
                    .cloned()
                    .with_context(|| format!("--session needs a value\n{}", usage(program)))?;
            }
            _ => positional.push(arg.clone()),
        }
    }

    let [pipeline, input] = positional.as_slice() else {
        bail!("{}", usage(program));
    };

    Ok(Args {
        pipeline: pipeline.clone(),
        input: parse_input(input),
        stream,
        session,
    })
}

fn print_value(value: &Value) -> anyhow::Result<()> {
    match value {
        Value::String(text) => println!("{}", text),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = parse_args()?;
    let cfg = load_config(&args.pipeline)
        .with_context(|| format!("failed to load pipeline '{}'", args.pipeline))?;
    let runtime = RuntimeBuilder::from_config(&cfg, ProcessorRegistry::with_local_processors())
        .with_context(|| format!("invalid pipeline '{}'", args.pipeline))?;

    let graph = runtime
        .coordinator
        .start(&args.session, runtime.nodes.clone())
        .await?;

    let result = if args.stream {
        let Some(output) = graph.output() else {
            bail!("pipeline has no output node");
        };
        let events = output.get_output_stream();
        tokio::pin!(events);
        graph.write_input(args.input)?;

        let mut stdout = io::stdout();
        let mut result = OutputResult::Stopped;
        let timeout = tokio::time::sleep(cfg.run.timeout());
        tokio::pin!(timeout);
        loop {
            tokio::select! {
                _ = &mut timeout => break,
                event = events.next() => match event {
                    Some(OutputEvent::Chunk(Value::String(text))) => {
                        write!(stdout, "{}", text)?;
                        stdout.flush()?;
                    }
                    Some(OutputEvent::Chunk(other)) => writeln!(stdout, "{}", other)?,
                    Some(OutputEvent::Completed(value)) => {
                        writeln!(stdout)?;
                        result = OutputResult::Completed(value);
                        break;
                    }
                    Some(OutputEvent::Failed(error)) => {
                        result = OutputResult::Failed(error);
                        break;
                    }
                    Some(OutputEvent::Stopped) | None => break,
                },
            }
        }
        graph.stop().await;
        result
    } else {
        graph.run(args.input).await?
    };
    drop(graph);
    runtime.shutdown().await;

    match result {
        OutputResult::Completed(value) => {
            if !args.stream {
                print_value(&value)?;
            }
            Ok(())
        }
        OutputResult::Failed(error) => {
            eprintln!("{}", serde_json::to_string_pretty(&error.to_payload())?);
            std::process::exit(1);
        }
        OutputResult::Stopped => {
            eprintln!("run stopped before the output was ready");
            std::process::exit(2);
        }
    }
}
