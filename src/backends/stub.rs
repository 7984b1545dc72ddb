// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProcessorError;
use crate::traits::{Processor, ProcessorContext};

/// Echoes its input and counts how often it was called
#[derive(Default)]
pub struct CountingProcessor {
    calls: AtomicUsize,
}

impl CountingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Processor for CountingProcessor {
    async fn process(
        &self,
        input: Value,
        _config: Value,
        _ctx: &ProcessorContext,
    ) -> Result<Value, ProcessorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(input)
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// A processor that always fails for testing failure scenarios
pub struct FailingProcessor {
    message: String,
}

impl FailingProcessor {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Processor for FailingProcessor {
    async fn process(
        &self,
        _input: Value,
        _config: Value,
        _ctx: &ProcessorContext,
    ) -> Result<Value, ProcessorError> {
        Err(ProcessorError::failed(self.message.clone()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub struct PanickingProcessor;

#[async_trait]
impl Processor for PanickingProcessor {
    async fn process(
        &self,
        _input: Value,
        _config: Value,
        _ctx: &ProcessorContext,
    ) -> Result<Value, ProcessorError> {
        panic!("kaboom");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

/// Sleeps, then echoes its input
pub struct SlowProcessor {
    delay: Duration,
}

impl SlowProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Processor for SlowProcessor {
    async fn process(
        &self,
        input: Value,
        _config: Value,
        _ctx: &ProcessorContext,
    ) -> Result<Value, ProcessorError> {
        tokio::time::sleep(self.delay).await;
        Ok(input)
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// Emits each configured chunk, then returns `final_value`
pub struct StreamingProcessor {
    chunks: Vec<Value>,
    final_value: Value,
}

impl StreamingProcessor {
    pub fn new(chunks: Vec<Value>, final_value: Value) -> Self {
        Self { chunks, final_value }
    }
}

#[async_trait]
impl Processor for StreamingProcessor {
    async fn process(
        &self,
        _input: Value,
        _config: Value,
        ctx: &ProcessorContext,
    ) -> Result<Value, ProcessorError> {
        for chunk in &self.chunks {
            ctx.emit_chunk(chunk.clone());
            tokio::task::yield_now().await;
        }
        Ok(self.final_value.clone())
    }

    fn name(&self) -> &'static str {
        "streaming"
    }
}
