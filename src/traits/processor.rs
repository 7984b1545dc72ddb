// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;

use crate::engine::message::Outbox;
use crate::errors::ProcessorError;

/// Business logic wrapped by a processor node.
///
/// `input` and `config` arrive already hydrated: every template placeholder
/// has been replaced by the values delivered from upstream nodes.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(
        &self,
        input: Value,
        config: Value,
        ctx: &ProcessorContext,
    ) -> Result<Value, ProcessorError>;

    fn name(&self) -> &'static str;
}

/// Per-activation view of the run handed to a processor.
pub struct ProcessorContext {
    node: String,
    session_id: String,
    session_state: Option<Value>,
    outbox: Option<Outbox>,
    session_update: Mutex<Option<Value>>,
}

impl ProcessorContext {
    pub fn new(
        node: impl Into<String>,
        session_id: impl Into<String>,
        session_state: Option<Value>,
    ) -> Self {
        Self {
            node: node.into(),
            session_id: session_id.into(),
            session_state,
            outbox: None,
            session_update: Mutex::new(None),
        }
    }

    /// Route chunks emitted by the processor to these dependents
    pub fn with_outbox(mut self, outbox: Outbox) -> Self {
        self.outbox = Some(outbox);
        self
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Session state as it was when the graph was built
    pub fn session_state(&self) -> Option<&Value> {
        self.session_state.as_ref()
    }

    /// Stream a partial result to every dependent ahead of the final value.
    pub fn emit_chunk(&self, chunk: Value) {
        if let Some(outbox) = &self.outbox {
            outbox.emit_chunk(chunk);
        }
    }

    /// Report new session state. The bookkeeping node persists it; the
    /// processor never writes to the session store itself.
    pub fn update_session_state(&self, state: Value) {
        if let Ok(mut slot) = self.session_update.lock() {
            *slot = Some(state);
        }
    }

    pub fn take_session_update(&self) -> Option<Value> {
        self.session_update.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// A processor with concrete input, config and output types.
///
/// Wrap it in [`Typed`] to register it. The hydrated JSON is decoded into
/// `Input`/`Config` before `process` runs; a null config decodes as `{}`.
#[async_trait]
pub trait TypedProcessor: Send + Sync {
    type Input: DeserializeOwned + Send;
    type Config: DeserializeOwned + Send;
    type Output: Serialize;

    async fn process(
        &self,
        input: Self::Input,
        config: Self::Config,
        ctx: &ProcessorContext,
    ) -> Result<Self::Output, ProcessorError>;

    fn name(&self) -> &'static str;
}

/// Adapter from [`TypedProcessor`] to [`Processor`].
pub struct Typed<P>(pub P);

#[async_trait]
impl<P> Processor for Typed<P>
where
    P: TypedProcessor,
{
    async fn process(
        &self,
        input: Value,
        config: Value,
        ctx: &ProcessorContext,
    ) -> Result<Value, ProcessorError> {
        let input: P::Input = serde_json::from_value(input)
            .map_err(|e| ProcessorError::InvalidInput(e.to_string()))?;
        let config = match config {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        let config: P::Config = serde_json::from_value(config)
            .map_err(|e| ProcessorError::InvalidConfig(e.to_string()))?;

        let output = self.0.process(input, config, ctx).await?;
        Ok(serde_json::to_value(output)?)
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}
