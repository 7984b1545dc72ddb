// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProcessorError;
use crate::traits::{Processor, ProcessorContext};

/// Echo processor - returns its hydrated input unchanged
pub struct EchoProcessor;

impl EchoProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for EchoProcessor {
    async fn process(
        &self,
        input: Value,
        _config: Value,
        _ctx: &ProcessorContext,
    ) -> Result<Value, ProcessorError> {
        Ok(input)
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}
