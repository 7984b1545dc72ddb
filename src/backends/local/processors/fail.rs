// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ProcessorError;
use crate::traits::{ProcessorContext, TypedProcessor};

#[derive(Debug, Clone, Deserialize)]
pub struct FailConfig {
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_message() -> String {
    "processor failed".to_string()
}

/// Fail processor - always returns an error with its configured message
pub struct FailProcessor;

impl FailProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FailProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TypedProcessor for FailProcessor {
    type Input = Value;
    type Config = FailConfig;
    type Output = Value;

    async fn process(
        &self,
        _input: Value,
        config: FailConfig,
        _ctx: &ProcessorContext,
    ) -> Result<Value, ProcessorError> {
        Err(ProcessorError::failed(config.message))
    }

    fn name(&self) -> &'static str {
        "fail"
    }
}
