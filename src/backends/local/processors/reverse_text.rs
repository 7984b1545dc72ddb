// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::time::Instant;

use super::text::{NoConfig, TextInput, TextOutput};
use crate::errors::ProcessorError;
use crate::observability::messages::{processor::*, StructuredLog};
use crate::traits::{ProcessorContext, TypedProcessor};

/// Reverse Text processor - reverses the input string
pub struct ReverseTextProcessor;

impl ReverseTextProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReverseTextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TypedProcessor for ReverseTextProcessor {
    type Input = TextInput;
    type Config = NoConfig;
    type Output = TextOutput;

    async fn process(
        &self,
        input: TextInput,
        _config: NoConfig,
        ctx: &ProcessorContext,
    ) -> Result<TextOutput, ProcessorError> {
        let input = input.into_text();
        let start_msg = ProcessorExecutionStarted {
            processor_id: self.name(),
            node: ctx.node(),
            input_size: input.len(),
        };
        let span = start_msg.span("processor_execution");
        let _guard = span.enter();
        start_msg.log();

        let start_time = Instant::now();
        let reversed: String = input.chars().rev().collect();

        ProcessorExecutionCompleted {
            processor_id: self.name(),
            input_size: input.len(),
            output_size: reversed.len(),
            duration: start_time.elapsed(),
        }
        .log();

        Ok(reversed.into())
    }

    fn name(&self) -> &'static str {
        "reverse_text"
    }
}
