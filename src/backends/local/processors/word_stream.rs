// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::text::{TextInput, TextOutput};
use crate::errors::ProcessorError;
use crate::traits::{ProcessorContext, TypedProcessor};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordStreamConfig {
    /// Pause between words, to mimic a token stream
    #[serde(default)]
    pub delay_ms: u64,
}

/// Word Stream processor - emits the text one word at a time as chunks,
/// then returns the full text.
///
/// Each chunk is `{"text": "<word and trailing whitespace>"}`, so stitching
/// the chunks together rebuilds the input exactly.
pub struct WordStreamProcessor;

impl WordStreamProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WordStreamProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TypedProcessor for WordStreamProcessor {
    type Input = TextInput;
    type Config = WordStreamConfig;
    type Output = TextOutput;

    async fn process(
        &self,
        input: TextInput,
        config: WordStreamConfig,
        ctx: &ProcessorContext,
    ) -> Result<TextOutput, ProcessorError> {
        let text = input.into_text();
        for piece in text.split_inclusive(char::is_whitespace) {
            if config.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(config.delay_ms)).await;
            }
            ctx.emit_chunk(json!({ "text": piece }));
        }
        Ok(text.into())
    }

    fn name(&self) -> &'static str {
        "word_stream"
    }
}
