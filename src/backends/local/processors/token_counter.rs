// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Serialize;

use super::text::{NoConfig, TextInput};
use crate::errors::ProcessorError;
use crate::traits::{ProcessorContext, TypedProcessor};

/// Token Counter processor - counts characters, words and lines
pub struct TokenCounterProcessor;

impl TokenCounterProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokenCounterProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct TokenCountResult {
    pub char_count: usize,
    pub word_count: usize,
    pub line_count: usize,
}

#[async_trait]
impl TypedProcessor for TokenCounterProcessor {
    type Input = TextInput;
    type Config = NoConfig;
    type Output = TokenCountResult;

    async fn process(
        &self,
        input: TextInput,
        _config: NoConfig,
        _ctx: &ProcessorContext,
    ) -> Result<TokenCountResult, ProcessorError> {
        let input = input.into_text();
        Ok(TokenCountResult {
            char_count: input.chars().count(),
            word_count: input.split_whitespace().count(),
            line_count: input.lines().count().max(1), // At least 1 line even if empty
        })
    }

    fn name(&self) -> &'static str {
        "token_counter"
    }
}
