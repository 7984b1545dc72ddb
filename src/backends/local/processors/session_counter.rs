// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::text::NoConfig;
use crate::errors::ProcessorError;
use crate::traits::{ProcessorContext, TypedProcessor};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterState {
    pub count: u64,
}

/// Session Counter processor - counts how many runs of the session reached
/// it, keeping the count in session state.
pub struct SessionCounterProcessor;

impl SessionCounterProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SessionCounterProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TypedProcessor for SessionCounterProcessor {
    type Input = Value;
    type Config = NoConfig;
    type Output = CounterState;

    async fn process(
        &self,
        _input: Value,
        _config: NoConfig,
        ctx: &ProcessorContext,
    ) -> Result<CounterState, ProcessorError> {
        let previous: CounterState = match ctx.session_state() {
            Some(state) => serde_json::from_value(state.clone())?,
            None => CounterState::default(),
        };

        let next = CounterState {
            count: previous.count + 1,
        };
        ctx.update_session_state(serde_json::to_value(&next)?);
        Ok(next)
    }

    fn name(&self) -> &'static str {
        "session_counter"
    }
}
