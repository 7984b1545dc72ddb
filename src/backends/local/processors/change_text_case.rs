// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::text::{TextInput, TextOutput};
use crate::errors::ProcessorError;
use crate::observability::messages::{processor::*, StructuredLog};
use crate::traits::{ProcessorContext, TypedProcessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Upper,
    Lower,
    /// First letter of each word capitalized
    Proper,
    /// Like proper, but small words after the first stay lowercase
    Title,
}

/// Configuration for the Change Text Case processor
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChangeTextCaseConfig {
    pub case_type: CaseType,
}

/// Change Text Case processor - converts text to different cases
pub struct ChangeTextCaseProcessor;

impl ChangeTextCaseProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChangeTextCaseProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

pub fn change_case(input: &str, case_type: CaseType) -> String {
    match case_type {
        CaseType::Upper => input.to_uppercase(),
        CaseType::Lower => input.to_lowercase(),
        CaseType::Proper => input
            .split_whitespace()
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
        CaseType::Title => input
            .split_whitespace()
            .enumerate()
            .map(|(i, word)| {
                let lower_word = word.to_lowercase();
                let small = matches!(
                    lower_word.as_str(),
                    "a" | "an" | "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for"
                        | "of" | "with" | "by"
                );
                if i == 0 || !small {
                    capitalize(word)
                } else {
                    lower_word
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[async_trait]
impl TypedProcessor for ChangeTextCaseProcessor {
    type Input = TextInput;
    type Config = ChangeTextCaseConfig;
    type Output = TextOutput;

    async fn process(
        &self,
        input: TextInput,
        config: ChangeTextCaseConfig,
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
        let result = change_case(&input, config.case_type);

        ProcessorExecutionCompleted {
            processor_id: self.name(),
            input_size: input.len(),
            output_size: result.len(),
            duration: start_time.elapsed(),
        }
        .log();

        Ok(result.into())
    }

    fn name(&self) -> &'static str {
        "change_text_case"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{Processor, Typed};
    use serde_json::json;

    #[test]
    fn test_case_conversions() {
        let test_cases = vec![
            (CaseType::Upper, "hello", "HELLO"),
            (CaseType::Lower, "HELLO", "hello"),
            (CaseType::Proper, "hello wORLD", "Hello World"),
            (CaseType::Title, "the quick brown fox and the hound", "The Quick Brown Fox and the Hound"),
        ];

        for (case_type, input, expected) in test_cases {
            assert_eq!(change_case(input, case_type), expected, "{:?}", case_type);
        }
    }

    #[tokio::test]
    async fn test_typed_processor_accepts_bare_and_object_input() {
        let ctx = ProcessorContext::new("case", "s", None);
        let processor = Typed(ChangeTextCaseProcessor::new());

        let out = processor
            .process(json!({"text": "hi"}), json!({"case_type": "upper"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out, json!({"text": "HI"}));

        let out = processor
            .process(json!("Hi There"), json!({"case_type": "lower"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out, json!({"text": "hi there"}));
    }

    #[tokio::test]
    async fn test_unknown_case_type_is_config_error() {
        let ctx = ProcessorContext::new("case", "s", None);
        let err = Typed(ChangeTextCaseProcessor::new())
            .process(json!("x"), json!({"case_type": "sponge"}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidConfig(_)));
    }
}
