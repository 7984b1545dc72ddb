// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// Text input accepted by the text processors: either a bare string or an
/// object with a `text` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Bare(String),
    Object { text: String },
}

impl TextInput {
    pub fn into_text(self) -> String {
        match self {
            TextInput::Bare(text) | TextInput::Object { text } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextOutput {
    pub text: String,
}

impl From<String> for TextOutput {
    fn from(text: String) -> Self {
        Self { text }
    }
}

/// Processors that take no configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoConfig {}
