// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Template rendering or expression evaluation failure.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to render template: {0}")]
    Render(String),

    #[error("failed to evaluate expression '{expression}': {reason}")]
    Expression { expression: String, reason: String },

    #[error("rendered value could not be converted: {0}")]
    Conversion(#[from] serde_json::Error),
}
