// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Template support: dependency extraction, rendering and hydration.

pub mod extractor;
pub mod hydrate;
pub mod renderer;

pub use extractor::{extract_dependencies, extract_from_str, root_identifier};
pub use hydrate::hydrate;
pub use renderer::{MiniJinjaRenderer, TemplateContext, TemplateRenderer};
