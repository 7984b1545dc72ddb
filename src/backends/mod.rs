// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Processor backends for The Switchboard.
//!
//! Processors are the business logic run by processor nodes. A backend
//! supplies a set of processor kinds and registers factories for them in a
//! [`ProcessorRegistry`](crate::config::ProcessorRegistry).
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process Rust processors:
//! - **Text Transformation**: `echo`, `change_text_case`, `reverse_text`
//! - **Text Analysis**: `token_counter`
//! - **Streaming**: `word_stream` emits one chunk per word
//! - **Session State**: `session_counter` keeps a per-session count
//! - **Failure**: `fail` always errors, for exercising error paths
//!
//! ## Stub Backend (Test-Only)
//! Instrumented processors for engine tests (only available in test builds):
//! - **CountingProcessor**: echoes input and counts calls
//! - **FailingProcessor**: returns a fixed error
//! - **PanickingProcessor**: panics inside `process`
//! - **SlowProcessor**: sleeps before echoing
//! - **StreamingProcessor**: emits fixed chunks
//!
//! # Examples
//!
//! ```rust
//! use the_switchboard::backends::local::LocalProcessorFactory;
//! use the_switchboard::config::NodeConfig;
//!
//! let node = NodeConfig::processor("shout", "change_text_case");
//! let processor = LocalProcessorFactory::create_processor("change_text_case", &node)?;
//! assert_eq!(processor.name(), "change_text_case");
//! # Ok::<(), the_switchboard::errors::ProcessorError>(())
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
