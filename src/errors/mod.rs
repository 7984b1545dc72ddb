// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod processor;
mod store;
mod template;

pub use config::{ConfigError, ValidationError};
pub use execution::{CoordinatorError, ExecutionError};
pub use processor::ProcessorError;
pub use store::{EnqueueError, HistoryWriteError, StoreError};
pub use template::TemplateError;
