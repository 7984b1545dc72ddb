// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod history;
pub mod processor;
pub mod session;

pub use history::HistorySink;
pub use processor::{Processor, ProcessorContext, Typed, TypedProcessor};
pub use session::SessionStore;
