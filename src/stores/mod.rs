// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Default implementations of the session store and history sink.

pub mod history;
pub mod session;

pub use history::{
    DiscardHistorySink, HistoryWriter, JsonLinesHistoryWriter, MemoryHistoryWriter, QueuedHistorySink,
};
pub use session::InMemorySessionStore;
