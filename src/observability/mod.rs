// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Log text is kept in struct-based message types with a `Display`
//! implementation instead of format strings scattered through the engine.
//! Messages are grouped by subsystem under [`messages`].

pub mod messages;
