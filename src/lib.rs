// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // processor backends
pub mod config;     // node configs, registry, validation
pub mod engine;     // node actors + coordinator
pub mod errors;     // error handling
pub mod observability;
pub mod stores;     // session + history persistence
pub mod template;   // dependency extraction + rendering
pub mod traits;     // unified abstractions
pub mod utils;
