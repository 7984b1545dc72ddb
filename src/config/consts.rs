// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default wall-clock limit for one run (seconds)
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 30;
/// Default capacity of the history job queue
pub const DEFAULT_HISTORY_QUEUE_CAPACITY: usize = 64;
/// Template key under which the request payload is addressable
pub const INPUT_TEMPLATE_KEY: &str = "_inputs0";
/// Node names of the boundary nodes added by the pipeline loader
pub const INPUT_NODE_NAME: &str = "input";
pub const OUTPUT_NODE_NAME: &str = "output";
pub const BOOKKEEPING_NODE_NAME: &str = "bookkeeping";
/// Template key of the bookkeeping node; never referenced from templates
pub const BOOKKEEPING_TEMPLATE_KEY: &str = "_bookkeeping";
/// Template key of the output node
pub const OUTPUT_TEMPLATE_KEY: &str = "_output";
