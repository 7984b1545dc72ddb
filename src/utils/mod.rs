// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod stitch;

pub use stitch::{stitch_chunk, value_text};
