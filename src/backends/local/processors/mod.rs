// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod change_text_case;
pub mod echo;
pub mod fail;
pub mod reverse_text;
pub mod session_counter;
pub mod text;
pub mod token_counter;
pub mod word_stream;

pub use change_text_case::*;
pub use echo::*;
pub use fail::*;
pub use reverse_text::*;
pub use session_counter::*;
pub use text::*;
pub use token_counter::*;
pub use word_stream::*;
