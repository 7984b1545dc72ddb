// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::records::HistoryJob;
use crate::errors::EnqueueError;

/// Fire-and-forget submission of run history.
///
/// `enqueue` must not block: it is called from the bookkeeping node while the
/// graph is being torn down.
pub trait HistorySink: Send + Sync {
    fn enqueue(&self, job: HistoryJob) -> Result<(), EnqueueError>;
}
