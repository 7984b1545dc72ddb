// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;

/// Durable per-processor state that outlives a single run.
///
/// Read once per node when the graph is built, written only by the
/// bookkeeping node.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_session_state(
        &self,
        session_id: &str,
        node_key: &str,
    ) -> Result<Option<Value>, StoreError>;

    async fn put_session_state(
        &self,
        session_id: &str,
        node_key: &str,
        state: Value,
    ) -> Result<(), StoreError>;
}
