// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::traits::SessionStore;

/// Process-local [`SessionStore`] keyed by `(session_id, node_key)`.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<(String, String), Value>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_session_state(
        &self,
        session_id: &str,
        node_key: &str,
    ) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(session_id.to_string(), node_key.to_string()))
            .cloned())
    }

    async fn put_session_state(
        &self,
        session_id: &str,
        node_key: &str,
        state: Value,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert((session_id.to_string(), node_key.to_string()), state);
        Ok(())
    }
}
