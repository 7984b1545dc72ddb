// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bookkeeping data: one record per node, aggregated per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::engine::message::NodeError;

/// Execution record produced once per processor node (and by the output node).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookKeepingRecord {
    pub node: String,
    pub input: Value,
    pub config: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<NodeError>,
    /// Updated session state reported by a stateful processor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl BookKeepingRecord {
    pub fn success(node: impl Into<String>, input: Value, config: Value, output: Value) -> Self {
        Self {
            node: node.into(),
            input,
            config,
            output: Some(output),
            error: None,
            session_data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(node: impl Into<String>, input: Value, config: Value, error: NodeError) -> Self {
        Self {
            node: node.into(),
            input,
            config,
            output: None,
            error: Some(error),
            session_data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_session_data(mut self, session_data: Option<Value>) -> Self {
        self.session_data = session_data;
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary of the rendered run result, recorded by the output node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: u16,
    pub body: String,
    pub content_type: String,
}

impl RunSummary {
    pub fn rendered(value: &Value) -> Self {
        match value {
            Value::String(text) => Self {
                status: 200,
                body: text.clone(),
                content_type: "text/plain".to_string(),
            },
            other => Self {
                status: 200,
                body: other.to_string(),
                content_type: "application/json".to_string(),
            },
        }
    }

    pub fn failed(error: &NodeError) -> Self {
        Self {
            status: 500,
            body: error.to_payload().to_string(),
            content_type: "application/json".to_string(),
        }
    }
}

/// All records collected for one run, keyed by node name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub records: BTreeMap<String, BookKeepingRecord>,
    pub expected: usize,
}

impl RunRecord {
    pub fn new(expected: usize) -> Self {
        Self {
            records: BTreeMap::new(),
            expected,
        }
    }

    /// Store a record. Returns `false` if the node already reported.
    pub fn insert(&mut self, record: BookKeepingRecord) -> bool {
        if self.records.contains_key(&record.node) {
            return false;
        }
        self.records.insert(record.node.clone(), record);
        true
    }

    pub fn get(&self, node: &str) -> Option<&BookKeepingRecord> {
        self.records.get(node)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.records.len() >= self.expected
    }

    pub fn error_count(&self) -> usize {
        self.records.values().filter(|r| r.is_error()).count()
    }
}

/// Best-effort persistence job handed to the history sink at graph teardown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryJob {
    pub run_id: Uuid,
    pub session_id: String,
    pub records: RunRecord,
    pub complete: bool,
    pub finished_at: DateTime<Utc>,
}
