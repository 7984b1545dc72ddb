// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Background persistence of run history.
//!
//! [`QueuedHistorySink`] owns a bounded queue and a worker task. The
//! bookkeeping node only ever calls the non-blocking `enqueue`; the worker
//! hands each job to a [`HistoryWriter`]. [`DiscardHistorySink`] is the
//! default when nothing is configured and keeps no jobs at all.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::consts::DEFAULT_HISTORY_QUEUE_CAPACITY;
use crate::engine::records::HistoryJob;
use crate::errors::{EnqueueError, HistoryWriteError};
use crate::observability::messages::bookkeeping::{HistoryDiscarded, HistoryWriteFailed};
use crate::observability::messages::StructuredLog;
use crate::traits::HistorySink;

#[async_trait]
pub trait HistoryWriter: Send + Sync {
    async fn write(&self, job: &HistoryJob) -> Result<(), HistoryWriteError>;
}

/// Keeps every job in memory. Useful in tests; grows with every run.
#[derive(Debug, Default)]
pub struct MemoryHistoryWriter {
    jobs: Mutex<Vec<HistoryJob>>,
}

impl MemoryHistoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn jobs(&self) -> Vec<HistoryJob> {
        self.jobs.lock().await.clone()
    }
}

#[async_trait]
impl HistoryWriter for MemoryHistoryWriter {
    async fn write(&self, job: &HistoryJob) -> Result<(), HistoryWriteError> {
        self.jobs.lock().await.push(job.clone());
        Ok(())
    }
}

/// Appends one JSON document per run to a file.
#[derive(Debug)]
pub struct JsonLinesHistoryWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesHistoryWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryWriter for JsonLinesHistoryWriter {
    async fn write(&self, job: &HistoryJob) -> Result<(), HistoryWriteError> {
        let mut line = serde_json::to_vec(job)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Logs each job at debug level and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardHistorySink;

impl HistorySink for DiscardHistorySink {
    fn enqueue(&self, job: HistoryJob) -> Result<(), EnqueueError> {
        let run_id = job.run_id.to_string();
        HistoryDiscarded {
            run_id: &run_id,
            session_id: &job.session_id,
            complete: job.complete,
        }
        .log();
        Ok(())
    }
}

/// [`HistorySink`] backed by a bounded tokio channel and a worker task.
pub struct QueuedHistorySink {
    tx: mpsc::Sender<HistoryJob>,
    capacity: usize,
    worker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl QueuedHistorySink {
    /// Spawn the worker. Must be called inside a tokio runtime.
    pub fn spawn(writer: Arc<dyn HistoryWriter>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, mut rx) = mpsc::channel::<HistoryJob>(capacity);

        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = writer.write(&job).await {
                    let run_id = job.run_id.to_string();
                    HistoryWriteFailed {
                        run_id: &run_id,
                        error: &e,
                    }
                    .log();
                }
            }
        });

        Self {
            tx,
            capacity,
            worker: std::sync::Mutex::new(Some(worker)),
        }
    }

    pub fn in_memory() -> (Self, Arc<MemoryHistoryWriter>) {
        let writer = Arc::new(MemoryHistoryWriter::new());
        let sink = Self::spawn(writer.clone(), DEFAULT_HISTORY_QUEUE_CAPACITY);
        (sink, writer)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Close the queue and wait for queued jobs to be written.
    pub async fn shutdown(self) {
        let QueuedHistorySink { tx, worker, .. } = self;
        drop(tx);
        let handle = worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl HistorySink for QueuedHistorySink {
    fn enqueue(&self, job: HistoryJob) -> Result<(), EnqueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::QueueFull {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}
