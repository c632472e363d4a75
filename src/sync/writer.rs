//! Background store writer.
//!
//! DESIGN
//! ======
//! The input path must never wait on the network. Writes are handed to one
//! spawned task through a bounded queue with `try_send`; the task applies them
//! to the store in queue order, so a stroke's create always lands before its
//! growth. A failed write is logged with its error code and not retried: the
//! next write of the same stroke carries the full latest state.

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::sync::store::RemoteStore;

/// One queued store operation.
#[derive(Debug)]
pub enum WriteOp {
    /// Replace (or with `None`, delete) one path.
    Set { path: String, value: Option<Value> },
    /// Atomic multi-child write under `path`.
    Update { path: String, children: Vec<(String, Option<Value>)> },
    /// Resolves once every earlier operation has been applied.
    Barrier(oneshot::Sender<()>),
}

impl WriteOp {
    fn describe(&self) -> (&'static str, &str) {
        match self {
            Self::Set { path, .. } => ("set", path),
            Self::Update { path, .. } => ("update", path),
            Self::Barrier(_) => ("barrier", ""),
        }
    }
}

/// Why an operation was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    Full,
    Closed,
}

/// Handle to the writer task's queue.
#[derive(Debug, Clone)]
pub struct StoreWriter {
    tx: mpsc::Sender<WriteOp>,
}

impl StoreWriter {
    /// Queue `op` without waiting. A full or closed queue drops the operation
    /// with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError`] when the operation was dropped.
    pub fn enqueue(&self, op: WriteOp) -> Result<(), EnqueueError> {
        let (kind, path) = op.describe();
        let path = path.to_owned();
        match self.tx.try_send(op) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(kind, path = %path, "store write queue full; dropping write");
                Err(EnqueueError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(kind, path = %path, "store write queue closed; dropping write");
                Err(EnqueueError::Closed)
            }
        }
    }

    /// Wait until every operation queued so far has been applied.
    pub async fn settled(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteOp::Barrier(done_tx)).await.is_err() {
            return;
        }
        if done_rx.await.is_err() {
            debug!("writer stopped before barrier resolved");
        }
    }
}

/// Spawn the writer task. It stops once every [`StoreWriter`] clone is dropped
/// and the queue drains.
#[must_use]
pub fn spawn_writer(store: Arc<dyn RemoteStore>, capacity: usize) -> (StoreWriter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<WriteOp>(capacity.max(1));
    info!(queue_capacity = capacity, "store writer configured");

    let handle = tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            apply(store.as_ref(), op).await;
        }
        debug!("store writer stopped");
    });

    (StoreWriter { tx }, handle)
}

async fn apply(store: &dyn RemoteStore, op: WriteOp) {
    let (kind, path, result) = match op {
        WriteOp::Set { path, value } => {
            let result = store.write(&path, value).await;
            ("set", path, result)
        }
        WriteOp::Update { path, children } => {
            let count = children.len();
            let result = store.update(&path, children).await;
            debug!(path = %path, count, "applied multi-path update");
            ("update", path, result)
        }
        WriteOp::Barrier(done) => {
            if done.send(()).is_err() {
                debug!("barrier waiter went away");
            }
            return;
        }
    };

    if let Err(e) = result {
        warn!(
            error = %e,
            code = e.error_code(),
            retryable = e.retryable(),
            kind,
            path = %path,
            "store write failed"
        );
    }
}
