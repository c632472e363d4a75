//! Inbound half of stroke sync: the merge listener.
//!
//! Every value delivered for the room's stroke path replaces the local
//! collection wholesale. Decoding is forgiving (see
//! [`StrokeCollection::from_remote`]) and the collection cap is enforced on
//! every delivery. The listener task forwards decoded collections to the host
//! over a bounded channel and ends when either side goes away.

#[cfg(test)]
#[path = "listener_test.rs"]
mod listener_test;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::stroke::StrokeCollection;
use crate::sync::store::{RemoteStore, Subscription};

const MERGE_CHANNEL_CAPACITY: usize = 64;

/// Subscribe to `path` and forward merged collections until the subscription
/// or the receiver closes.
#[must_use]
pub fn spawn_listener(
    store: Arc<dyn RemoteStore>,
    path: String,
    cap: usize,
) -> (mpsc::Receiver<StrokeCollection>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(MERGE_CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move {
        let subscription = match store.subscribe(&path).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), path = %path, "stroke subscription failed");
                return;
            }
        };
        info!(path = %path, cap, "merge listener started");
        forward(subscription, cap, tx).await;
        info!(path = %path, "merge listener stopped");
    });
    (rx, handle)
}

/// Decode each delivered value and send it on. Returns when the subscription
/// ends or the receiver is dropped.
pub async fn forward(mut subscription: Subscription, cap: usize, tx: mpsc::Sender<StrokeCollection>) {
    while let Some(value) = subscription.next().await {
        let collection = StrokeCollection::from_remote(value, cap);
        debug!(count = collection.len(), "merged remote strokes");
        if tx.send(collection).await.is_err() {
            debug!("merge receiver dropped");
            return;
        }
    }
}
