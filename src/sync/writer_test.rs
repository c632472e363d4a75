use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use tokio::sync::Semaphore;

use super::*;
use crate::stroke::StrokeKey;
use crate::sync::store::{MemoryStore, StoreError, Subscription};

/// Store whose writes wait for a permit, so the queue can be made to back up.
struct GatedStore {
    inner: MemoryStore,
    gate: Semaphore,
    writes: AtomicUsize,
}

#[async_trait::async_trait]
impl RemoteStore for GatedStore {
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        self.inner.subscribe(path).await
    }

    async fn write(&self, path: &str, value: Option<Value>) -> Result<(), StoreError> {
        let permit = self.gate.acquire().await.map_err(|_| StoreError::Closed)?;
        permit.forget();
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(path, value).await
    }

    async fn update(&self, path: &str, children: Vec<(String, Option<Value>)>) -> Result<(), StoreError> {
        self.inner.update(path, children).await
    }

    fn append_key(&self, path: &str) -> StrokeKey {
        self.inner.append_key(path)
    }
}

#[tokio::test]
async fn writes_apply_in_queue_order() {
    let store = Arc::new(MemoryStore::new());
    let (writer, _handle) = spawn_writer(store.clone(), 16);

    writer.enqueue(WriteOp::Set { path: "rooms/r/lines/a".into(), value: Some(json!({"n": 1})) }).unwrap();
    writer.enqueue(WriteOp::Set { path: "rooms/r/lines/a".into(), value: Some(json!({"n": 2})) }).unwrap();
    writer.enqueue(WriteOp::Set { path: "rooms/r/lines/b".into(), value: Some(json!(true)) }).unwrap();
    writer.enqueue(WriteOp::Set { path: "rooms/r/lines/b".into(), value: None }).unwrap();
    writer.settled().await;

    assert_eq!(store.get("rooms/r/lines").await.unwrap(), json!({"a": {"n": 2}}));
}

#[tokio::test]
async fn update_ops_are_applied() {
    let store = Arc::new(MemoryStore::new());
    let (writer, _handle) = spawn_writer(store.clone(), 16);
    writer
        .enqueue(WriteOp::Update {
            path: "rooms/r/lines".into(),
            children: vec![("a".into(), Some(json!(1))), ("b".into(), Some(json!(2)))],
        })
        .unwrap();
    writer.settled().await;
    assert_eq!(store.get("rooms/r/lines").await.unwrap(), json!({"a": 1, "b": 2}));
}

#[tokio::test]
async fn failed_write_does_not_stop_the_writer() {
    let store = Arc::new(MemoryStore::new());
    let (writer, _handle) = spawn_writer(store.clone(), 16);

    store.set_read_only(true);
    writer.enqueue(WriteOp::Set { path: "x".into(), value: Some(json!(1)) }).unwrap();
    writer.settled().await;
    assert_eq!(store.get("x").await.unwrap(), Value::Null);

    store.set_read_only(false);
    writer.enqueue(WriteOp::Set { path: "x".into(), value: Some(json!(2)) }).unwrap();
    writer.settled().await;
    assert_eq!(store.get("x").await.unwrap(), json!(2));
}

#[tokio::test]
async fn full_queue_drops_without_blocking() {
    let store =
        Arc::new(GatedStore { inner: MemoryStore::new(), gate: Semaphore::new(0), writes: AtomicUsize::new(0) });
    let (writer, _handle) = spawn_writer(store.clone(), 1);

    // The first op is taken by the task and parks on the gate; the second fills the queue.
    writer.enqueue(WriteOp::Set { path: "a".into(), value: Some(json!(1)) }).unwrap();
    tokio::task::yield_now().await;
    let mut results = Vec::new();
    for n in 0..4 {
        results.push(writer.enqueue(WriteOp::Set { path: "a".into(), value: Some(json!(n)) }));
    }
    assert!(results.contains(&Err(EnqueueError::Full)));

    store.gate.add_permits(16);
    writer.settled().await;
    assert!(store.writes.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn writer_stops_when_handles_drop() {
    let store = Arc::new(MemoryStore::new());
    let (writer, handle) = spawn_writer(store, 4);
    drop(writer);
    tokio::time::timeout(std::time::Duration::from_secs(1), handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn enqueue_after_stop_reports_closed() {
    let store = Arc::new(MemoryStore::new());
    let (writer, handle) = spawn_writer(store, 4);
    handle.abort();
    let _ = handle.await;
    let result = writer.enqueue(WriteOp::Set { path: "a".into(), value: None });
    assert_eq!(result, Err(EnqueueError::Closed));
}
