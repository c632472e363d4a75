use std::time::Duration;

use serde_json::{Value, json};

use super::*;
use crate::stroke::StrokeKey;
use crate::sync::store::MemoryStore;

const LINES: &str = "rooms/r1/lines";

fn record(owner: &str, x: f64) -> Value {
    json!({"tool": "pen", "points": [x, 0.0], "strokeWidth": 2.0, "strokeColor": "#000000", "ownerId": owner})
}

async fn recv(rx: &mut mpsc::Receiver<StrokeCollection>) -> Option<StrokeCollection> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap_or(None)
}

#[tokio::test]
async fn first_delivery_is_current_state() {
    let store = Arc::new(MemoryStore::new());
    store.write(&format!("{LINES}/k1"), Some(record("A", 1.0))).await.unwrap();
    let (mut rx, _handle) = spawn_listener(store.clone(), LINES.to_owned(), 1000);
    let first = recv(&mut rx).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first.get(&StrokeKey::from("k1")).map(|s| s.owner_id.as_str()), Some("A"));
}

#[tokio::test]
async fn empty_room_delivers_empty_collection() {
    let store = Arc::new(MemoryStore::new());
    let (mut rx, _handle) = spawn_listener(store, LINES.to_owned(), 1000);
    assert!(recv(&mut rx).await.unwrap().is_empty());
}

#[tokio::test]
async fn later_writes_replace_collection() {
    let store = Arc::new(MemoryStore::new());
    let (mut rx, _handle) = spawn_listener(store.clone(), LINES.to_owned(), 1000);
    recv(&mut rx).await;

    store.write(&format!("{LINES}/k1"), Some(record("A", 1.0))).await.unwrap();
    assert_eq!(recv(&mut rx).await.unwrap().len(), 1);

    store.write(LINES, None).await.unwrap();
    assert!(recv(&mut rx).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_records_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    store.write(&format!("{LINES}/good"), Some(record("A", 1.0))).await.unwrap();
    store.write(&format!("{LINES}/bad"), Some(json!({"tool": 3}))).await.unwrap();
    let (mut rx, _handle) = spawn_listener(store, LINES.to_owned(), 1000);
    let c = recv(&mut rx).await.unwrap();
    assert_eq!(c.len(), 1);
    assert!(c.get(&StrokeKey::from("good")).is_some());
}

#[tokio::test]
async fn cap_is_enforced_on_delivery() {
    let store = Arc::new(MemoryStore::new());
    let children = (0..12).map(|n| (format!("k{n:02}"), Some(record("A", f64::from(n))))).collect();
    store.update(LINES, children).await.unwrap();
    let (mut rx, _handle) = spawn_listener(store, LINES.to_owned(), 10);
    let c = recv(&mut rx).await.unwrap();
    assert_eq!(c.len(), 10);
    assert!(c.get(&StrokeKey::from("k01")).is_none());
    assert!(c.get(&StrokeKey::from("k02")).is_some());
}

#[tokio::test]
async fn listener_ends_when_store_closes() {
    let store = Arc::new(MemoryStore::new());
    let (mut rx, handle) = spawn_listener(store.clone(), LINES.to_owned(), 1000);
    recv(&mut rx).await;
    store.close();
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(recv(&mut rx).await.is_none());
}

#[tokio::test]
async fn subscribe_failure_ends_listener() {
    let store = Arc::new(MemoryStore::new());
    store.close();
    let (mut rx, handle) = spawn_listener(store, LINES.to_owned(), 1000);
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(recv(&mut rx).await.is_none());
}
