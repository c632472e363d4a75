//! Remote store interface and an in-process implementation.
//!
//! DESIGN
//! ======
//! The real-time database is an ordered JSON tree addressed by `/`-separated
//! paths. Clients need four operations: subscribe to a path, write a path,
//! write several children of a path atomically, and mint a new ordered key.
//! [`RemoteStore`] is that seam; [`MemoryStore`] implements it over a
//! `serde_json::Value` tree and backs the tests and the demo binary.
//!
//! Subscriptions are `tokio::sync::watch` channels. A slow subscriber only
//! ever sees the latest value at its path, never a backlog.
//!
//! Keys are minted client-side: 8 characters of millisecond timestamp and 12
//! random characters from an ASCII-ordered alphabet, so keys sort by creation
//! time and stay unique without a round trip.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, watch};
use tracing::debug;
use uuid::Uuid;

use crate::stroke::StrokeKey;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),
    #[error("store is closed")]
    Closed,
    #[error("serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("write rejected at {path}: {reason}")]
    Rejected { path: String, reason: String },
}

impl crate::error::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "E_STORE_INVALID_PATH",
            Self::Closed => "E_STORE_CLOSED",
            Self::Serialize(_) => "E_STORE_SERIALIZE",
            Self::Rejected { .. } => "E_STORE_REJECTED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

// =============================================================================
// PATHS
// =============================================================================

/// Path holding the strokes of `room_id`.
#[must_use]
pub fn room_lines_path(room_id: &str) -> String {
    format!("rooms/{room_id}/lines")
}

/// Split a path into segments, rejecting empty paths and reserved characters.
///
/// # Errors
///
/// Returns [`StoreError::InvalidPath`] if the path has no segments or a
/// segment contains `.`, `#`, `$`, `[` or `]`.
pub fn split_path(path: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(StoreError::InvalidPath(path.to_owned()));
    }
    if segments.iter().any(|s| s.contains(['.', '#', '$', '[', ']'])) {
        return Err(StoreError::InvalidPath(path.to_owned()));
    }
    Ok(segments)
}

// =============================================================================
// TRAIT
// =============================================================================

/// The operations the stroke pipeline needs from the real-time database.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Watch `path`. The subscription yields the current value first and then
    /// every later value, until dropped or the store closes.
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;

    /// Replace the value at `path`. `None` deletes it.
    async fn write(&self, path: &str, value: Option<Value>) -> Result<(), StoreError>;

    /// Write several children of `path` in one atomic step. Child paths are
    /// relative and may contain `/`. `None` deletes a child.
    async fn update(&self, path: &str, children: Vec<(String, Option<Value>)>) -> Result<(), StoreError>;

    /// A new unique key under `path`, ordered after every key minted before it.
    fn append_key(&self, path: &str) -> StrokeKey;
}

/// Live view of one path.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    pending: Option<Value>,
    rx: watch::Receiver<Value>,
}

impl Subscription {
    /// Subscription that yields `initial` and then whatever `rx` publishes.
    #[must_use]
    pub fn new(initial: Value, rx: watch::Receiver<Value>) -> Self {
        Self { id: Uuid::new_v4(), pending: Some(initial), rx }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The next value at the path. `None` once the store side is gone.
    pub async fn next(&mut self) -> Option<Value> {
        if let Some(value) = self.pending.take() {
            return Some(value);
        }
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}

// =============================================================================
// KEY GENERATION
// =============================================================================

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Mints time-ordered keys. Keys minted in the same millisecond increment the
/// random suffix so ordering still holds.
#[derive(Debug, Default)]
pub struct PushKeyGenerator {
    state: Mutex<PushKeyState>,
}

#[derive(Debug, Default)]
struct PushKeyState {
    last_ms: u64,
    last_rand: [u8; 12],
}

impl PushKeyGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_key(&self) -> StrokeKey {
        self.next_key_at(now_ms())
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn next_key_at(&self, now_ms: u64) -> StrokeKey {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = now_ms.max(state.last_ms);

        if now == state.last_ms {
            increment(&mut state.last_rand);
        } else {
            let mut rng = rand::rng();
            for slot in &mut state.last_rand {
                *slot = rng.random_range(0..64);
            }
        }
        state.last_ms = now;

        let mut key = String::with_capacity(20);
        let mut ts = now;
        let mut ts_chars = [0u8; 8];
        for slot in ts_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(ts % 64) as usize];
            ts /= 64;
        }
        key.extend(ts_chars.iter().map(|&c| char::from(c)));
        key.extend(state.last_rand.iter().map(|&r| char::from(PUSH_CHARS[usize::from(r)])));
        StrokeKey(key)
    }
}

fn increment(digits: &mut [u8; 12]) {
    for d in digits.iter_mut().rev() {
        if *d < 63 {
            *d += 1;
            return;
        }
        *d = 0;
    }
}

fn now_ms() -> u64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// MEMORY STORE
// =============================================================================

struct Watcher {
    path: Vec<String>,
    tx: watch::Sender<Value>,
}

/// In-process [`RemoteStore`] over a JSON tree.
pub struct MemoryStore {
    tree: RwLock<Value>,
    watchers: Mutex<HashMap<Uuid, Watcher>>,
    keys: PushKeyGenerator,
    closed: AtomicBool,
    read_only: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: RwLock::new(Value::Object(Map::new())),
            watchers: Mutex::new(HashMap::new()),
            keys: PushKeyGenerator::new(),
            closed: AtomicBool::new(false),
            read_only: AtomicBool::new(false),
        }
    }

    /// Current value at `path`, `Null` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] for a malformed path.
    pub async fn get(&self, path: &str) -> Result<Value, StoreError> {
        let segments = split_path(path)?;
        let tree = self.tree.read().await;
        Ok(value_at(&tree, &segments).cloned().unwrap_or(Value::Null))
    }

    /// Refuse (or accept again) all writes, as a rules failure would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Close the store: writes fail and every subscription ends.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.watchers.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut watchers = self.watchers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        watchers.retain(|_, w| !w.tx.is_closed());
        watchers.len()
    }

    fn check_writable(&self, path: &str) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected { path: path.to_owned(), reason: "store is read-only".into() });
        }
        Ok(())
    }

    /// Push the new value to every watcher whose path overlaps a changed path.
    fn notify(&self, tree: &Value, changed: &[Vec<&str>]) {
        let mut watchers = self.watchers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        watchers.retain(|_, w| !w.tx.is_closed());
        for watcher in watchers.values() {
            if !changed.iter().any(|c| overlaps(&watcher.path, c)) {
                continue;
            }
            let segments: Vec<&str> = watcher.path.iter().map(String::as_str).collect();
            let value = value_at(tree, &segments).cloned().unwrap_or(Value::Null);
            watcher.tx.send_if_modified(|current| {
                if *current == value {
                    return false;
                }
                *current = value;
                true
            });
        }
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemoryStore {
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        let segments = split_path(path)?;
        let tree = self.tree.read().await;
        let initial = value_at(&tree, &segments).cloned().unwrap_or(Value::Null);
        let (tx, rx) = watch::channel(initial.clone());
        let subscription = Subscription::new(initial, rx);
        let owned = segments.iter().map(|s| (*s).to_owned()).collect();
        self.watchers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(subscription.id(), Watcher { path: owned, tx });
        debug!(path, id = %subscription.id(), "subscribed");
        Ok(subscription)
    }

    async fn write(&self, path: &str, value: Option<Value>) -> Result<(), StoreError> {
        let segments = split_path(path)?;
        self.check_writable(path)?;
        let mut tree = self.tree.write().await;
        set_at(&mut tree, &segments, value);
        self.notify(&tree, &[segments]);
        Ok(())
    }

    async fn update(&self, path: &str, children: Vec<(String, Option<Value>)>) -> Result<(), StoreError> {
        let base = split_path(path)?;
        let mut targets = Vec::with_capacity(children.len());
        for (child, value) in &children {
            let mut full = base.clone();
            full.extend(split_path(child)?);
            targets.push((full, value));
        }
        self.check_writable(path)?;

        let mut tree = self.tree.write().await;
        for (segments, value) in &targets {
            set_at(&mut tree, segments, (*value).clone());
        }
        let changed: Vec<Vec<&str>> = targets.into_iter().map(|(s, _)| s).collect();
        self.notify(&tree, &changed);
        Ok(())
    }

    fn append_key(&self, _path: &str) -> StrokeKey {
        self.keys.next_key()
    }
}

// =============================================================================
// TREE HELPERS
// =============================================================================

fn value_at<'a>(tree: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut node = tree;
    for segment in segments {
        node = node.as_object()?.get(*segment)?;
    }
    Some(node)
}

/// Set or delete the value at `segments`. Objects left empty by a delete are
/// removed too, so an empty subtree reads as `Null`.
fn set_at(node: &mut Value, segments: &[&str], value: Option<Value>) {
    let value = value.filter(|v| !is_empty_value(v));
    let Some((first, rest)) = segments.split_first() else {
        *node = value.unwrap_or_else(|| Value::Object(Map::new()));
        return;
    };

    if !node.is_object() {
        if value.is_none() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    if rest.is_empty() {
        match value {
            Some(v) => {
                map.insert((*first).to_owned(), v);
            }
            None => {
                map.remove(*first);
            }
        }
        return;
    }

    if value.is_none() && !map.contains_key(*first) {
        return;
    }
    let child = map.entry((*first).to_owned()).or_insert_with(|| Value::Object(Map::new()));
    set_at(child, rest, value);
    if is_empty_value(child) {
        map.remove(*first);
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Whether a change at `changed` can alter the value at `watched`.
fn overlaps(watched: &[String], changed: &[&str]) -> bool {
    watched.iter().zip(changed.iter()).all(|(a, b)| a == b)
}
