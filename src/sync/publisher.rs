//! Outbound half of stroke sync: create immediately, grow at a bounded rate.
//!
//! DESIGN
//! ======
//! The publisher keeps the full outbound record of the stroke being drawn.
//! `begin` mints a key and queues the single-point record at once, so peers
//! see a stroke appear the moment it starts. Growth is folded into the
//! outbound record and written through a [`Coalescer`]: at most one write per
//! interval, always carrying the latest full record. `finish` writes whatever
//! is still pending.
//!
//! A write that cannot be queued leaves the record dirty; the next flush
//! carries it. The capture session's local point buffer may be trimmed, but
//! the outbound record never is.

#[cfg(test)]
#[path = "publisher_test.rs"]
mod publisher_test;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::capture::StrokeGrowth;
use crate::error::ErrorCode;
use crate::rate_limit::Coalescer;
use crate::stroke::{Stroke, StrokeCollection, StrokeKey, StrokeOp};
use crate::sync::store::{RemoteStore, StoreError};
use crate::sync::writer::{EnqueueError, StoreWriter, WriteOp};

#[derive(Debug, Clone)]
struct Outbound {
    key: StrokeKey,
    stroke: Stroke,
}

pub struct SyncPublisher {
    store: Arc<dyn RemoteStore>,
    writer: StoreWriter,
    lines_path: String,
    coalescer: Coalescer,
    active: Option<Outbound>,
}

impl SyncPublisher {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, writer: StoreWriter, lines_path: String, interval: Duration) -> Self {
        Self { store, writer, lines_path, coalescer: Coalescer::new(interval), active: None }
    }

    #[must_use]
    pub fn lines_path(&self) -> &str {
        &self.lines_path
    }

    /// Key of the stroke being published, if any.
    #[must_use]
    pub fn active_key(&self) -> Option<&StrokeKey> {
        self.active.as_ref().map(|a| &a.key)
    }

    /// Outbound record of the stroke being published, if any.
    #[must_use]
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref().map(|a| &a.stroke)
    }

    /// Start publishing `stroke` under a new key and queue its first write now.
    pub fn begin(&mut self, stroke: Stroke, now: Instant) -> StrokeKey {
        if self.active.is_some() {
            self.finish(now);
        }
        let key = self.store.append_key(&self.lines_path);
        self.coalescer.reset();
        self.active = Some(Outbound { key: key.clone(), stroke });
        self.coalescer.mark_dirty();
        self.flush(now);
        info!(key = %key, "stroke started");
        key
    }

    /// Fold `growth` into the outbound record. Returns `true` if a write was queued.
    pub fn grow(&mut self, growth: &StrokeGrowth, now: Instant) -> bool {
        let Some(active) = self.active.as_mut() else {
            debug!("growth without an active stroke; ignoring");
            return false;
        };
        active.stroke.points.extend_from_slice(&growth.points);
        active.stroke.stroke_width = growth.stroke_width;
        active.stroke.opacity = growth.opacity;
        self.coalescer.mark_dirty();
        self.tick(now)
    }

    /// Write the pending record if the interval has elapsed. Returns `true` if
    /// a write was queued.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.coalescer.should_flush_at(now) {
            return false;
        }
        self.flush(now)
    }

    /// Time until a pending write becomes due, for the host's timer.
    #[must_use]
    pub fn next_flush_in(&self, now: Instant) -> Option<Duration> {
        self.active.as_ref()?;
        self.coalescer.remaining_at(now)
    }

    /// Write any pending state and stop publishing the active stroke.
    pub fn finish(&mut self, now: Instant) -> Option<StrokeKey> {
        if self.coalescer.is_dirty() {
            self.flush(now);
        }
        let outbound = self.active.take()?;
        self.coalescer.reset();
        info!(key = %outbound.key, points = outbound.stroke.point_count(), "stroke finished");
        Some(outbound.key)
    }

    /// Wait until every write queued so far has reached the store.
    pub async fn settled(&self) {
        self.writer.settled().await;
    }

    fn flush(&mut self, now: Instant) -> bool {
        let Some(active) = &self.active else {
            return false;
        };
        let value = match serde_json::to_value(&active.stroke) {
            Ok(value) => value,
            Err(e) => {
                let e = StoreError::from(e);
                warn!(error = %e, code = e.error_code(), key = %active.key, "cannot encode stroke");
                return false;
            }
        };
        let path = format!("{}/{}", self.lines_path, active.key);
        match self.writer.enqueue(WriteOp::Set { path, value: Some(value) }) {
            Ok(()) => {
                self.coalescer.record_flush_at(now);
                true
            }
            Err(_) => false,
        }
    }

    // --- Whole-room operations ---

    /// Delete every stroke owned by `owner` in one multi-path update.
    /// Returns the number of strokes deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update could not be queued.
    pub fn clear_mine(&mut self, owner: &str, collection: &StrokeCollection) -> Result<usize, StoreError> {
        let ops: Vec<StrokeOp> = collection.keys_owned_by(owner).cloned().map(StrokeOp::Delete).collect();
        if self.active.as_ref().is_some_and(|a| a.stroke.is_owned_by(owner)) {
            self.active = None;
            self.coalescer.reset();
        }
        self.apply(&ops)?;
        info!(owner, count = ops.len(), "cleared own strokes");
        Ok(ops.len())
    }

    /// Delete every stroke in the room.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write could not be queued.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.active = None;
        self.coalescer.reset();
        self.enqueue(WriteOp::Set { path: self.lines_path.clone(), value: None })?;
        info!(path = %self.lines_path, "cleared room");
        Ok(())
    }

    /// Queue keyed changes as one atomic multi-path update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a stroke cannot be encoded or the update
    /// could not be queued.
    pub fn apply(&self, ops: &[StrokeOp]) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut children: Vec<(String, Option<Value>)> = Vec::with_capacity(ops.len());
        for op in ops {
            let value = match op {
                StrokeOp::Upsert(_, stroke) => Some(serde_json::to_value(stroke)?),
                StrokeOp::Delete(_) => None,
            };
            children.push((op.key().to_string(), value));
        }
        self.enqueue(WriteOp::Update { path: self.lines_path.clone(), children })
    }

    fn enqueue(&self, op: WriteOp) -> Result<(), StoreError> {
        self.writer.enqueue(op).map_err(|e| match e {
            EnqueueError::Full => {
                StoreError::Rejected { path: self.lines_path.clone(), reason: "write queue full".into() }
            }
            EnqueueError::Closed => StoreError::Closed,
        })
    }
}
