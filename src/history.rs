//! Undo/redo over a bounded timeline of collection snapshots.
//!
//! DESIGN
//! ======
//! The timeline is global: every change to the merged collection, local or
//! remote, becomes a snapshot. Undo and redo are gated per user, though. A
//! user may only step to a neighbour snapshot when the snapshot being left
//! (undo) or entered (redo) holds one of their strokes.
//!
//! Stepping never overwrites the room wholesale. [`History::undo`] and
//! [`History::redo`] return an [`UndoPlan`]: the changes to the acting user's
//! own strokes that turn the live collection into the target snapshot, as far
//! as that user is concerned. Other users' strokes are left as they are live.
//!
//! A change that keeps the key set (points appended to strokes that already
//! exist) replaces the current snapshot instead of adding one, so a whole
//! gesture is a single undo step.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use tracing::debug;

use crate::consts::DEFAULT_HISTORY_LIMIT;
use crate::stroke::{StrokeCollection, StrokeOp};

/// Result of a permitted undo or redo.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoPlan {
    /// Keyed writes to publish, limited to the acting user's strokes.
    pub ops: Vec<StrokeOp>,
    /// The live collection with `ops` applied.
    pub result: StrokeCollection,
}

#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<StrokeCollection>,
    index: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// An empty timeline holding at most `limit` snapshots.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { snapshots: vec![StrokeCollection::new()], index: 0, limit: limit.max(1) }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing has been recorded beyond the initial empty snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.len() <= 1
    }

    /// Snapshot at the current index.
    #[must_use]
    pub fn current(&self) -> &StrokeCollection {
        &self.snapshots[self.index]
    }

    /// Record the merged collection. Returns `false` if it equals the current
    /// snapshot and nothing changed.
    pub fn observe(&mut self, collection: &StrokeCollection) -> bool {
        if *collection == self.snapshots[self.index] {
            return false;
        }
        self.snapshots.truncate(self.index + 1);

        if collection.keys() == self.snapshots[self.index].keys() {
            self.snapshots[self.index] = collection.clone();
            return true;
        }

        self.snapshots.push(collection.clone());
        self.index += 1;
        if self.snapshots.len() > self.limit {
            self.snapshots.remove(0);
            self.index -= 1;
            debug!(limit = self.limit, "history full; evicted oldest snapshot");
        }
        true
    }

    /// Whether `user` may step back: the current snapshot holds one of their strokes.
    #[must_use]
    pub fn can_undo(&self, user: &str) -> bool {
        self.index > 0 && self.snapshots[self.index].has_owner(user)
    }

    /// Whether `user` may step forward: the next snapshot holds one of their strokes.
    #[must_use]
    pub fn can_redo(&self, user: &str) -> bool {
        self.index + 1 < self.snapshots.len() && self.snapshots[self.index + 1].has_owner(user)
    }

    /// Step back for `user`. `None` when not permitted.
    pub fn undo(&mut self, user: &str, live: &StrokeCollection) -> Option<UndoPlan> {
        if !self.can_undo(user) {
            return None;
        }
        Some(self.step_to(self.index - 1, user, live))
    }

    /// Step forward for `user`. `None` when not permitted.
    pub fn redo(&mut self, user: &str, live: &StrokeCollection) -> Option<UndoPlan> {
        if !self.can_redo(user) {
            return None;
        }
        Some(self.step_to(self.index + 1, user, live))
    }

    fn step_to(&mut self, target: usize, user: &str, live: &StrokeCollection) -> UndoPlan {
        let ops = scoped_diff(user, live, &self.snapshots[target]);
        let mut result = live.clone();
        result.apply(&ops);
        self.index = target;
        self.snapshots[target] = result.clone();
        debug!(user, index = target, ops = ops.len(), "history step");
        UndoPlan { ops, result }
    }
}

/// Writes that make `user`'s strokes in `live` match those in `target`.
#[must_use]
pub fn scoped_diff(user: &str, live: &StrokeCollection, target: &StrokeCollection) -> Vec<StrokeOp> {
    let mut ops = Vec::new();
    for key in live.keys_owned_by(user) {
        if target.get(key).is_none() {
            ops.push(StrokeOp::Delete(key.clone()));
        }
    }
    for (key, stroke) in target.iter().filter(|(_, s)| s.is_owned_by(user)) {
        if live.get(key) != Some(stroke) {
            ops.push(StrokeOp::Upsert(key.clone(), stroke.clone()));
        }
    }
    ops
}
