//! Room client: one user's engine wired to a shared store.
//!
//! DESIGN
//! ======
//! The client owns the [`EngineCore`], the [`SyncPublisher`] and the receiving
//! end of the merge listener. Pointer and key handlers run synchronously: they
//! feed the engine, turn its actions into publisher calls, and return the
//! actions for the render surface. Nothing on the input path awaits; writes
//! go to the background writer and remote state arrives through
//! [`RoomClient::sync_remote`] or [`RoomClient::next_remote`].

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::engine::{Action, EngineCore};
use crate::error::ErrorCode;
use crate::input::{Modifiers, PointerSample};
use crate::stroke::StrokeCollection;
use crate::sync::{RemoteStore, StoreError, SyncPublisher, room_lines_path, spawn_listener, spawn_writer};

pub struct RoomClient {
    engine: EngineCore,
    publisher: SyncPublisher,
    merged: mpsc::Receiver<StrokeCollection>,
    listener_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl RoomClient {
    /// Join `room` as `user`: start the writer and the merge listener.
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn join(store: Arc<dyn RemoteStore>, room: &str, user: &str, config: &SyncConfig) -> Self {
        let lines_path = room_lines_path(room);
        let (writer, writer_task) = spawn_writer(store.clone(), config.write_queue_capacity);
        let (merged, listener_task) = spawn_listener(store.clone(), lines_path.clone(), config.stroke_cap);
        let publisher = SyncPublisher::new(store, writer, lines_path, config.publish_interval);
        info!(room, user, "joined room");
        Self { engine: EngineCore::new(user, config), publisher, merged, listener_task, writer_task }
    }

    #[must_use]
    pub fn engine(&self) -> &EngineCore {
        &self.engine
    }

    /// Mutable engine access for tool settings, viewport and camera controls.
    pub fn engine_mut(&mut self) -> &mut EngineCore {
        &mut self.engine
    }

    #[must_use]
    pub fn publisher(&self) -> &SyncPublisher {
        &self.publisher
    }

    // --- Input ---

    pub fn pointer_down(&mut self, sample: &PointerSample, now: Instant) -> Vec<Action> {
        let actions = self.engine.on_pointer_down(sample);
        self.dispatch(&actions, now);
        actions
    }

    pub fn pointer_move(&mut self, sample: &PointerSample, now: Instant) -> Vec<Action> {
        let actions = self.engine.on_pointer_move(sample);
        self.dispatch(&actions, now);
        actions
    }

    pub fn pointer_up(&mut self, now: Instant) -> Vec<Action> {
        let actions = self.engine.on_pointer_up();
        self.dispatch(&actions, now);
        actions
    }

    pub fn pointer_leave(&mut self, now: Instant) -> Vec<Action> {
        let actions = self.engine.on_pointer_leave();
        self.dispatch(&actions, now);
        actions
    }

    /// Keyboard input. Undo and redo shortcuts are carried out here.
    pub fn key_down(&mut self, key: &str, modifiers: Modifiers, now: Instant) -> Vec<Action> {
        let actions = self.engine.on_key_down(key, modifiers);
        self.dispatch(&actions, now);
        actions
    }

    fn dispatch(&mut self, actions: &[Action], now: Instant) {
        for action in actions {
            match action {
                Action::StrokeStarted(stroke) => {
                    let key = self.publisher.begin(stroke.clone(), now);
                    self.engine.set_local_key(key);
                }
                Action::StrokeGrew(growth) => {
                    self.publisher.grow(growth, now);
                }
                Action::StrokeFinished => {
                    self.publisher.finish(now);
                }
                Action::UndoRequested => {
                    if let Err(e) = self.undo() {
                        warn!(error = %e, code = e.error_code(), "undo not published");
                    }
                }
                Action::RedoRequested => {
                    if let Err(e) = self.redo() {
                        warn!(error = %e, code = e.error_code(), "redo not published");
                    }
                }
                Action::SelectionChanged(_) | Action::RenderNeeded => {}
            }
        }
    }

    // --- Timers ---

    /// Flush pending growth once the publish interval has elapsed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.publisher.tick(now)
    }

    /// When the host should call [`RoomClient::tick`] next.
    #[must_use]
    pub fn next_flush_in(&self, now: Instant) -> Option<Duration> {
        self.publisher.next_flush_in(now)
    }

    // --- Room operations ---

    /// Undo the local user's last change. Returns `false` when not permitted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the changes could not be queued.
    pub fn undo(&mut self) -> Result<bool, StoreError> {
        let Some(plan) = self.engine.undo() else {
            return Ok(false);
        };
        self.publisher.apply(&plan.ops)?;
        info!(user = %self.engine.user, ops = plan.ops.len(), "undo published");
        Ok(true)
    }

    /// Redo the local user's next change. Returns `false` when not permitted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the changes could not be queued.
    pub fn redo(&mut self) -> Result<bool, StoreError> {
        let Some(plan) = self.engine.redo() else {
            return Ok(false);
        };
        self.publisher.apply(&plan.ops)?;
        info!(user = %self.engine.user, ops = plan.ops.len(), "redo published");
        Ok(true)
    }

    /// Delete the local user's strokes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update could not be queued.
    pub fn clear_mine(&mut self) -> Result<usize, StoreError> {
        self.publisher.clear_mine(&self.engine.user, &self.engine.collection)
    }

    /// Delete every stroke in the room.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write could not be queued.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.publisher.clear_all()
    }

    // --- Remote state ---

    /// Apply every merged collection already delivered. Returns how many were applied.
    pub fn sync_remote(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(collection) = self.merged.try_recv() {
            self.engine.apply_remote(collection);
            applied += 1;
        }
        applied
    }

    /// Wait for the next merged collection and apply it. `None` once the
    /// listener has stopped.
    pub async fn next_remote(&mut self) -> Option<Vec<Action>> {
        let collection = self.merged.recv().await?;
        Some(self.engine.apply_remote(collection))
    }

    /// Wait until every write queued so far has reached the store.
    pub async fn settled(&self) {
        self.publisher.settled().await;
    }

    /// Finish any active stroke, drain queued writes and stop the listener.
    pub async fn leave(mut self) {
        self.publisher.finish(Instant::now());
        self.publisher.settled().await;
        self.listener_task.abort();
        match self.listener_task.await {
            Err(e) if !e.is_cancelled() => warn!(error = %e, "merge listener ended abnormally"),
            _ => {}
        }
        drop(self.publisher);
        if let Err(e) = self.writer_task.await {
            warn!(error = %e, "store writer ended abnormally");
        }
        info!(user = %self.engine.user, "left room");
    }
}
