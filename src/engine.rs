//! Engine core: input, camera, merged strokes, and history for one client.
//!
//! `EngineCore` is synchronous and store-agnostic. Handlers return
//! [`Action`]s and the host decides what to publish; remote state comes back
//! in through [`EngineCore::apply_remote`].
//!
//! The stroke being drawn is rendered from the capture session, on top of
//! the merged collection, so it shows without waiting for the store echo.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use crate::camera::{Camera, Point, Rect};
use crate::capture::{CaptureEvent, CaptureSession, StrokeGrowth};
use crate::config::SyncConfig;
use crate::hit;
use crate::history::{History, UndoPlan};
use crate::input::{Modifiers, PointerSample, Shortcut};
use crate::profile::ToolSettings;
use crate::render::{CullMode, RenderStroke, Viewport, visible_with_local};
use crate::stroke::{Stroke, StrokeCollection, StrokeKey};

/// Stands in for the store key until the host reports it.
static UNKEYED: StrokeKey = StrokeKey(String::new());

/// Something the host must act on.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Publish this new stroke now.
    StrokeStarted(Stroke),
    /// Fold this growth into the stroke being published.
    StrokeGrew(StrokeGrowth),
    /// The stroke being published is complete.
    StrokeFinished,
    /// Strokes inside the selection rectangle.
    SelectionChanged(Vec<StrokeKey>),
    UndoRequested,
    RedoRequested,
    RenderNeeded,
}

/// Core engine state, independent of any render surface.
pub struct EngineCore {
    pub collection: StrokeCollection,
    pub camera: Camera,
    pub viewport: Viewport,
    pub capture: CaptureSession,
    pub history: History,
    pub settings: ToolSettings,
    /// Display name used as `ownerId` of new strokes.
    pub user: String,
    pub selection: Vec<StrokeKey>,
    /// Selection rectangle being dragged, in world space.
    pub selection_rect: Option<Rect>,
    /// Store key of the stroke being drawn.
    local_key: Option<StrokeKey>,
    stroke_cap: usize,
    cull_margin_px: f64,
    cull_mode: CullMode,
}

impl EngineCore {
    #[must_use]
    pub fn new(user: &str, config: &SyncConfig) -> Self {
        Self {
            collection: StrokeCollection::new(),
            camera: Camera::default(),
            viewport: Viewport::new(0.0, 0.0),
            capture: CaptureSession::new(config.capture()),
            history: History::new(config.history_limit),
            settings: ToolSettings::default(),
            user: user.to_owned(),
            selection: Vec::new(),
            selection_rect: None,
            local_key: None,
            stroke_cap: config.stroke_cap,
            cull_margin_px: config.cull_margin_px,
            cull_mode: config.cull_mode,
        }
    }

    // --- Data inputs ---

    /// Replace the merged collection with a remote delivery and record it in history.
    pub fn apply_remote(&mut self, mut collection: StrokeCollection) -> Vec<Action> {
        collection.enforce_cap(self.stroke_cap);
        self.history.observe(&collection);
        let before = self.selection.len();
        self.selection.retain(|key| collection.get(key).is_some());
        let selection_shrank = self.selection.len() != before;
        self.collection = collection;

        let mut actions = vec![Action::RenderNeeded];
        if selection_shrank {
            actions.push(Action::SelectionChanged(self.selection.clone()));
        }
        actions
    }

    /// Tool configuration for the next stroke.
    pub fn set_tool_settings(&mut self, settings: ToolSettings) {
        self.settings = settings;
    }

    /// Key the stroke being drawn was published under. The merged record with
    /// this key is hidden while the local copy is drawn.
    pub fn set_local_key(&mut self, key: StrokeKey) {
        self.local_key = Some(key);
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, sample: &PointerSample) -> Vec<Action> {
        self.keep_local_stroke();
        let world = self.camera.screen_to_world(sample.screen);
        let events = self.capture.pointer_down(sample, world, &self.settings, &self.user);
        events.into_iter().filter_map(|e| self.handle_event(e)).collect()
    }

    pub fn on_pointer_move(&mut self, sample: &PointerSample) -> Vec<Action> {
        let world = self.camera.screen_to_world(sample.screen);
        self.capture.pointer_move(sample, world).and_then(|e| self.handle_event(e)).into_iter().collect()
    }

    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        self.keep_local_stroke();
        self.capture.pointer_up().and_then(|e| self.handle_event(e)).into_iter().collect()
    }

    /// Leaving the surface ends the gesture exactly like a release.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.on_pointer_up()
    }

    /// Wheel zoom around the pointer.
    pub fn on_wheel(&mut self, screen: Point, delta_y: f64) -> Vec<Action> {
        if delta_y == 0.0 {
            return Vec::new();
        }
        self.camera.zoom_at(screen, delta_y);
        vec![Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: &str, modifiers: Modifiers) -> Vec<Action> {
        match Shortcut::from_key(key, modifiers) {
            Some(Shortcut::Undo) if self.can_undo() => vec![Action::UndoRequested],
            Some(Shortcut::Redo) if self.can_redo() => vec![Action::RedoRequested],
            _ => Vec::new(),
        }
    }

    /// Move a finished keyed stroke into the merged collection until the next
    /// remote delivery replaces it.
    fn keep_local_stroke(&mut self) {
        let Some(active) = self.capture.active() else {
            return;
        };
        if let Some(key) = self.local_key.take() {
            self.collection.insert(key, active.stroke.clone());
        }
    }

    fn handle_event(&mut self, event: CaptureEvent) -> Option<Action> {
        match event {
            CaptureEvent::Started(stroke) => {
                self.local_key = None;
                Some(Action::StrokeStarted(stroke))
            }
            CaptureEvent::Grew(growth) => Some(Action::StrokeGrew(growth)),
            CaptureEvent::Finished => Some(Action::StrokeFinished),
            CaptureEvent::Panned { dx, dy } => {
                self.camera.pan_by(dx, dy);
                Some(Action::RenderNeeded)
            }
            CaptureEvent::SelectionMoved(rect) => {
                self.selection_rect = Some(rect);
                Some(Action::RenderNeeded)
            }
            CaptureEvent::Selected(rect) => {
                self.selection_rect = None;
                self.selection = hit::strokes_in_rect(&self.collection, &rect);
                Some(Action::SelectionChanged(self.selection.clone()))
            }
        }
    }

    // --- View controls ---

    pub fn zoom_in(&mut self) {
        self.camera.zoom_in(self.viewport.width, self.viewport.height);
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_out(self.viewport.width, self.viewport.height);
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
    }

    // --- History ---

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo(&self.user)
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo(&self.user)
    }

    /// Step back through history for the local user. The merged collection
    /// becomes the plan's result; the host publishes the plan's ops.
    pub fn undo(&mut self) -> Option<UndoPlan> {
        let plan = self.history.undo(&self.user, &self.collection)?;
        self.collection = plan.result.clone();
        Some(plan)
    }

    /// Step forward through history for the local user.
    pub fn redo(&mut self) -> Option<UndoPlan> {
        let plan = self.history.redo(&self.user, &self.collection)?;
        self.collection = plan.result.clone();
        Some(plan)
    }

    // --- Queries ---

    /// Strokes to draw for the current camera and viewport, the stroke being
    /// drawn last.
    #[must_use]
    pub fn visible(&self) -> Vec<RenderStroke<'_>> {
        let local = self.capture.active().map(|active| (self.local_key.as_ref().unwrap_or(&UNKEYED), &active.stroke));
        visible_with_local(&self.collection, local, &self.camera, self.viewport, self.cull_margin_px, self.cull_mode)
    }

    #[must_use]
    pub fn stroke(&self, key: &StrokeKey) -> Option<&Stroke> {
        self.collection.get(key)
    }
}
