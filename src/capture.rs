//! Stroke capture: the gesture state machine between pointer-down and pointer-up.
//!
//! DESIGN
//! ======
//! [`CaptureState`] is the single source of truth for what the pointer is
//! doing. Each active variant carries the context it needs, so there are no
//! independent flags to fall out of sync. The session is synchronous and knows
//! nothing about the store: it emits [`CaptureEvent`]s and the engine host
//! decides what to publish.
//!
//! While drawing, every accepted move appends interpolated points and refines
//! the width. The session keeps a bounded local copy of the points; the
//! appended coordinates it emits are never trimmed, so the published record
//! stays complete.

#[cfg(test)]
#[path = "capture_test.rs"]
mod capture_test;

use crate::camera::{Point, Rect};
use crate::consts::{
    DEFAULT_INTERPOLATION_STEP, DEFAULT_MIN_SAMPLE_DISTANCE, DEFAULT_POINT_BUFFER_CAP, MAX_TILT_DEG,
    NON_PEN_PRESSURE_FACTOR, TILT_WIDTH_GAIN, WIDTH_SMOOTHING,
};
use crate::input::{Button, DeviceType, PointerSample, normalize};
use crate::profile::{Interaction, StrokeStyle, Tool, ToolSettings};
use crate::stroke::Stroke;

/// Sampling limits for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConfig {
    /// World-space distance below which a move is discarded.
    pub min_distance: f64,
    /// World-space spacing of interpolated points.
    pub interpolation_step: f64,
    /// Maximum coordinate values kept in the local working buffer.
    pub point_buffer_cap: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_distance: DEFAULT_MIN_SAMPLE_DISTANCE,
            interpolation_step: DEFAULT_INTERPOLATION_STEP,
            point_buffer_cap: DEFAULT_POINT_BUFFER_CAP,
        }
    }
}

/// Points and refined render parameters produced by one accepted move.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeGrowth {
    /// Newly appended `[x, y, ...]` coordinates, in order.
    pub points: Vec<f64>,
    pub stroke_width: f64,
    pub opacity: f64,
}

/// The stroke being authored.
#[derive(Debug, Clone)]
pub struct ActiveStroke {
    /// Local working copy. Its point buffer is bounded.
    pub stroke: Stroke,
    /// Style width before pressure, used as the base of width refinement.
    pub base_width: f64,
    pub base_opacity: f64,
    pub device: DeviceType,
    /// Last accepted world-space sample.
    pub last: Point,
}

/// Internal state for the capture state machine.
#[derive(Debug, Clone, Default)]
pub enum CaptureState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A stroke is being drawn.
    Drawing(ActiveStroke),
    /// The canvas is being dragged.
    Panning {
        /// Screen position of the previous event.
        last_screen: Point,
    },
    /// A selection rectangle is being dragged out, in world space.
    Selecting { anchor: Point, current: Point },
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// A stroke was created with its first point.
    Started(Stroke),
    /// The active stroke grew.
    Grew(StrokeGrowth),
    /// The active stroke is complete.
    Finished,
    /// The canvas moved by a screen-space delta.
    Panned { dx: f64, dy: f64 },
    /// The selection rectangle changed while dragging.
    SelectionMoved(Rect),
    /// The selection gesture ended with this world rectangle.
    Selected(Rect),
}

/// Gesture tracker for one client.
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    state: CaptureState,
    config: CaptureConfig,
}

impl CaptureSession {
    #[must_use]
    pub fn new(config: CaptureConfig) -> Self {
        Self { state: CaptureState::Idle, config }
    }

    #[must_use]
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, CaptureState::Idle)
    }

    /// The stroke being drawn, if any.
    #[must_use]
    pub fn active(&self) -> Option<&ActiveStroke> {
        match &self.state {
            CaptureState::Drawing(active) => Some(active),
            _ => None,
        }
    }

    /// Begin a gesture. `world` is the sample position in world space.
    ///
    /// Tool settings are read here only; later changes affect the next stroke.
    /// A pointer-down while a gesture is active finishes that gesture first.
    pub fn pointer_down(
        &mut self,
        sample: &PointerSample,
        world: Point,
        settings: &ToolSettings,
        user: &str,
    ) -> Vec<CaptureEvent> {
        let mut events = Vec::new();
        if !self.is_idle() {
            events.extend(self.pointer_up());
        }

        if is_pan_gesture(sample, settings) {
            self.state = CaptureState::Panning { last_screen: sample.screen };
            return events;
        }
        if settings.interaction == Interaction::Select {
            self.state = CaptureState::Selecting { anchor: world, current: world };
            return events;
        }

        let reading = normalize(sample);
        let style = StrokeStyle::build(Tool::from_name(&settings.tool), reading.device, settings);
        let stroke = Stroke::begin(&settings.tool, &style, reading.device, user, world, reading.pressure);
        events.push(CaptureEvent::Started(stroke.clone()));
        self.state = CaptureState::Drawing(ActiveStroke {
            stroke,
            base_width: style.width,
            base_opacity: style.opacity,
            device: reading.device,
            last: world,
        });
        events
    }

    /// Continue a gesture. Returns `None` when the sample is discarded or no
    /// gesture is active.
    pub fn pointer_move(&mut self, sample: &PointerSample, world: Point) -> Option<CaptureEvent> {
        let config = self.config;
        match &mut self.state {
            CaptureState::Idle => None,
            CaptureState::Panning { last_screen } => {
                let dx = sample.screen.x - last_screen.x;
                let dy = sample.screen.y - last_screen.y;
                *last_screen = sample.screen;
                Some(CaptureEvent::Panned { dx, dy })
            }
            CaptureState::Selecting { anchor, current } => {
                *current = world;
                Some(CaptureEvent::SelectionMoved(Rect::from_corners(*anchor, world)))
            }
            CaptureState::Drawing(active) => grow(active, sample, world, &config).map(CaptureEvent::Grew),
        }
    }

    /// End the gesture. Pointer-leave is handled the same way. The session is
    /// idle afterwards.
    pub fn pointer_up(&mut self) -> Option<CaptureEvent> {
        match std::mem::take(&mut self.state) {
            CaptureState::Idle | CaptureState::Panning { .. } => None,
            CaptureState::Drawing(_) => Some(CaptureEvent::Finished),
            CaptureState::Selecting { anchor, current } => Some(CaptureEvent::Selected(Rect::from_corners(anchor, current))),
        }
    }
}

fn is_pan_gesture(sample: &PointerSample, settings: &ToolSettings) -> bool {
    matches!(sample.button, Button::Secondary | Button::Middle)
        || sample.modifiers.command()
        || settings.interaction == Interaction::Pan
}

fn grow(active: &mut ActiveStroke, sample: &PointerSample, world: Point, config: &CaptureConfig) -> Option<StrokeGrowth> {
    let distance = active.last.distance_to(world);
    if distance < config.min_distance {
        return None;
    }

    let points = interpolate(active.last, world, distance, config.interpolation_step);
    active.stroke.points.extend_from_slice(&points);
    trim_front(&mut active.stroke.points, config.point_buffer_cap);
    active.last = world;

    let reading = normalize(sample);
    let is_pen = active.device == DeviceType::Pen;
    let speed_factor = (1.0 / (distance + 1.0)).min(1.0);
    let pressure_factor = if is_pen { reading.pressure } else { NON_PEN_PRESSURE_FACTOR };
    let tilt_factor = if is_pen { 1.0 + TILT_WIDTH_GAIN * (sample.tilt_magnitude() / MAX_TILT_DEG).min(1.0) } else { 1.0 };
    let target = active.base_width * pressure_factor * (0.8 + speed_factor * 0.2) * tilt_factor;
    active.stroke.stroke_width = active.stroke.stroke_width * (1.0 - WIDTH_SMOOTHING) + target * WIDTH_SMOOTHING;

    if is_pen {
        active.stroke.opacity = (active.base_opacity * (0.6 + 0.4 * reading.pressure)).clamp(0.0, 1.0);
    }

    Some(StrokeGrowth { points, stroke_width: active.stroke.stroke_width, opacity: active.stroke.opacity })
}

/// Points every `step` from `from` (exclusive) to `to` (inclusive).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn interpolate(from: Point, to: Point, distance: f64, step: f64) -> Vec<f64> {
    let steps = if step > 0.0 { (distance / step).ceil().max(1.0) as usize } else { 1 };
    let mut out = Vec::with_capacity(steps * 2);
    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        out.push(from.x + (to.x - from.x) * t);
        out.push(from.y + (to.y - from.y) * t);
    }
    out
}

/// Drop the oldest coordinate pairs so at most `cap` values remain.
fn trim_front(points: &mut Vec<f64>, cap: usize) {
    let cap = cap - cap % 2;
    if cap > 0 && points.len() > cap {
        let excess = points.len() - cap;
        points.drain(..excess);
    }
}
