//! Shared numeric constants for the stroke pipeline.
//!
//! Most of these are defaults; the runtime values come from
//! [`crate::config::SyncConfig`].

// ── Sampling ────────────────────────────────────────────────────

/// Samples closer than this (world units) to the previous one are discarded.
pub const DEFAULT_MIN_SAMPLE_DISTANCE: f64 = 1.0;

/// Spacing of interpolated points inserted between two accepted samples.
pub const DEFAULT_INTERPOLATION_STEP: f64 = 2.0;

/// Weight of the target width when blending a new stroke width.
pub const WIDTH_SMOOTHING: f64 = 0.7;

/// Pressure factor applied to non-pen devices while a stroke grows.
pub const NON_PEN_PRESSURE_FACTOR: f64 = 0.8;

/// Extra width at full stylus tilt (90°), as a fraction of the width.
pub const TILT_WIDTH_GAIN: f64 = 0.5;

/// Maximum stylus tilt magnitude in degrees.
pub const MAX_TILT_DEG: f64 = 90.0;

/// Cap on coordinate values kept in the local working buffer of one gesture.
pub const DEFAULT_POINT_BUFFER_CAP: usize = 2000;

// ── Sync ────────────────────────────────────────────────────────

/// Minimum interval between growth writes for one stroke.
pub const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 150;

/// Most-recent strokes kept per room.
pub const DEFAULT_STROKE_CAP: usize = 1000;

/// Capacity of the outbound write queue.
pub const DEFAULT_WRITE_QUEUE_CAPACITY: usize = 1024;

// ── History ─────────────────────────────────────────────────────

/// Snapshots kept in the undo timeline.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

// ── Viewport ────────────────────────────────────────────────────

/// Screen-space padding around the viewport used when culling strokes.
pub const DEFAULT_CULL_MARGIN_PX: f64 = 100.0;

/// Zoom factor per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Zoom factor for the zoom-in / zoom-out buttons.
pub const BUTTON_ZOOM_STEP: f64 = 1.2;

/// Minimum camera scale.
pub const MIN_ZOOM: f64 = 0.1;

/// Maximum camera scale.
pub const MAX_ZOOM: f64 = 10.0;

// ── Colors ──────────────────────────────────────────────────────

/// Background color painted by eraser strokes.
pub const BACKGROUND_COLOR: &str = "#ffffff";
