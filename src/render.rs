//! Viewport render filter: which strokes to draw, and how wide.
//!
//! The render surface draws whatever this module returns, in key order.
//! Widths are divided by the camera scale so strokes keep their on-screen
//! thickness while zooming.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::str::FromStr;

use crate::camera::{Camera, Rect};
use crate::stroke::{Stroke, StrokeCollection, StrokeKey};

/// How a stroke is tested against the visible area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// Only the first point must be visible. Cheap; long strokes that
    /// start off-screen are dropped.
    #[default]
    FirstPoint,
    /// The point bounding box must intersect the visible area.
    Bounds,
}

impl FromStr for CullMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_point" => Ok(Self::FirstPoint),
            "bounds" => Ok(Self::Bounds),
            other => Err(format!("unknown cull mode: {other}")),
        }
    }
}

/// Size of the drawing surface in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A stroke ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStroke<'a> {
    pub key: &'a StrokeKey,
    pub stroke: &'a Stroke,
    /// Width in world units that renders at the stroke's nominal screen width.
    pub render_width: f64,
}

/// Strokes to draw for the current camera, in key order.
///
/// `margin_px` pads the visible area on every side, in screen pixels.
#[must_use]
pub fn visible_strokes<'a>(
    collection: &'a StrokeCollection,
    camera: &Camera,
    viewport: Viewport,
    margin_px: f64,
    mode: CullMode,
) -> Vec<RenderStroke<'a>> {
    visible_with_local(collection, None, camera, viewport, margin_px, mode)
}

/// Like [`visible_strokes`], with the local user's in-progress stroke drawn
/// last. A merged record under the same key is left out; the local copy is
/// newer.
#[must_use]
pub fn visible_with_local<'a>(
    collection: &'a StrokeCollection,
    local: Option<(&'a StrokeKey, &'a Stroke)>,
    camera: &Camera,
    viewport: Viewport,
    margin_px: f64,
    mode: CullMode,
) -> Vec<RenderStroke<'a>> {
    let area = camera.visible_world(viewport.width, viewport.height).padded(camera.screen_dist_to_world(margin_px));
    let local_key = local.map(|(key, _)| key);
    collection
        .iter()
        .filter(|(key, _)| Some(*key) != local_key)
        .chain(local)
        .filter(|(_, stroke)| is_visible(stroke, &area, mode))
        .map(|(key, stroke)| RenderStroke { key, stroke, render_width: stroke.stroke_width / camera.scale })
        .collect()
}

fn is_visible(stroke: &Stroke, area: &Rect, mode: CullMode) -> bool {
    match mode {
        CullMode::FirstPoint => stroke.first_point().is_some_and(|p| area.contains(p.x, p.y)),
        CullMode::Bounds => stroke.bounds().is_some_and(|b| area.intersects(&b)),
    }
}
