#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{BUTTON_ZOOM_STEP, MAX_ZOOM, MIN_ZOOM, WHEEL_ZOOM_STEP};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Axis-aligned rectangle in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Rectangle spanned by two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self { min_x: a.x.min(b.x), min_y: a.y.min(b.y), max_x: a.x.max(b.x), max_y: a.y.max(b.y) }
    }

    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x && other.min_x <= self.max_x && self.min_y <= other.max_y && other.min_y <= self.max_y
    }

    /// Grow the rectangle by `by` on every side.
    #[must_use]
    pub fn padded(&self, by: f64) -> Self {
        Self { min_x: self.min_x - by, min_y: self.min_y - by, max_x: self.max_x + by, max_y: self.max_y + by }
    }
}

/// Pan/zoom state of the drawing surface.
///
/// `offset_x` / `offset_y` are in screen pixels.
/// `scale` is a zoom factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { offset_x: 0.0, offset_y: 0.0, scale: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point { x: (screen.x - self.offset_x) / self.scale, y: (screen.y - self.offset_y) / self.scale }
    }

    /// Convert a world-space point to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point { x: world.x * self.scale + self.offset_x, y: world.y * self.scale + self.offset_y }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// World rectangle covered by a `width` x `height` viewport.
    #[must_use]
    pub fn visible_world(&self, width: f64, height: f64) -> Rect {
        let top_left = self.screen_to_world(Point::new(0.0, 0.0));
        let bottom_right = self.screen_to_world(Point::new(width, height));
        Rect::from_corners(top_left, bottom_right)
    }

    /// Move the surface by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Zoom to `new_scale`, keeping the world point under `anchor` fixed on screen.
    pub fn zoom_about(&mut self, anchor: Point, new_scale: f64) {
        let new_scale = new_scale.clamp(MIN_ZOOM, MAX_ZOOM);
        let world = self.screen_to_world(anchor);
        self.scale = new_scale;
        self.offset_x = anchor.x - world.x * new_scale;
        self.offset_y = anchor.y - world.y * new_scale;
    }

    /// Wheel zoom: negative `delta_y` (scroll up) zooms in by one notch.
    pub fn zoom_at(&mut self, anchor: Point, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        let new_scale = if delta_y < 0.0 { self.scale * WHEEL_ZOOM_STEP } else { self.scale / WHEEL_ZOOM_STEP };
        self.zoom_about(anchor, new_scale);
    }

    /// Button zoom in around the viewport center.
    pub fn zoom_in(&mut self, width: f64, height: f64) {
        self.zoom_about(Point::new(width * 0.5, height * 0.5), self.scale * BUTTON_ZOOM_STEP);
    }

    /// Button zoom out around the viewport center.
    pub fn zoom_out(&mut self, width: f64, height: f64) {
        self.zoom_about(Point::new(width * 0.5, height * 0.5), self.scale / BUTTON_ZOOM_STEP);
    }

    /// Back to scale 1 with no pan.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
