#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Rect;
use crate::stroke::{StrokeCollection, StrokeKey};

/// Keys of strokes with at least one point inside `rect`, in key order.
#[must_use]
pub fn strokes_in_rect(collection: &StrokeCollection, rect: &Rect) -> Vec<StrokeKey> {
    collection
        .iter()
        .filter(|(_, stroke)| stroke.iter_points().any(|p| rect.contains(p.x, p.y)))
        .map(|(key, _)| key.clone())
        .collect()
}
