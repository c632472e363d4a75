//! Stroke model: the stroke record, its key, and the per-room collection.
//!
//! This module defines the data that is synchronized through the store
//! (`Stroke`, keyed by `StrokeKey`) and the in-memory collection the engine
//! renders from (`StrokeCollection`).
//!
//! Data flows into this layer from the store (JSON decoding in
//! [`StrokeCollection::from_remote`]) and from the capture session (new strokes
//! and their growth). The collection is ordered by key, which is the store's
//! insertion order, and is capped to the most recent entries.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::camera::{Point, Rect};
use crate::input::DeviceType;
use crate::profile::{CompositeMode, LineCap, LineJoin, StrokeStyle, Tool};

/// Store-assigned identity of a stroke. Keys sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeKey(pub String);

impl StrokeKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrokeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StrokeKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// One freehand stroke as stored and rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    /// Tool identifier. Known values are listed in [`Tool`].
    pub tool: String,
    /// Flattened `[x0, y0, x1, y1, ...]` world coordinates.
    pub points: Vec<f64>,
    pub stroke_width: f64,
    pub stroke_color: String,
    #[serde(default)]
    pub tension: f64,
    #[serde(default = "full_opacity")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f64>,
    #[serde(default)]
    pub line_cap: LineCap,
    #[serde(default)]
    pub line_join: LineJoin,
    #[serde(default)]
    pub composite_mode: CompositeMode,
    #[serde(default)]
    pub shadow_blur: f64,
    #[serde(default)]
    pub device_type: DeviceType,
    /// Author display name. Records without one belong to nobody.
    #[serde(default)]
    pub owner_id: String,
}

fn full_opacity() -> f64 {
    1.0
}

impl Stroke {
    /// Start a stroke at `at` with render parameters from `style`.
    ///
    /// The width is the style width scaled by `pressure`.
    #[must_use]
    pub fn begin(tool: &str, style: &StrokeStyle, device: DeviceType, owner: &str, at: Point, pressure: f64) -> Self {
        Self {
            tool: tool.to_owned(),
            points: vec![at.x, at.y],
            stroke_width: style.width * pressure,
            stroke_color: style.color.clone(),
            tension: style.tension,
            opacity: style.opacity,
            dash: Vec::new(),
            line_cap: style.line_cap,
            line_join: style.line_join,
            composite_mode: style.composite,
            shadow_blur: style.shadow_blur,
            device_type: device,
            owner_id: owner.to_owned(),
        }
    }

    /// The tool, if the identifier is a known one.
    #[must_use]
    pub fn tool_kind(&self) -> Option<Tool> {
        Tool::from_name(&self.tool)
    }

    /// Composite mode to render with. Eraser records written without an
    /// explicit mode still erase.
    #[must_use]
    pub fn effective_composite(&self) -> CompositeMode {
        if self.tool_kind() == Some(Tool::Eraser) {
            CompositeMode::DestinationOut
        } else {
            self.composite_mode
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, user: &str) -> bool {
        !user.is_empty() && self.owner_id == user
    }

    /// Number of coordinate pairs.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len() / 2
    }

    #[must_use]
    pub fn first_point(&self) -> Option<Point> {
        match self.points.as_slice() {
            [x, y, ..] => Some(Point::new(*x, *y)),
            _ => None,
        }
    }

    #[must_use]
    pub fn last_point(&self) -> Option<Point> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        Some(Point::new(self.points[n - 2], self.points[n - 1]))
    }

    /// Iterate the coordinate pairs as points.
    pub fn iter_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.chunks_exact(2).map(|c| Point::new(c[0], c[1]))
    }

    /// Bounding box of all points, or `None` for an empty stroke.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let mut iter = self.iter_points();
        let first = iter.next()?;
        let mut rect = Rect::from_corners(first, first);
        for p in iter {
            rect.min_x = rect.min_x.min(p.x);
            rect.min_y = rect.min_y.min(p.y);
            rect.max_x = rect.max_x.max(p.x);
            rect.max_y = rect.max_y.max(p.y);
        }
        Some(rect)
    }

    /// Whether the record satisfies the point invariants (non-empty, even length).
    #[must_use]
    pub fn has_valid_points(&self) -> bool {
        !self.points.is_empty() && self.points.len() % 2 == 0
    }
}

/// One keyed change to a room's strokes.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeOp {
    Upsert(StrokeKey, Stroke),
    Delete(StrokeKey),
}

impl StrokeOp {
    #[must_use]
    pub fn key(&self) -> &StrokeKey {
        match self {
            Self::Upsert(key, _) | Self::Delete(key) => key,
        }
    }
}

/// All strokes of a room, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeCollection {
    strokes: BTreeMap<StrokeKey, Stroke>,
}

impl StrokeCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self { strokes: BTreeMap::new() }
    }

    /// Decode the value found at a room's stroke path.
    ///
    /// A missing or non-object value is an empty collection. Records that do
    /// not decode, or have no points, are skipped. At most `cap` of the most
    /// recent keys are kept.
    #[must_use]
    pub fn from_remote(value: serde_json::Value, cap: usize) -> Self {
        let serde_json::Value::Object(map) = value else {
            if !value.is_null() {
                debug!(kind = value_kind(&value), "stroke path holds a non-object value; treating as empty");
            }
            return Self::new();
        };

        let mut collection = Self::new();
        for (key, raw) in map {
            match serde_json::from_value::<Stroke>(raw) {
                Ok(stroke) if stroke.has_valid_points() => {
                    collection.strokes.insert(StrokeKey(key), stroke);
                }
                Ok(_) => debug!(key = %key, "skipping stroke record with invalid points"),
                Err(e) => debug!(key = %key, error = %e, "skipping malformed stroke record"),
            }
        }
        collection.enforce_cap(cap);
        collection
    }

    /// Insert or replace a stroke.
    pub fn insert(&mut self, key: StrokeKey, stroke: Stroke) {
        self.strokes.insert(key, stroke);
    }

    /// Remove a stroke by key, returning it if it was present.
    pub fn remove(&mut self, key: &StrokeKey) -> Option<Stroke> {
        self.strokes.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &StrokeKey) -> Option<&Stroke> {
        self.strokes.get(key)
    }

    /// Strokes in key (creation) order.
    pub fn iter(&self) -> impl Iterator<Item = (&StrokeKey, &Stroke)> {
        self.strokes.iter()
    }

    /// Key set of the collection.
    #[must_use]
    pub fn keys(&self) -> BTreeSet<&StrokeKey> {
        self.strokes.keys().collect()
    }

    /// Keys of strokes authored by `user`.
    pub fn keys_owned_by<'a>(&'a self, user: &'a str) -> impl Iterator<Item = &'a StrokeKey> + 'a {
        self.strokes.iter().filter(move |(_, s)| s.is_owned_by(user)).map(|(k, _)| k)
    }

    /// Whether any stroke is authored by `user`.
    #[must_use]
    pub fn has_owner(&self, user: &str) -> bool {
        self.strokes.values().any(|s| s.is_owned_by(user))
    }

    /// Apply keyed changes in order.
    pub fn apply(&mut self, ops: &[StrokeOp]) {
        for op in ops {
            match op {
                StrokeOp::Upsert(key, stroke) => {
                    self.strokes.insert(key.clone(), stroke.clone());
                }
                StrokeOp::Delete(key) => {
                    self.strokes.remove(key);
                }
            }
        }
    }

    /// Drop the oldest strokes until at most `cap` remain. Returns how many were evicted.
    pub fn enforce_cap(&mut self, cap: usize) -> usize {
        let mut evicted = 0;
        while self.strokes.len() > cap {
            if self.strokes.pop_first().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    /// Number of strokes currently in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// Returns `true` if the collection holds no strokes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

impl FromIterator<(StrokeKey, Stroke)> for StrokeCollection {
    fn from_iter<I: IntoIterator<Item = (StrokeKey, Stroke)>>(iter: I) -> Self {
        Self { strokes: iter.into_iter().collect() }
    }
}

fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
