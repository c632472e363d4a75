//! Input model: pointer samples, device classification, modifiers, and shortcuts.
//!
//! A [`PointerSample`] is the crate's view of one raw pointer event. The
//! normalizer ([`normalize`]) turns it into a device class and a pressure value
//! using the device rows of the profile table, so pressure and width heuristics
//! share one set of constants.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::profile::DeviceProfile;

/// Device class of the pointer that produced a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Mouse,
    Touch,
    Pen,
}

impl DeviceType {
    /// Every device class, in table order.
    pub const ALL: [DeviceType; 3] = [DeviceType::Mouse, DeviceType::Touch, DeviceType::Pen];
}

/// Pointer type as reported by the host (`pointerType` in the DOM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerType {
    #[default]
    Mouse,
    Touch,
    Pen,
    /// Anything the host could not name; treated as a mouse.
    Other,
}

impl PointerType {
    /// Parse the host's pointer type string.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "mouse" => Self::Mouse,
            "touch" => Self::Touch,
            "pen" => Self::Pen,
            _ => Self::Other,
        }
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    /// Left mouse button, finger or pen tip.
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button or pen barrel button.
    Secondary,
}

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// One raw pointer event.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerSample {
    /// Position in screen pixels relative to the drawing surface.
    pub screen: Point,
    pub pointer_type: PointerType,
    pub button: Button,
    pub modifiers: Modifiers,
    /// Native pressure in `[0, 1]`, if the device reports one.
    pub pressure: Option<f64>,
    /// Stylus tilt around the Y axis, in degrees.
    pub tilt_x: f64,
    /// Stylus tilt around the X axis, in degrees.
    pub tilt_y: f64,
}

impl PointerSample {
    /// A primary-button mouse sample at `(x, y)`.
    #[must_use]
    pub fn mouse(x: f64, y: f64) -> Self {
        Self { screen: Point::new(x, y), ..Self::default() }
    }

    /// A pen sample at `(x, y)` with native pressure.
    #[must_use]
    pub fn pen(x: f64, y: f64, pressure: f64) -> Self {
        Self { screen: Point::new(x, y), pointer_type: PointerType::Pen, pressure: Some(pressure), ..Self::default() }
    }

    /// A touch sample at `(x, y)`.
    #[must_use]
    pub fn touch(x: f64, y: f64) -> Self {
        Self { screen: Point::new(x, y), pointer_type: PointerType::Touch, ..Self::default() }
    }

    /// Magnitude of the stylus tilt vector in degrees.
    #[must_use]
    pub fn tilt_magnitude(&self) -> f64 {
        self.tilt_x.hypot(self.tilt_y)
    }
}

/// Normalized device reading for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceReading {
    pub device: DeviceType,
    pub pressure: f64,
}

/// Classify the sample's device.
#[must_use]
pub fn classify(sample: &PointerSample) -> DeviceType {
    match sample.pointer_type {
        PointerType::Pen => DeviceType::Pen,
        PointerType::Touch => DeviceType::Touch,
        PointerType::Mouse | PointerType::Other => DeviceType::Mouse,
    }
}

/// Classify the device and derive the pressure used for width and opacity.
#[must_use]
pub fn normalize(sample: &PointerSample) -> DeviceReading {
    let device = classify(sample);
    let pressure = DeviceProfile::for_device(device).pressure(sample.pressure);
    DeviceReading { device, pressure }
}

/// History shortcut recognised from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
}

impl Shortcut {
    /// Map `key` plus modifiers to a shortcut: modifier+Z undoes,
    /// modifier+Shift+Z or modifier+Y redoes.
    #[must_use]
    pub fn from_key(key: &str, modifiers: Modifiers) -> Option<Self> {
        if !modifiers.command() {
            return None;
        }
        if key.eq_ignore_ascii_case("z") {
            return Some(if modifiers.shift { Self::Redo } else { Self::Undo });
        }
        if key.eq_ignore_ascii_case("y") {
            return Some(Self::Redo);
        }
        None
    }
}
