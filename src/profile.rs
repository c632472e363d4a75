//! Tool and device profiles: the single table behind stroke rendering parameters.
//!
//! DESIGN
//! ======
//! Every heuristic constant lives in two small tables: one row per tool
//! ([`ToolProfile`]) and one row per device class ([`DeviceProfile`]). The
//! stroke model builder ([`StrokeStyle::build`]) combines a tool row with a
//! device row; the input normalizer reads pressure policy from the same device
//! rows. Lookups are pure, so the same inputs always produce the same bundle.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use serde::{Deserialize, Serialize};

use crate::consts::BACKGROUND_COLOR;
use crate::input::DeviceType;

/// Drawing tools that produce strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pencil,
    Pen,
    Brush,
    Marker,
    Highlighter,
    Ink,
    Eraser,
}

impl Tool {
    /// Every drawing tool, in table order.
    pub const ALL: [Tool; 7] = [
        Tool::Pencil,
        Tool::Pen,
        Tool::Brush,
        Tool::Marker,
        Tool::Highlighter,
        Tool::Ink,
        Tool::Eraser,
    ];

    /// Look up a tool by its wire identifier. Unknown identifiers yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Wire identifier of the tool.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Pencil => "pencil",
            Self::Pen => "pen",
            Self::Brush => "brush",
            Self::Marker => "marker",
            Self::Highlighter => "highlighter",
            Self::Ink => "ink",
            Self::Eraser => "eraser",
        }
    }
}

/// Line end style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Round,
    Square,
    Butt,
}

/// Line corner style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Round,
    Miter,
    Bevel,
}

/// Pixel-blending rule used when the stroke is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeMode {
    /// Normal painting.
    #[default]
    SourceOver,
    /// Darkening blend used by the highlighter.
    Multiply,
    /// Removes pixels underneath; used by the eraser.
    DestinationOut,
}

impl CompositeMode {
    /// Whether the mode removes pixels instead of painting them.
    #[must_use]
    pub fn is_destructive(self) -> bool {
        matches!(self, Self::DestinationOut)
    }
}

/// Per-tool row of the profile table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolProfile {
    pub tension: f64,
    pub opacity: f64,
    pub width_multiplier: f64,
    pub line_cap: LineCap,
    pub composite: CompositeMode,
    /// Shadow blur for mouse and pen input.
    pub shadow_blur: f64,
    /// Shadow blur for touch input.
    pub touch_shadow_blur: f64,
}

/// Opaque, round, normal-blend profile used for unknown tools.
pub const NEUTRAL_PROFILE: ToolProfile = ToolProfile {
    tension: 0.4,
    opacity: 1.0,
    width_multiplier: 1.0,
    line_cap: LineCap::Round,
    composite: CompositeMode::SourceOver,
    shadow_blur: 0.0,
    touch_shadow_blur: 0.0,
};

impl ToolProfile {
    /// Table row for `tool`; unknown tools get [`NEUTRAL_PROFILE`].
    #[must_use]
    pub fn for_tool(tool: Option<Tool>) -> Self {
        let Some(tool) = tool else {
            return NEUTRAL_PROFILE;
        };
        match tool {
            Tool::Pencil => Self {
                tension: 0.3,
                opacity: 0.85,
                width_multiplier: 0.8,
                line_cap: LineCap::Round,
                composite: CompositeMode::SourceOver,
                shadow_blur: 0.2,
                touch_shadow_blur: 0.4,
            },
            Tool::Pen => Self {
                tension: 0.5,
                opacity: 0.95,
                width_multiplier: 1.2,
                line_cap: LineCap::Round,
                composite: CompositeMode::SourceOver,
                shadow_blur: 0.1,
                touch_shadow_blur: 0.3,
            },
            Tool::Brush => Self {
                tension: 0.4,
                opacity: 0.6,
                width_multiplier: 2.0,
                line_cap: LineCap::Round,
                composite: CompositeMode::SourceOver,
                shadow_blur: 1.5,
                touch_shadow_blur: 2.0,
            },
            Tool::Marker => Self {
                tension: 0.2,
                opacity: 0.4,
                width_multiplier: 2.5,
                line_cap: LineCap::Square,
                composite: CompositeMode::SourceOver,
                shadow_blur: 0.0,
                touch_shadow_blur: 0.0,
            },
            Tool::Highlighter => Self {
                tension: 0.2,
                opacity: 0.3,
                width_multiplier: 3.0,
                line_cap: LineCap::Square,
                composite: CompositeMode::Multiply,
                shadow_blur: 0.0,
                touch_shadow_blur: 0.0,
            },
            Tool::Ink => Self {
                tension: 0.5,
                opacity: 1.0,
                width_multiplier: 1.0,
                line_cap: LineCap::Round,
                composite: CompositeMode::SourceOver,
                shadow_blur: 0.05,
                touch_shadow_blur: 0.1,
            },
            Tool::Eraser => Self {
                tension: 0.3,
                opacity: 1.0,
                width_multiplier: 2.0,
                line_cap: LineCap::Round,
                composite: CompositeMode::DestinationOut,
                shadow_blur: 0.0,
                touch_shadow_blur: 0.0,
            },
        }
    }
}

/// How a device class reports pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressurePolicy {
    /// Fixed nominal pressure; the device has no meaningful sensor.
    Nominal(f64),
    /// Native pressure scaled by `gain`, never below `floor`.
    Native { gain: f64, floor: f64 },
}

/// Per-device row of the profile table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    pub width_multiplier: f64,
    /// Subtracted from the tool tension.
    pub tension_adjustment: f64,
    /// Additional width multiplier on compact (phone-sized) screens.
    pub compact_width_boost: f64,
    pub pressure: PressurePolicy,
}

impl DeviceProfile {
    /// Table row for `device`.
    #[must_use]
    pub fn for_device(device: DeviceType) -> Self {
        match device {
            DeviceType::Mouse => Self {
                width_multiplier: 1.0,
                tension_adjustment: 0.1,
                compact_width_boost: 1.0,
                pressure: PressurePolicy::Nominal(1.0),
            },
            DeviceType::Touch => Self {
                width_multiplier: 1.5,
                tension_adjustment: 0.2,
                compact_width_boost: 1.25,
                pressure: PressurePolicy::Nominal(1.0),
            },
            DeviceType::Pen => Self {
                width_multiplier: 0.8,
                tension_adjustment: 0.0,
                compact_width_boost: 1.0,
                pressure: PressurePolicy::Native { gain: 1.5, floor: 0.15 },
            },
        }
    }

    /// Pressure for a sample carrying `native` pressure (if any).
    #[must_use]
    pub fn pressure(&self, native: Option<f64>) -> f64 {
        match self.pressure {
            PressurePolicy::Nominal(value) => value,
            PressurePolicy::Native { gain, floor } => (native.unwrap_or(0.0) * gain).max(floor),
        }
    }
}

/// Screen class of the host device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFactor {
    #[default]
    Desktop,
    /// Phone-sized screen; touch strokes get wider.
    Compact,
}

/// What a primary-button drag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    #[default]
    Draw,
    /// Pan mode toggle: every drag pans.
    Pan,
    /// Rectangle selection.
    Select,
}

/// The user's current tool configuration, supplied by the toolbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    /// Tool identifier; unknown values draw with the neutral profile.
    pub tool: String,
    pub stroke_width: f64,
    pub stroke_color: String,
    #[serde(default)]
    pub interaction: Interaction,
    #[serde(default)]
    pub form_factor: FormFactor,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: Tool::Pencil.name().to_owned(),
            stroke_width: 2.0,
            stroke_color: "#000000".to_owned(),
            interaction: Interaction::Draw,
            form_factor: FormFactor::Desktop,
        }
    }
}

impl ToolSettings {
    /// Settings for `tool` with the default width and color.
    #[must_use]
    pub fn with_tool(tool: Tool) -> Self {
        Self { tool: tool.name().to_owned(), ..Self::default() }
    }
}

/// Full render-parameter bundle for a new stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub tension: f64,
    pub opacity: f64,
    /// Width before pressure is applied.
    pub width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub composite: CompositeMode,
    pub shadow_blur: f64,
    pub color: String,
}

impl StrokeStyle {
    /// Combine the tool row, the device row, and the user's base width/color.
    #[must_use]
    pub fn build(tool: Option<Tool>, device: DeviceType, settings: &ToolSettings) -> Self {
        let profile = ToolProfile::for_tool(tool);
        let dev = DeviceProfile::for_device(device);

        let mut width = settings.stroke_width * profile.width_multiplier * dev.width_multiplier;
        if settings.form_factor == FormFactor::Compact {
            width *= dev.compact_width_boost;
        }

        let shadow_blur = if device == DeviceType::Touch { profile.touch_shadow_blur } else { profile.shadow_blur };

        let color = if profile.composite.is_destructive() {
            BACKGROUND_COLOR.to_owned()
        } else {
            settings.stroke_color.clone()
        };

        Self {
            tension: (profile.tension - dev.tension_adjustment).max(0.0),
            opacity: profile.opacity,
            width,
            line_cap: profile.line_cap,
            line_join: LineJoin::Round,
            composite: profile.composite,
            shadow_blur,
            color,
        }
    }
}
