//! Runtime configuration from `INKROOM_*` environment variables.
//!
//! Every value has a typed default in [`crate::consts`]. A variable that is
//! set but does not parse, or parses to an unusable value, is a
//! [`ConfigError`] rather than a silent fallback.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;
use std::time::Duration;

use crate::capture::CaptureConfig;
use crate::consts::{
    DEFAULT_CULL_MARGIN_PX, DEFAULT_HISTORY_LIMIT, DEFAULT_INTERPOLATION_STEP, DEFAULT_MIN_SAMPLE_DISTANCE,
    DEFAULT_POINT_BUFFER_CAP, DEFAULT_PUBLISH_INTERVAL_MS, DEFAULT_STROKE_CAP, DEFAULT_WRITE_QUEUE_CAPACITY,
};
use crate::render::CullMode;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}")]
    Unparseable { key: &'static str, value: String },
    #[error("{key}: {reason}")]
    OutOfRange { key: &'static str, reason: &'static str },
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unparseable { .. } => "E_CONFIG_UNPARSEABLE",
            Self::OutOfRange { .. } => "E_CONFIG_OUT_OF_RANGE",
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Tunables for one client's stroke pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    pub publish_interval: Duration,
    pub stroke_cap: usize,
    pub point_buffer_cap: usize,
    pub min_sample_distance: f64,
    pub interpolation_step: f64,
    pub history_limit: usize,
    pub cull_margin_px: f64,
    pub cull_mode: CullMode,
    pub write_queue_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            publish_interval: Duration::from_millis(DEFAULT_PUBLISH_INTERVAL_MS),
            stroke_cap: DEFAULT_STROKE_CAP,
            point_buffer_cap: DEFAULT_POINT_BUFFER_CAP,
            min_sample_distance: DEFAULT_MIN_SAMPLE_DISTANCE,
            interpolation_step: DEFAULT_INTERPOLATION_STEP,
            history_limit: DEFAULT_HISTORY_LIMIT,
            cull_margin_px: DEFAULT_CULL_MARGIN_PX,
            cull_mode: CullMode::default(),
            write_queue_capacity: DEFAULT_WRITE_QUEUE_CAPACITY,
        }
    }
}

impl SyncConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_ms: u64 = env_parse(&lookup, "INKROOM_PUBLISH_INTERVAL_MS", DEFAULT_PUBLISH_INTERVAL_MS)?;
        let config = Self {
            publish_interval: Duration::from_millis(interval_ms),
            stroke_cap: env_parse(&lookup, "INKROOM_STROKE_CAP", DEFAULT_STROKE_CAP)?,
            point_buffer_cap: env_parse(&lookup, "INKROOM_POINT_BUFFER_CAP", DEFAULT_POINT_BUFFER_CAP)?,
            min_sample_distance: env_parse(&lookup, "INKROOM_MIN_SAMPLE_DISTANCE", DEFAULT_MIN_SAMPLE_DISTANCE)?,
            interpolation_step: env_parse(&lookup, "INKROOM_INTERPOLATION_STEP", DEFAULT_INTERPOLATION_STEP)?,
            history_limit: env_parse(&lookup, "INKROOM_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            cull_margin_px: env_parse(&lookup, "INKROOM_CULL_MARGIN_PX", DEFAULT_CULL_MARGIN_PX)?,
            cull_mode: env_parse(&lookup, "INKROOM_CULL_MODE", CullMode::default())?,
            write_queue_capacity: env_parse(&lookup, "INKROOM_WRITE_QUEUE_CAPACITY", DEFAULT_WRITE_QUEUE_CAPACITY)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.stroke_cap == 0 {
            return Err(ConfigError::OutOfRange { key: "INKROOM_STROKE_CAP", reason: "must be at least 1" });
        }
        if self.history_limit == 0 {
            return Err(ConfigError::OutOfRange { key: "INKROOM_HISTORY_LIMIT", reason: "must be at least 1" });
        }
        if self.write_queue_capacity == 0 {
            return Err(ConfigError::OutOfRange { key: "INKROOM_WRITE_QUEUE_CAPACITY", reason: "must be at least 1" });
        }
        if self.point_buffer_cap < 2 {
            return Err(ConfigError::OutOfRange { key: "INKROOM_POINT_BUFFER_CAP", reason: "must hold at least one point" });
        }
        if !(self.interpolation_step.is_finite() && self.interpolation_step > 0.0) {
            return Err(ConfigError::OutOfRange { key: "INKROOM_INTERPOLATION_STEP", reason: "must be positive" });
        }
        if !(self.min_sample_distance.is_finite() && self.min_sample_distance >= 0.0) {
            return Err(ConfigError::OutOfRange { key: "INKROOM_MIN_SAMPLE_DISTANCE", reason: "must not be negative" });
        }
        if !(self.cull_margin_px.is_finite() && self.cull_margin_px >= 0.0) {
            return Err(ConfigError::OutOfRange { key: "INKROOM_CULL_MARGIN_PX", reason: "must not be negative" });
        }
        Ok(())
    }

    /// Sampling limits for the capture session.
    #[must_use]
    pub fn capture(&self) -> CaptureConfig {
        CaptureConfig {
            min_distance: self.min_sample_distance,
            interpolation_step: self.interpolation_step,
            point_buffer_cap: self.point_buffer_cap,
        }
    }
}

pub(crate) fn env_parse<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    trimmed.parse::<T>().map_err(|_| ConfigError::Unparseable { key, value: raw.clone() })
}
