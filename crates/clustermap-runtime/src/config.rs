#![forbid(unsafe_code)]

//! Draw session configuration.
//!
//! [`SessionConfig::default`] matches the classic cluster explorer page:
//! a 1140×600 canvas, proportional weights, whole-unit rounding, a one-unit
//! gutter, and 1.5 s linear transitions.
//!
//! # Environment Variables
//!
//! [`SessionConfig::from_env`] overlays these on the defaults:
//!
//! | Variable                   | Format                    | Example      |
//! |----------------------------|---------------------------|--------------|
//! | `CLUSTERMAP_CANVAS`        | `WIDTHxHEIGHT`            | `1280x720`   |
//! | `CLUSTERMAP_WEIGHT_MODE`   | `flat` \| `proportional`  | `flat`       |
//! | `CLUSTERMAP_TRANSITION_MS` | milliseconds              | `750`        |
//! | `CLUSTERMAP_GUTTER`        | non-negative number       | `0`          |
//!
//! Unset or blank variables keep the default; malformed ones are an error.

use std::time::Duration;

use clustermap_core::animation::{EasingFn, linear};
use clustermap_layout::{ParseWeightModeError, Rounding, Size, SplitRule, WeightMode};
use thiserror::Error;

pub const ENV_CANVAS: &str = "CLUSTERMAP_CANVAS";
pub const ENV_WEIGHT_MODE: &str = "CLUSTERMAP_WEIGHT_MODE";
pub const ENV_TRANSITION_MS: &str = "CLUSTERMAP_TRANSITION_MS";
pub const ENV_GUTTER: &str = "CLUSTERMAP_GUTTER";

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid canvas `{0}` (expected WIDTHxHEIGHT with non-negative numbers)")]
    InvalidCanvas(String),

    #[error(transparent)]
    InvalidWeightMode(#[from] ParseWeightModeError),

    #[error("invalid transition duration `{0}` (expected whole milliseconds)")]
    InvalidDuration(String),

    #[error("invalid gutter `{0}` (expected a non-negative number)")]
    InvalidGutter(String),
}

/// Settings for a [`DrawSession`](crate::DrawSession).
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Layout canvas.
    pub canvas: Size,
    /// Initial weight accessor.
    pub weight_mode: WeightMode,
    pub rounding: Rounding,
    pub split_rule: SplitRule,
    /// Trailing inset applied to displayed rectangles only.
    pub gutter: f64,
    /// Length of each draw transition.
    pub duration: Duration,
    pub easing: EasingFn,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            canvas: Size::new(1140.0, 600.0),
            weight_mode: WeightMode::Proportional,
            rounding: Rounding::Integer,
            split_rule: SplitRule::LongestSide,
            gutter: 1.0,
            duration: Duration::from_millis(1500),
            easing: linear,
        }
    }
}

impl SessionConfig {
    /// Defaults overlaid with `CLUSTERMAP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_CANVAS) {
            config.canvas = parse_canvas(&raw)?;
        }
        if let Some(raw) = get(ENV_WEIGHT_MODE) {
            config.weight_mode = raw.parse()?;
        }
        if let Some(raw) = get(ENV_TRANSITION_MS) {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidDuration(raw.clone()))?;
            config.duration = Duration::from_millis(ms);
        }
        if let Some(raw) = get(ENV_GUTTER) {
            config.gutter = parse_gutter(&raw)?;
        }

        tracing::debug!(
            canvas = ?config.canvas,
            weight_mode = %config.weight_mode,
            duration_ms = config.duration.as_millis() as u64,
            gutter = config.gutter,
            "session config loaded"
        );
        Ok(config)
    }

    #[must_use]
    pub fn with_canvas(mut self, canvas: Size) -> Self {
        self.canvas = canvas;
        self
    }

    #[must_use]
    pub fn with_weight_mode(mut self, weight_mode: WeightMode) -> Self {
        self.weight_mode = weight_mode;
        self
    }

    #[must_use]
    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    #[must_use]
    pub fn with_split_rule(mut self, split_rule: SplitRule) -> Self {
        self.split_rule = split_rule;
        self
    }

    #[must_use]
    pub fn with_gutter(mut self, gutter: f64) -> Self {
        self.gutter = gutter;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Check values that cannot be expressed in the types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.canvas.is_valid() {
            return Err(ConfigError::InvalidCanvas(format!(
                "{}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if !(self.gutter.is_finite() && self.gutter >= 0.0) {
            return Err(ConfigError::InvalidGutter(self.gutter.to_string()));
        }
        Ok(())
    }
}

fn parse_canvas(raw: &str) -> Result<Size, ConfigError> {
    let invalid = || ConfigError::InvalidCanvas(raw.to_string());
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: f64 = w.trim().parse().map_err(|_| invalid())?;
    let height: f64 = h.trim().parse().map_err(|_| invalid())?;
    let size = Size::new(width, height);
    if size.is_valid() { Ok(size) } else { Err(invalid()) }
}

fn parse_gutter(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(g) if g.is_finite() && g >= 0.0 => Ok(g),
        _ => Err(ConfigError::InvalidGutter(raw.to_string())),
    }
}
