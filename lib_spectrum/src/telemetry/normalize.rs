//! # Value Normalization & Classification
//!
//! Maps a raw telemetry scalar into its animation range and classifies it into
//! normal, warning or danger bands.
//!
//! ## Algorithm
//! 1. `ratio = (value - expected_min) / (expected_max - expected_min)`, not clamped.
//! 2. `normalized = projected_min + ratio * (projected_max - projected_min)`.
//! 3. `normalized` is clamped with `max(projected_min, min(normalized, projected_max))`.
//! 4. Warning and danger flags compare the *raw* value against the optional
//!    thresholds; a missing threshold never triggers its half of the check.
//!
//! A degenerate config with `expected_min == expected_max` divides by zero and
//! yields a NaN or infinite ratio. Callers own that; nothing here guards it.

use serde::{Deserialize, Serialize};

use super::vehicle_config::VehicleValueConfig;

/// Output of [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    /// Value clamped into `[projected_min, projected_max]`.
    pub normalized_value: f64,
    /// Raw value is inside a warning band.
    pub is_in_warning: bool,
    /// Raw value is inside a danger band.
    pub is_in_danger: bool,
}

impl NormalizedResult {
    /// Severity with danger taking precedence over warning.
    pub fn severity(&self) -> Severity {
        Severity::from_flags(self.is_in_danger, self.is_in_warning)
    }
}

/// Rescales `value` into the projected range of `config`.
pub fn normalized_value(value: f64, config: &VehicleValueConfig) -> f64 {
    let ratio = (value - config.expected_min) / (config.expected_max - config.expected_min);
    let normalized = config.projected_min + ratio * (config.projected_max - config.projected_min);

    // Assumes projected_min <= projected_max, which holds for every shipped config.
    config.projected_min.max(normalized.min(config.projected_max))
}

fn in_band(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_some_and(|threshold| value <= threshold) || max.is_some_and(|threshold| value >= threshold)
}

/// True when the raw value touches or passes a warning threshold.
pub fn is_in_warning(value: f64, config: &VehicleValueConfig) -> bool {
    in_band(value, config.warning_min_threshold, config.warning_max_threshold)
}

/// True when the raw value touches or passes a danger threshold.
pub fn is_in_danger(value: f64, config: &VehicleValueConfig) -> bool {
    in_band(value, config.danger_min_threshold, config.danger_max_threshold)
}

/// Normalizes and classifies one raw value. Pure and infallible.
pub fn normalize(value: f64, config: &VehicleValueConfig) -> NormalizedResult {
    NormalizedResult {
        normalized_value: normalized_value(value, config),
        is_in_warning: is_in_warning(value, config),
        is_in_danger: is_in_danger(value, config),
    }
}

/// Like [`normalize`], but an absent value falls back to `expected_min`.
pub fn normalize_or_default(value: Option<f64>, config: &VehicleValueConfig) -> NormalizedResult {
    normalize(value.unwrap_or(config.expected_min), config)
}

/// Display severity of a reading, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Inside the expected operating band.
    Normal,
    /// Inside a warning band.
    Warning,
    /// Inside a danger band.
    Danger,
}

impl Severity {
    /// Danger overrides warning, warning overrides normal.
    pub fn from_flags(is_in_danger: bool, is_in_warning: bool) -> Self {
        if is_in_danger {
            Severity::Danger
        } else if is_in_warning {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

/// Caller supplied color per severity. Values are opaque tokens, usually hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTable {
    /// Color for [`Severity::Normal`].
    pub normal: String,
    /// Color for [`Severity::Warning`].
    pub warning: String,
    /// Color for [`Severity::Danger`].
    pub danger: String,
}

impl Default for ColorTable {
    /// The dashboard theme: brand blue, warning amber, danger red.
    fn default() -> Self {
        Self {
            normal: "#095EDD".to_string(),
            warning: "#DD8809".to_string(),
            danger: "#DD2209".to_string(),
        }
    }
}

impl ColorTable {
    /// Color for a resolved severity.
    pub fn get(&self, severity: Severity) -> &str {
        match severity {
            Severity::Normal => &self.normal,
            Severity::Warning => &self.warning,
            Severity::Danger => &self.danger,
        }
    }
}

/// Resolves the color for a pair of classification flags.
pub fn color_for(is_in_danger: bool, is_in_warning: bool, table: &ColorTable) -> &str {
    table.get(Severity::from_flags(is_in_danger, is_in_warning))
}
