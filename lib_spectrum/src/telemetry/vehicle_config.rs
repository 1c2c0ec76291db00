//! # Vehicle Value Configuration
//!
//! Static range and threshold table for every monitored parameter. The table is
//! built once at start-up and only ever read afterwards.
//!
//! Thresholds are compared against the *raw* value, never the normalized one.
//! `expected_min` may be larger than `expected_max` (altitude counts downwards),
//! the normalization engine handles both directions.

use serde::{Deserialize, Serialize};

/// Normalization range and optional thresholds for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleValueConfig {
    /// Raw value mapped to `projected_min`.
    pub expected_min: f64,
    /// Raw value mapped to `projected_max`.
    pub expected_max: f64,
    /// Lower bound of the normalized output. Must not exceed `projected_max`.
    pub projected_min: f64,
    /// Upper bound of the normalized output.
    pub projected_max: f64,
    /// Raw values at or below this are a warning.
    pub warning_min_threshold: Option<f64>,
    /// Raw values at or above this are a warning.
    pub warning_max_threshold: Option<f64>,
    /// Raw values at or below this are dangerous.
    pub danger_min_threshold: Option<f64>,
    /// Raw values at or above this are dangerous.
    pub danger_max_threshold: Option<f64>,
}

impl VehicleValueConfig {
    /// A config with the given ranges and no thresholds.
    pub const fn new(expected_min: f64, expected_max: f64, projected_min: f64, projected_max: f64) -> Self {
        Self {
            expected_min,
            expected_max,
            projected_min,
            projected_max,
            warning_min_threshold: None,
            warning_max_threshold: None,
            danger_min_threshold: None,
            danger_max_threshold: None,
        }
    }

    /// Sets the warning band edges.
    pub const fn with_warning(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.warning_min_threshold = min;
        self.warning_max_threshold = max;
        self
    }

    /// Sets the danger band edges.
    pub const fn with_danger(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.danger_min_threshold = min;
        self.danger_max_threshold = max;
        self
    }
}

/// Velocity in m/s, projected to [-1, 1].
pub const VELOCITY: VehicleValueConfig = VehicleValueConfig::new(-100.0, 100.0, -1.0, 1.0)
    .with_warning(Some(-80.0), Some(75.0))
    .with_danger(Some(-95.0), Some(85.0));

/// Altitude change in m. Inverted domain: 0 maps to 0 and -80000 maps to 1.
pub const ALTITUDE: VehicleValueConfig = VehicleValueConfig::new(0.0, -80000.0, 0.0, 1.0);

/// Temperature in °C, projected to [-1, 1].
pub const TEMPERATURE: VehicleValueConfig = VehicleValueConfig::new(-30.0, 30.0, -1.0, 1.0);

/// Per-parameter table for the whole vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Velocity settings.
    pub velocity: VehicleValueConfig,
    /// Altitude settings.
    pub altitude: VehicleValueConfig,
    /// Temperature settings.
    pub temperature: VehicleValueConfig,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            velocity: VELOCITY,
            altitude: ALTITUDE,
            temperature: TEMPERATURE,
        }
    }
}
