//! # Gauge Parameters
//!
//! Converts a normalized reading into the numbers each gauge animates. Renderers
//! only interpolate between successive values; all mapping happens here.

use serde::Serialize;

/// Peak opacity of an altitude orbit band.
pub const BAND_MAX_OPACITY: f64 = 0.9;

/// Normalized altitude where the first orbit starts fading in.
pub const FLOOR_BAND_THRESHOLD: f64 = 0.2;
/// Normalized altitude where the first orbit is fully visible.
pub const FIRST_BAND_THRESHOLD: f64 = 0.5;
/// Normalized altitude where the second orbit is fully visible.
pub const SECOND_BAND_THRESHOLD: f64 = 0.8;
/// Normalized altitude where the third orbit is fully visible.
pub const THIRD_BAND_THRESHOLD: f64 = 0.9;

/// Pixels the velocity indicator travels per normalized unit.
const VELOCITY_INDICATOR_TRAVEL: f64 = -100.0;
/// Pixels the vehicle climbs per normalized altitude unit.
const ALTITUDE_VEHICLE_TRAVEL: f64 = -300.0;
/// Pixels the temperature scale slides per normalized unit.
const TEMPERATURE_SCALE_TRAVEL: f64 = 500.0;

/// Opacity of a band that fades in linearly between `lower` and `upper`.
pub fn band_opacity(value: f64, lower: f64, upper: f64) -> f64 {
    if value < lower {
        return 0.0;
    }
    if value > upper {
        return BAND_MAX_OPACITY;
    }
    (value - lower) / (upper - lower) * BAND_MAX_OPACITY
}

/// Velocity arc and ascend/descend indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityGauge {
    /// Fraction of the arc drawn, `|n|`.
    pub arc_length: f64,
    /// Vertical indicator offset.
    pub indicator_offset_y: f64,
    /// Stroke color.
    pub color: String,
}

impl VelocityGauge {
    /// Arc and indicator for a normalized velocity in `[-1, 1]`.
    pub fn new(normalized: f64, color: &str) -> Self {
        Self {
            arc_length: normalized.abs(),
            indicator_offset_y: normalized * VELOCITY_INDICATOR_TRAVEL,
            color: color.to_string(),
        }
    }
}

/// Vehicle climbing away from the earth with three orbit rings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AltitudeGauge {
    /// Vertical vehicle offset.
    pub vehicle_offset_y: f64,
    /// Zoom of the whole scene; the view zooms out as the vehicle climbs.
    pub group_scale: f64,
    /// Opacity of the inner, middle and outer orbit.
    pub band_opacities: [f64; 3],
    /// Vehicle fill color.
    pub color: String,
}

impl AltitudeGauge {
    /// Scene layout for a normalized altitude in `[0, 1]`.
    pub fn new(normalized: f64, color: &str) -> Self {
        Self {
            vehicle_offset_y: normalized * ALTITUDE_VEHICLE_TRAVEL,
            group_scale: 2.0 - normalized,
            band_opacities: [
                band_opacity(normalized, FLOOR_BAND_THRESHOLD, FIRST_BAND_THRESHOLD),
                band_opacity(normalized, FIRST_BAND_THRESHOLD, SECOND_BAND_THRESHOLD),
                band_opacity(normalized, SECOND_BAND_THRESHOLD, THIRD_BAND_THRESHOLD),
            ],
            color: color.to_string(),
        }
    }
}

/// Sliding thermometer scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureGauge {
    /// Horizontal scale offset.
    pub scale_offset_x: f64,
    /// Background fill color.
    pub color: String,
}

impl TemperatureGauge {
    /// Scale position for a normalized temperature.
    pub fn new(normalized: f64, color: &str) -> Self {
        Self {
            scale_offset_x: normalized * TEMPERATURE_SCALE_TRAVEL,
            color: color.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_band_opacity_edges() {
        assert!(close(band_opacity(0.1, 0.2, 0.5), 0.0));
        assert!(close(band_opacity(0.6, 0.2, 0.5), BAND_MAX_OPACITY));
        assert!(close(band_opacity(0.35, 0.2, 0.5), 0.45));
        assert!(close(band_opacity(0.2, 0.2, 0.5), 0.0));
    }

    #[test]
    fn test_altitude_gauge_midway() {
        let gauge = AltitudeGauge::new(0.5, "#fff");
        assert!(close(gauge.vehicle_offset_y, -150.0));
        assert!(close(gauge.group_scale, 1.5));
        assert!(close(gauge.band_opacities[0], BAND_MAX_OPACITY));
        assert!(close(gauge.band_opacities[1], 0.0));
        assert!(close(gauge.band_opacities[2], 0.0));
    }

    #[test]
    fn test_velocity_gauge_uses_magnitude() {
        let gauge = VelocityGauge::new(-0.4, "#000");
        assert!(close(gauge.arc_length, 0.4));
        assert!(close(gauge.indicator_offset_y, 40.0));
    }

    #[test]
    fn test_temperature_gauge_offset() {
        let gauge = TemperatureGauge::new(-1.0, "#000");
        assert!(close(gauge.scale_offset_x, -500.0));
    }
}
