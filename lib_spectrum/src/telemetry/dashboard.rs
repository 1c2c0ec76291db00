//! # Dashboard Frame
//!
//! One explicit projection per snapshot: every widget reading, its severity and
//! color, and the gauge parameters, computed in a single pure call. Renderers
//! draw a frame and keep no state of their own.

use serde::Serialize;

use super::gauges::{AltitudeGauge, TemperatureGauge, VelocityGauge};
use super::normalize::{normalize_or_default, ColorTable, NormalizedResult, Severity};
use super::vehicle_config::{VehicleConfig, VehicleValueConfig};
use super::vehicle_state::VehicleState;

/// Placeholder shown when the feed has not delivered anything yet.
pub const NO_DATA: &str = "-";

/// A single numeric widget card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetReading {
    /// Card title.
    pub title: &'static str,
    /// Unit suffix.
    pub unit: &'static str,
    /// Raw value, `None` before the first snapshot.
    pub raw: Option<f64>,
    /// Text shown on the card, two decimals plus unit.
    pub display: String,
    /// Normalization output driving the gauge.
    pub result: NormalizedResult,
    /// Resolved severity.
    pub severity: Severity,
    /// Color for the severity.
    pub color: String,
}

impl WidgetReading {
    fn new(
        title: &'static str,
        unit: &'static str,
        raw: Option<f64>,
        config: &VehicleValueConfig,
        colors: &ColorTable,
    ) -> Self {
        let result = normalize_or_default(raw, config);
        let severity = result.severity();
        Self {
            title,
            unit,
            raw,
            display: format_value(raw, unit),
            result,
            severity,
            color: colors.get(severity).to_string(),
        }
    }
}

/// `12.50 m/s`, or `- m/s` when there is no value.
pub fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.2} {unit}"),
        None => format!("{NO_DATA} {unit}"),
    }
}

/// Everything a renderer needs for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    /// Vehicle status line, `-` before the first snapshot.
    pub status_message: String,
    /// Operator action is required; the action card and background switch to error styling.
    pub is_action_required: bool,
    /// `None` before the first snapshot.
    pub is_ascending: Option<bool>,
    /// Velocity card.
    pub velocity: WidgetReading,
    /// Temperature card.
    pub temperature: WidgetReading,
    /// Altitude card.
    pub altitude: WidgetReading,
    /// Velocity arc.
    pub velocity_gauge: VelocityGauge,
    /// Altitude scene.
    pub altitude_gauge: AltitudeGauge,
    /// Thermometer.
    pub temperature_gauge: TemperatureGauge,
}

impl DashboardFrame {
    /// Builds the frame for `state`, or the resting frame when no data arrived yet.
    pub fn build(state: Option<&VehicleState>, config: &VehicleConfig, colors: &ColorTable) -> Self {
        let velocity = WidgetReading::new("Velocity", "m/s", state.map(|s| s.velocity), &config.velocity, colors);
        let temperature = WidgetReading::new(
            "Temperature",
            "°C",
            state.map(|s| s.temperature),
            &config.temperature,
            colors,
        );
        let altitude = WidgetReading::new("Altitude", "m", state.map(|s| s.altitude), &config.altitude, colors);

        let velocity_gauge = VelocityGauge::new(velocity.result.normalized_value, &velocity.color);
        let altitude_gauge = AltitudeGauge::new(altitude.result.normalized_value, &altitude.color);
        let temperature_gauge = TemperatureGauge::new(temperature.result.normalized_value, &temperature.color);

        Self {
            status_message: state
                .map(|s| s.status_message.clone())
                .unwrap_or_else(|| NO_DATA.to_string()),
            is_action_required: state.is_some_and(|s| s.is_action_required),
            is_ascending: state.map(|s| s.is_ascending),
            velocity,
            temperature,
            altitude,
            velocity_gauge,
            altitude_gauge,
            temperature_gauge,
        }
    }

    /// Worst severity across all widgets.
    pub fn worst_severity(&self) -> Severity {
        [self.velocity.severity, self.temperature.severity, self.altitude.severity]
            .into_iter()
            .max()
            .unwrap_or(Severity::Normal)
    }

    /// The three cards in display order.
    pub fn widgets(&self) -> [&WidgetReading; 3] {
        [&self.velocity, &self.temperature, &self.altitude]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(velocity: f64) -> VehicleState {
        VehicleState {
            velocity,
            altitude: -40000.0,
            temperature: 0.0,
            status_message: "Max Q".to_string(),
            is_ascending: true,
            is_action_required: false,
        }
    }

    #[test]
    fn test_resting_frame_without_data() {
        let frame = DashboardFrame::build(None, &VehicleConfig::default(), &ColorTable::default());
        assert_eq!(frame.status_message, NO_DATA);
        assert!(!frame.is_action_required);
        assert_eq!(frame.velocity.display, "- m/s");
        assert_eq!(frame.is_ascending, None);
        assert!((frame.altitude.result.normalized_value - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_from_snapshot() {
        let colors = ColorTable::default();
        let frame = DashboardFrame::build(Some(&sample(80.0)), &VehicleConfig::default(), &colors);

        assert_eq!(frame.status_message, "Max Q");
        assert_eq!(frame.velocity.display, "80.00 m/s");
        assert_eq!(frame.velocity.severity, Severity::Warning);
        assert_eq!(frame.velocity_gauge.color, colors.warning);
        assert!((frame.altitude_gauge.group_scale - 1.5).abs() < 1e-9);
        assert_eq!(frame.worst_severity(), Severity::Warning);
    }

    #[test]
    fn test_zero_is_displayed_as_a_value() {
        let frame = DashboardFrame::build(Some(&sample(0.0)), &VehicleConfig::default(), &ColorTable::default());
        assert_eq!(frame.velocity.display, "0.00 m/s");
        assert_eq!(frame.temperature.display, "0.00 °C");
    }

    #[test]
    fn test_danger_dominates_worst_severity() {
        let frame = DashboardFrame::build(Some(&sample(99.0)), &VehicleConfig::default(), &ColorTable::default());
        assert_eq!(frame.worst_severity(), Severity::Danger);
        assert_eq!(frame.widgets()[0].title, "Velocity");
    }
}
