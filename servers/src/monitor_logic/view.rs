//! Last snapshot shown to the operator, whether it came from the feed or a
//! status refresh.

use lib_spectrum::{ColorTable, DashboardFrame, VehicleConfig, VehicleState};

use super::console;

pub struct DashboardView {
    vehicle_config: VehicleConfig,
    colors: ColorTable,
    latest: Option<VehicleState>,
}

impl DashboardView {
    pub fn new(vehicle_config: VehicleConfig, colors: ColorTable) -> Self {
        Self {
            vehicle_config,
            colors,
            latest: None,
        }
    }

    /// Dashboard for the current snapshot, resting values before any data.
    pub fn render_current(&self) -> String {
        let frame = DashboardFrame::build(self.latest.as_ref(), &self.vehicle_config, &self.colors);
        console::render_frame(&frame, &self.vehicle_config)
    }

    /// Replaces the snapshot and returns the redrawn dashboard.
    pub fn show(&mut self, state: VehicleState) -> String {
        self.latest = Some(state);
        self.render_current()
    }

    pub fn action_required(&self) -> bool {
        self.latest.as_ref().is_some_and(|s| s.is_action_required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(action_required: bool) -> VehicleState {
        VehicleState {
            velocity: 40.0,
            altitude: -30000.0,
            temperature: 2.0,
            status_message: "Coasting".to_string(),
            is_ascending: true,
            is_action_required: action_required,
        }
    }

    #[test]
    fn test_no_action_before_any_snapshot() {
        let view = DashboardView::new(VehicleConfig::default(), ColorTable::default());
        assert!(!view.action_required());
        assert!(view.render_current().contains("no action required"));
    }

    #[test]
    fn test_refreshed_snapshot_enables_action() {
        let mut view = DashboardView::new(VehicleConfig::default(), ColorTable::default());
        view.show(state(false));
        assert!(!view.action_required());

        let text = view.show(state(true));
        assert!(view.action_required());
        assert!(text.contains("Coasting"));
        assert!(text.contains("ACTION REQUIRED"));
    }
}
