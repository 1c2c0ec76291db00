//! # Vehicle State
//!
//! The record pushed by the telemetry backend on every feed message. A new
//! message fully replaces the previous snapshot; there is no merge or patch.
//!
//! ## Wire contract
//! Only the PascalCase shape is accepted:
//!
//! ```json
//! {"Velocity":12.5,"Altitude":-1500.0,"Temperature":4.2,
//!  "StatusMessage":"Nominal","IsAscending":true,"IsActionRequired":false}
//! ```
//!
//! Every field is required. Extra fields are ignored.

use serde::{Deserialize, Serialize};

/// Snapshot of the launch vehicle as reported by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VehicleState {
    /// Velocity in m/s.
    pub velocity: f64,
    /// Altitude change in m (negative while climbing).
    pub altitude: f64,
    /// Temperature in °C.
    pub temperature: f64,
    /// Free text status line from the vehicle.
    pub status_message: String,
    /// Whether the vehicle is currently ascending.
    pub is_ascending: bool,
    /// Whether the operator must act on the vehicle.
    pub is_action_required: bool,
}

impl VehicleState {
    /// Parses one feed message.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parses one feed message delivered as raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
