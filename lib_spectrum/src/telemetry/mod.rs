//! # Telemetry Module
//!
//! Everything needed to turn a raw feed snapshot into something a display can
//! draw. The pieces are pure and synchronous; they hold no shared mutable state
//! and can be called from any number of tasks at once.
//!
//! ## Contained Modules:
//! - **`vehicle_state`**: the `VehicleState` record and its wire contract.
//! - **`vehicle_config`**: the static per-parameter range and threshold table.
//! - **`normalize`**: value normalization, warning/danger classification and
//!   severity colors.
//! - **`gauges`**: visual parameters each gauge animates, derived from a
//!   normalized value.
//! - **`dashboard`**: the per-snapshot projection used by renderers.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The fixed-shape vehicle state delivered by the feed.
pub mod vehicle_state;
/// Range and threshold configuration per monitored parameter.
pub mod vehicle_config;
/// Normalization and threshold classification engine.
pub mod normalize;
/// Gauge animation parameters.
pub mod gauges;
/// Dashboard frame assembled from a snapshot.
pub mod dashboard;
