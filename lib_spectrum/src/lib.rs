//! # lib_spectrum
//!
//! Shared building blocks for the Spectrum telemetry dashboard. Each top-level
//! folder is gated behind a cargo feature of the same name so binaries only
//! compile what they use (`full` enables everything).

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

// Declare the modules to re-export
#[cfg(feature = "telemetry")]
pub mod telemetry;

#[cfg(feature = "ingestors")]
pub mod ingestors;

#[cfg(feature = "retrieve")]
pub mod retrieve;

#[cfg(feature = "actions")]
pub mod actions;

#[cfg(feature = "loggers")]
pub mod loggers;

// Re-export the types most consumers reach for
#[cfg(feature = "telemetry")]
pub use telemetry::{
    dashboard::DashboardFrame,
    normalize::{color_for, normalize, ColorTable, NormalizedResult, Severity},
    vehicle_config::{VehicleConfig, VehicleValueConfig},
    vehicle_state::VehicleState,
};

#[cfg(feature = "ingestors")]
pub use ingestors::spectrum_ws::{
    FeedConfig, FeedError, FeedEvent, FeedState, FeedSubscription, ReconnectPolicy, SpectrumFeed,
};

#[cfg(feature = "retrieve")]
pub use retrieve::{fetch_vehicle_state, ApiClient, ApiClientOptions, ApiResponse};

#[cfg(feature = "actions")]
pub use actions::{ActionError, ActionOutcome, ActionTrigger};

#[cfg(feature = "loggers")]
pub use loggers::setup_logging;
