//! # Data Retrieval Module
//!
//! HTTP clients used to pull one-off data from the vehicle backend, next to the
//! live WebSocket feed.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: A generic HTTP `ApiClient` built on `reqwest` and
//!   `reqwest-middleware`, featuring automatic retries with exponential
//!   backoff and a per-request timeout.
//! - **`status`**: One-shot fetch of the current `VehicleState` from the
//!   `SpectrumStatus` endpoint.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic HTTP API client with retry middleware for resilient network requests.
pub mod ky_http;

/// Snapshot retrieval from the `SpectrumStatus` endpoint.
pub mod status;

pub use ky_http::{ApiClient, ApiClientOptions, ApiResponse};
pub use status::{fetch_vehicle_state, STATUS_ENDPOINT};
