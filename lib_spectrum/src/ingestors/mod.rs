//! # Data Ingestors Module
//!
//! Clients that pull live data into the dashboard. Each submodule owns one data
//! source and hides its transport behind a subscription handle.
//!
//! ## Contained Modules:
//! - **`spectrum_ws`**: the WebSocket client for the `SpectrumWS` vehicle state
//!   feed, with parse/connection error reporting and an optional reconnect policy.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The WebSocket client for the live vehicle state feed.
pub mod spectrum_ws;

// --- Public API Re-exports ---
pub use spectrum_ws::{
    FeedConfig, FeedError, FeedEvent, FeedState, FeedSubscription, ReconnectPolicy, SpectrumFeed,
};
