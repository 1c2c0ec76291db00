//! # Loggers Module
//!
//! Process-wide `tracing` setup shared by the dashboard binaries.
//!
//! ## Contained Modules:
//! - **`setup`**: installs a console layer plus a JSON file layer behind an
//!   `EnvFilter`, and prunes log files left over from earlier runs.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Subscriber installation and log file housekeeping.
pub mod setup;

pub use setup::{cleanup_old_logs, prepare_log_file, setup_logging};
