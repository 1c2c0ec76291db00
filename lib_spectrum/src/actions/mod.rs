//! # Actions Module
//!
//! Operator commands sent back to the vehicle backend.
//!
//! ## Contained Modules:
//! - **`act_on_spectrum`**: the single operator action (bodiless `GET /ActOnSpectrum`),
//!   gated on the vehicle asking for it and on no other request being in flight.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The `ActOnSpectrum` trigger.
pub mod act_on_spectrum;

pub use act_on_spectrum::{ActionError, ActionOutcome, ActionTrigger, ACTION_ENDPOINT};
