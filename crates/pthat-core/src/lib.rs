//! pthat-core: Core traits, types, and error definitions for the Pulse Train Hat.
//!
//! This crate holds the pieces that every layer of the library agrees on: the
//! error taxonomy, the byte-level [`Transport`] abstraction, the small wire
//! types (axes, channels, command headers), and the motion conversions between
//! RPM and pulse frequency.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`Header`] -- the `<mode><id>` prefix shared by commands and replies
//! - [`Axis`] / [`AxisSelector`] -- pulse-train outputs
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod helpers;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use pthat_core::*`.
pub use error::{Error, Result, ValidationError};
pub use helpers::{
    calculate_pulse_count, calculate_revolutions, frequency_to_rpm, ramp_increment_frequency,
    rpm_to_frequency,
};
pub use transport::Transport;
pub use types::*;
