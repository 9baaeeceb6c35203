//! pthat-test-harness: Test utilities and mock transports for the PTHat
//! controller.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the protocol engine without a board attached, and [`MockHandle`] for
//! driving a mock after it has been moved into a controller.

pub mod mock_serial;

pub use mock_serial::{MockHandle, MockTransport};
