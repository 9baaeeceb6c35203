//! Error types for the Pulse Train Hat library.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Field validation, transport, and
//! protocol failures are all captured here.
//!
//! Two conditions that look like errors are deliberately *not* errors:
//!
//! - An incomplete frame is simply "more bytes needed"; the frame decoder
//!   returns an empty list instead of failing.
//! - A frame with an unknown opcode is preserved as opaque data by the
//!   response classifier and surfaced to the caller.

use std::fmt;

/// A command field was outside its documented range.
///
/// The enclosing command is never rendered: a build that fails validation
/// returns this error instead of a partial wire string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} {value} out of range ({range})")]
pub struct ValidationError {
    /// Name of the offending field (e.g. `"ramp divide"`).
    pub field: &'static str,
    /// The rejected value, formatted for display.
    pub value: String,
    /// The accepted range, formatted for display (e.g. `"0..=255"`).
    pub range: String,
}

impl ValidationError {
    /// Build a validation error for `field` whose `value` lies outside `min..=max`.
    pub fn out_of_range<V, R>(field: &'static str, value: V, min: R, max: R) -> Self
    where
        V: fmt::Display,
        R: fmt::Display,
    {
        ValidationError {
            field,
            value: value.to_string(),
            range: format!("{min}..={max}"),
        }
    }
}

/// The error type for all Pulse Train Hat operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A command field failed range validation; nothing was sent.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A transport-level error (serial port write failure, closed link).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (unexpected reply, mock mismatch).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a reply from the board.
    ///
    /// This typically indicates the board is unpowered, the baud rate is
    /// wrong, or received/completed replies have been switched off.
    #[error("timeout waiting for response")]
    Timeout,

    /// No connection to the board has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the board was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
