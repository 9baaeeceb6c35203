//! Transport trait for board communication.
//!
//! The [`Transport`] trait abstracts over the byte link to a Pulse Train Hat.
//! The board only ever speaks over a serial line, but opening and configuring
//! that line is the caller's business: the protocol engine in the `pthat`
//! crate operates on a `Transport` so that it can be driven by a real port
//! or by `MockTransport` from `pthat-test-harness`.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to the board.
///
/// Implementations only move bytes. Frame boundaries, reply classification,
/// and correlation are handled by the protocol engine that consumes this
/// trait, so a `receive` may return any fraction of a frame or several
/// frames at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the board.
    ///
    /// Implementations should wait until all bytes have been handed to the
    /// underlying link.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the board into the provided buffer.
    ///
    /// Returns the number of bytes read. Waits up to `timeout` for data to
    /// arrive; returns [`Error::Timeout`](crate::error::Error::Timeout) if
    /// nothing arrives within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport.
    ///
    /// After `close()`, subsequent `send()` and `receive()` calls should
    /// return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
