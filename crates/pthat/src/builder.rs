//! PtHatBuilder -- fluent builder for constructing [`PtHat`] instances.
//!
//! # Example
//!
//! ```no_run
//! use pthat::builder::PtHatBuilder;
//! use pthat_core::CommandMode;
//! use std::time::Duration;
//!
//! # async fn example(transport: Box<dyn pthat_core::Transport>) -> pthat_core::Result<()> {
//! let pthat = PtHatBuilder::new()
//!     .mode(CommandMode::Instant)
//!     .command_id(1)
//!     .command_timeout(Duration::from_secs(1))
//!     .build_with_transport(transport)
//!     .await?;
//! println!("{}", pthat.firmware_version().await?);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use pthat_core::error::Result;
use pthat_core::transport::Transport;
use pthat_core::types::{CommandId, CommandMode, Header};

use crate::controller::PtHat;

/// Fluent builder for [`PtHat`].
///
/// Defaults: instant mode, command id `00`, a 2 second command timeout and
/// room for 256 queued events per subscriber.
#[derive(Debug, Clone)]
pub struct PtHatBuilder {
    mode: CommandMode,
    command_id: u8,
    command_timeout: Duration,
    event_capacity: usize,
}

impl PtHatBuilder {
    pub fn new() -> Self {
        PtHatBuilder {
            mode: CommandMode::Instant,
            command_id: 0,
            command_timeout: Duration::from_secs(2),
            event_capacity: 256,
        }
    }

    /// Instant (`I`) or buffered (`B`) execution for every command sent.
    pub fn mode(mut self, mode: CommandMode) -> Self {
        self.mode = mode;
        self
    }

    /// Command id echoed in every reply, 0-99. Checked at build time.
    pub fn command_id(mut self, id: u8) -> Self {
        self.command_id = id;
        self
    }

    /// Set the timeout for waiting for the replies to a single command
    /// (default: 2s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Events each subscriber can fall behind by before it starts missing
    /// them (default: 256, minimum 1).
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Build a [`PtHat`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a `MockTransport`
    /// from `pthat-test-harness`) and for callers that open the serial port
    /// themselves.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<PtHat> {
        let id = CommandId::new(self.command_id)?;
        Ok(PtHat::new(
            transport,
            Header::new(self.mode, id),
            self.command_timeout,
            self.event_capacity,
        ))
    }
}

impl Default for PtHatBuilder {
    fn default() -> Self {
        Self::new()
    }
}
