//! Pulse Train Hat (PTHat) serial protocol for Rust.
//!
//! The PTHat is a four-axis pulse generator driven by short ASCII commands
//! terminated by `*`. This crate provides:
//!
//! - **Field codec** ([`fields`]) -- fixed-width numeric fields with range
//!   validation.
//! - **Command model** ([`commands`], [`opcode`]) -- every operation the board
//!   understands, rendered against a `<mode><id>` header.
//! - **Framing** ([`protocol`]) -- split a chunked byte stream into frames.
//! - **Classification** ([`response`]) -- turn frames into replies, pulse-count
//!   reports and port-status reports.
//! - **Axis guard** ([`axis`]) -- per-axis command construction that never
//!   issues a redundant start, stop, pause or resume.
//! - **Correlation** ([`exchange`]) -- match replies to the command in flight.
//! - **Controller** ([`controller`], [`builder`]) -- async driver over any
//!   [`Transport`](pthat_core::Transport), with unsolicited frames broadcast as
//!   [`PtHatEvent`]s.
//!
//! # Example
//!
//! ```
//! use pthat::commands::Command;
//! use pthat::protocol::FrameDecoder;
//! use pthat::response::{classify, Response};
//! use pthat_core::{Axis, Header};
//!
//! // Build a "start X" command
//! let wire = Command::Start(Axis::X.into()).render(Header::default()).unwrap();
//! assert_eq!(wire, "I00SX*");
//!
//! // Replies may arrive split at any byte
//! let mut decoder = FrameDecoder::new();
//! assert!(decoder.feed(b"RI00S").is_empty());
//! let frames = decoder.feed(b"X*CI00SX*");
//! assert_eq!(frames, ["RI00SX", "CI00SX"]);
//! assert!(matches!(classify(&frames[1]), Response::Reply(_)));
//! ```

pub mod axis;
pub mod builder;
pub mod commands;
pub mod controller;
pub mod events;
pub mod exchange;
pub mod fields;
pub mod opcode;
pub mod protocol;
pub mod response;

// Re-export the primary types for ergonomic `use pthat::*`.
pub use axis::AxisControl;
pub use builder::PtHatBuilder;
pub use commands::{AxisConfig, BufferOp, Command, PulseReportConfig, PwmSetting};
pub use controller::PtHat;
pub use events::PtHatEvent;
pub use exchange::{Await, Exchange};
pub use opcode::Opcode;
pub use protocol::FrameDecoder;
pub use response::{Payload, Reply, ReplyClass, Response, classify};
