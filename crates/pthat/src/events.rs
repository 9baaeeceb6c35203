//! Events broadcast by the [`PtHat`](crate::PtHat) controller.

use pthat_core::types::{IoPortStatus, PulseCountReport};

use crate::response::{Reply, ReplyClass, Response};

/// A frame that arrived outside the command it belongs to, or a change in
/// the controller's connection.
///
/// Typical sources are `C` replies for motion that was started without
/// waiting for completion, `D` replies from an armed auto pulse report, and
/// bare pulse-count frames.
#[derive(Debug, Clone, PartialEq)]
pub enum PtHatEvent {
    /// A reply that did not belong to the command in flight.
    Reply {
        /// The classified reply, including any embedded payload.
        reply: Reply,
    },

    /// A `D` reply reported while an operation runs.
    Data {
        /// The classified reply.
        reply: Reply,
    },

    /// A bare pulse-count report.
    PulseCount {
        /// Axis, direction and count as reported.
        report: PulseCountReport,
    },

    /// A bare IO port status report.
    PortStatus {
        /// Emergency-stop and limit-switch inputs.
        status: IoPortStatus,
    },

    /// A frame that could not be classified.
    Unrecognized {
        /// The frame text, without its terminator.
        frame: String,
    },

    /// The board was sent a reset and the frame buffer was cleared.
    Reset,

    /// The transport was closed.
    Disconnected,
}

impl From<Response> for PtHatEvent {
    fn from(response: Response) -> Self {
        match response {
            Response::Reply(reply) if reply.class == ReplyClass::Data => PtHatEvent::Data { reply },
            Response::Reply(reply) => PtHatEvent::Reply { reply },
            Response::PulseCount(report) => PtHatEvent::PulseCount { report },
            Response::PortStatus(status) => PtHatEvent::PortStatus { status },
            Response::Unrecognized(frame) => PtHatEvent::Unrecognized { frame },
        }
    }
}
