//! Reply correlation for one in-flight command.
//!
//! The board answers an addressed command with up to three kinds of frame,
//! all echoing the command's id and opcode:
//!
//! - `R`: the command was parsed;
//! - `D`: values reported while the operation runs;
//! - `C`: the operation finished.
//!
//! Queries (firmware version, ADC, port status, pulse count) also send their
//! data, either embedded after the opcode or as a separate frame right after
//! the `R` reply (`RI00FW*` then `PTHAT 5.3*`).
//!
//! [`Exchange`] is fed classified frames one by one and claims the ones that
//! belong to its command. It does no I/O.

use pthat_core::types::{CommandId, Header};

use crate::commands::Command;
use crate::opcode::Opcode;
use crate::response::{self, Payload, Reply, ReplyClass, Response};

/// How far an exchange must get before the caller stops waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Await {
    /// Return as soon as the command is written.
    Nothing,
    /// Wait for the `R` reply (and the payload, for queries).
    #[default]
    Received,
    /// Wait for the `C` reply (and the payload, for queries).
    Completed,
}

/// The replies collected so far for one sent command.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    opcode: Option<Opcode>,
    id: CommandId,
    received: bool,
    completed: bool,
    data: Vec<Reply>,
    payload: Payload,
}

impl Exchange {
    /// Start correlating replies for `opcode` sent with `id`.
    ///
    /// `opcode` is `None` for the headerless reset and buffer commands, which
    /// the board never answers; such an exchange is satisfied immediately.
    pub fn new(opcode: Option<Opcode>, id: CommandId) -> Self {
        Exchange {
            opcode,
            id,
            received: false,
            completed: false,
            data: Vec::new(),
            payload: Payload::None,
        }
    }

    pub fn for_command(command: &Command, header: Header) -> Self {
        Exchange::new(command.opcode(), header.id)
    }

    pub fn opcode(&self) -> Option<Opcode> {
        self.opcode
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn is_received(&self) -> bool {
        self.received
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// `D` replies, in arrival order.
    pub fn data_replies(&self) -> &[Reply] {
        &self.data
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Offer a frame to this exchange.
    ///
    /// Returns `true` if the frame belongs to this command and was recorded,
    /// `false` if it should be handled elsewhere.
    pub fn accept(&mut self, frame: &Response) -> bool {
        let Some(opcode) = self.opcode else {
            return false;
        };

        match frame {
            Response::Reply(reply) => {
                if reply.id != self.id || reply.opcode != Some(opcode) {
                    return false;
                }
                match reply.class {
                    ReplyClass::Received | ReplyClass::Buffer => self.received = true,
                    ReplyClass::Completed => self.completed = true,
                    ReplyClass::Data => {
                        self.data.push(reply.clone());
                        return true;
                    }
                }
                if self.payload.is_none() && !reply.payload.is_none() {
                    self.payload = reply.payload.clone();
                }
                true
            }
            // A standalone payload only counts once the command is acknowledged.
            _ if !self.wants_payload() || !(self.received || self.completed) => false,
            Response::PulseCount(report) => match opcode {
                Opcode::PulseCount(axis) if report.axis == axis => {
                    self.payload = Payload::PulseCount(*report);
                    true
                }
                _ => false,
            },
            Response::PortStatus(status) if opcode == Opcode::PortStatus => {
                self.payload = Payload::PortStatus(*status);
                true
            }
            Response::PortStatus(_) => false,
            Response::Unrecognized(text) => match response::decode_payload(opcode, text) {
                Payload::None | Payload::Opaque(_) => false,
                decoded => {
                    self.payload = decoded;
                    true
                }
            },
        }
    }

    /// Whether the exchange has progressed far enough for `wait`.
    pub fn is_satisfied(&self, wait: Await) -> bool {
        if self.opcode.is_none() {
            return true;
        }
        let acknowledged = match wait {
            Await::Nothing => return true,
            // A completion implies the command was received, even when
            // received replies are switched off.
            Await::Received => self.received || self.completed,
            Await::Completed => self.completed,
        };
        acknowledged && !self.wants_payload()
    }

    fn wants_payload(&self) -> bool {
        self.payload.is_none() && self.opcode.is_some_and(|op| op.expects_payload())
    }
}
