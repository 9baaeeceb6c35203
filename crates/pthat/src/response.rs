//! Response classification.
//!
//! A frame from the board is one of:
//!
//! - a reply to a command: `<class><mode?><id:2><opcode:2><payload?>`, for
//!   example `RI01CX`, `CI01SX`, `DI00JX` or `R00KX` (some firmware omits the
//!   mode letter);
//! - a bare pulse-count report: `<axis>P<dir>[<axis>]<count:10>`, sent after
//!   a pulse-count request or while an auto report is armed;
//! - a bare port-status report: `L<es><x><y><z><e>`;
//! - anything else, such as the free-text firmware version that follows an
//!   `RI00FW` reply, which is kept verbatim as [`Response::Unrecognized`].
//!
//! Classification never fails. Unknown opcodes and payloads are preserved as
//! opaque text so that callers can still correlate and inspect them.

use std::fmt;

use pthat_core::types::{Axis, CommandId, CommandMode, Direction, IoPortStatus, PulseCountReport};

use crate::fields::{self, IntField};
use crate::opcode::Opcode;

const REPORTED_PULSE_COUNT: IntField = IntField::new("pulse count", 10, 0, u32::MAX as u64);

/// The first character of a reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyClass {
    /// `R`: the board parsed the command.
    Received,
    /// `C`: the addressed operation finished.
    Completed,
    /// `D`: a value reported while the operation runs.
    Data,
    /// `B`: buffer-protocol acknowledgement.
    Buffer,
}

impl ReplyClass {
    pub fn as_char(&self) -> char {
        match self {
            ReplyClass::Received => 'R',
            ReplyClass::Completed => 'C',
            ReplyClass::Data => 'D',
            ReplyClass::Buffer => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'R' => Some(ReplyClass::Received),
            'C' => Some(ReplyClass::Completed),
            'D' => Some(ReplyClass::Data),
            'B' => Some(ReplyClass::Buffer),
            _ => None,
        }
    }
}

/// Structured data carried by a reply, or by the frame that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    None,
    Firmware(String),
    Adc(u32),
    PulseCount(PulseCountReport),
    PortStatus(IoPortStatus),
    /// Text after an unknown opcode, or a payload that did not match the
    /// expected shape for its opcode.
    Opaque(String),
}

impl Payload {
    pub fn is_none(&self) -> bool {
        matches!(self, Payload::None)
    }
}

/// A reply frame echoing the header and opcode of the command that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub class: ReplyClass,
    /// `None` when the board omitted the mode letter.
    pub mode: Option<CommandMode>,
    pub id: CommandId,
    /// `None` when the opcode is not one this library knows.
    pub opcode: Option<Opcode>,
    pub payload: Payload,
}

/// One classified frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Reply(Reply),
    PulseCount(PulseCountReport),
    PortStatus(IoPortStatus),
    Unrecognized(String),
}

impl Response {
    /// Return the reply, if this frame is one.
    pub fn as_reply(&self) -> Option<&Reply> {
        match self {
            Response::Reply(reply) => Some(reply),
            _ => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Reply(r) => {
                write!(f, "{}", r.class.as_char())?;
                if let Some(mode) = r.mode {
                    write!(f, "{mode}")?;
                }
                write!(f, "{}", r.id)?;
                if let Some(op) = r.opcode {
                    write!(f, "{op}")?;
                }
                match &r.payload {
                    Payload::None => Ok(()),
                    other => write!(f, " {other:?}"),
                }
            }
            Response::PulseCount(p) => write!(
                f,
                "{}P{}{:010}",
                p.axis,
                p.direction.digit(),
                p.count
            ),
            Response::PortStatus(s) => write!(f, "L{}", port_status_digits(s)),
            Response::Unrecognized(text) => write!(f, "{text}"),
        }
    }
}

/// Classify a single frame (without its terminator).
pub fn classify(frame: &str) -> Response {
    if let Some(report) = parse_bare_pulse_count(frame) {
        return Response::PulseCount(report);
    }
    if let Some(status) = frame.strip_prefix('L').and_then(parse_port_status_bits) {
        return Response::PortStatus(status);
    }
    match parse_reply(frame) {
        Some(reply) => Response::Reply(reply),
        None => Response::Unrecognized(frame.to_string()),
    }
}

/// Decode the payload text that belongs to `opcode`.
///
/// Used both for text embedded after the opcode in a reply and for the
/// standalone frame some queries send after their received reply.
pub fn decode_payload(opcode: Opcode, text: &str) -> Payload {
    if text.is_empty() {
        return Payload::None;
    }
    let decoded = match opcode {
        Opcode::FirmwareVersion => Some(Payload::Firmware(text.to_string())),
        Opcode::Adc(_) => parse_adc(text).map(Payload::Adc),
        Opcode::PulseCount(axis) => {
            parse_bare_pulse_count(text)
                .filter(|r| r.axis == axis)
                .or_else(|| parse_pulse_count_fields(axis, text))
                .map(Payload::PulseCount)
        }
        Opcode::PortStatus => parse_port_status(text).map(Payload::PortStatus),
        _ => None,
    };
    decoded.unwrap_or_else(|| Payload::Opaque(text.to_string()))
}

fn parse_reply(frame: &str) -> Option<Reply> {
    let mut chars = frame.chars();
    let class = ReplyClass::from_char(chars.next()?)?;
    let mut rest = chars.as_str();

    let mode = rest.chars().next().and_then(CommandMode::from_char);
    if mode.is_some() {
        rest = &rest[1..];
    }

    let id_text = rest.get(..2)?;
    if !id_text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = CommandId::new(id_text.parse().ok()?).ok()?;
    let rest = &rest[2..];

    let (opcode, payload) = match Opcode::parse(rest) {
        Some((op, tail)) => (Some(op), decode_payload(op, tail)),
        None if rest.is_empty() => (None, Payload::None),
        None => (None, Payload::Opaque(rest.to_string())),
    };

    Some(Reply {
        class,
        mode,
        id,
        opcode,
        payload,
    })
}

/// `<axis>P<dir>[<axis>]<count:10>`
fn parse_bare_pulse_count(text: &str) -> Option<PulseCountReport> {
    let mut chars = text.chars();
    let axis = Axis::from_letter(chars.next()?)?;
    if chars.next()? != 'P' {
        return None;
    }
    parse_pulse_count_fields(axis, chars.as_str())
}

/// `<dir>[<axis>]<count:10>`
fn parse_pulse_count_fields(axis: Axis, text: &str) -> Option<PulseCountReport> {
    let mut chars = text.chars();
    let direction = Direction::from_digit(chars.next()?.to_digit(10)? as u8)?;
    let mut rest = chars.as_str();
    if let Some(tail) = rest.strip_prefix(axis.letter()) {
        rest = tail;
    }
    let count = REPORTED_PULSE_COUNT.decode(rest)?;
    Some(PulseCountReport {
        axis,
        direction,
        count: u32::try_from(count).ok()?,
    })
}

/// Five `0`/`1` digits, with or without the leading `L`.
fn parse_port_status(text: &str) -> Option<IoPortStatus> {
    parse_port_status_bits(text.strip_prefix('L').unwrap_or(text))
}

fn parse_port_status_bits(bits: &str) -> Option<IoPortStatus> {
    let mut chars = bits.chars();
    let mut next = || fields::decode_flag(chars.next()?);
    let status = IoPortStatus {
        emergency_stop: next()?,
        x_limit: next()?,
        y_limit: next()?,
        z_limit: next()?,
        e_limit: next()?,
    };
    chars.as_str().is_empty().then_some(status)
}

fn parse_adc(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn port_status_digits(s: &IoPortStatus) -> String {
    [s.emergency_stop, s.x_limit, s.y_limit, s.z_limit, s.e_limit]
        .iter()
        .map(|&on| fields::encode_flag(on))
        .collect()
}
