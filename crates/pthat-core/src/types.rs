//! Core types shared by the command model and the response classifier.
//!
//! Every type here maps to one or more characters of the board's ASCII wire
//! format. Types whose domain is a closed set (axes, channels, modes) are
//! enums so that an out-of-range selector cannot be constructed at all;
//! numeric fields with documented ranges are validated by the field codec
//! in the `pthat` crate instead.

use std::fmt;

use crate::error::ValidationError;

/// Whether the board executes a command immediately or queues it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandMode {
    /// Executed as soon as the board parses it (`I`).
    #[default]
    Instant,
    /// Queued in the board's buffer for sequential execution (`B`).
    Buffered,
}

impl CommandMode {
    /// The single wire character for this mode.
    pub fn as_char(&self) -> char {
        match self {
            CommandMode::Instant => 'I',
            CommandMode::Buffered => 'B',
        }
    }

    /// Parse a wire character back into a mode.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(CommandMode::Instant),
            'B' => Some(CommandMode::Buffered),
            _ => None,
        }
    }
}

impl fmt::Display for CommandMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Optional correlation token echoed back by the board in every reply.
///
/// Always rendered as two zero-padded digits (`00`-`99`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct CommandId(u8);

impl CommandId {
    /// The largest id the two-digit wire field can carry.
    pub const MAX: u8 = 99;

    /// Create a command id, rejecting values above 99.
    pub fn new(id: u8) -> Result<Self, ValidationError> {
        if id > Self::MAX {
            return Err(ValidationError::out_of_range("command id", id, 0, Self::MAX));
        }
        Ok(CommandId(id))
    }

    /// Return the raw numeric id.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// The `<mode><id>` prefix carried by every addressed command and reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Header {
    pub mode: CommandMode,
    pub id: CommandId,
}

impl Header {
    pub fn new(mode: CommandMode, id: CommandId) -> Self {
        Header { mode, id }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.mode, self.id)
    }
}

/// One of the board's four pulse-train outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

impl Axis {
    /// All four axes in wire order.
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// The wire letter for this axis.
    pub fn letter(&self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::E => 'E',
        }
    }

    /// Parse a wire letter back into an axis.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            'E' => Some(Axis::E),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Target of a start, stop, or pause/resume command: one axis or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisSelector {
    Single(Axis),
    /// Every axis at once (`A` on the wire).
    All,
}

impl AxisSelector {
    pub fn letter(&self) -> char {
        match self {
            AxisSelector::Single(axis) => axis.letter(),
            AxisSelector::All => 'A',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        if c == 'A' {
            return Some(AxisSelector::All);
        }
        Axis::from_letter(c).map(AxisSelector::Single)
    }
}

impl From<Axis> for AxisSelector {
    fn from(axis: Axis) -> Self {
        AxisSelector::Single(axis)
    }
}

impl fmt::Display for AxisSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Analog input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdcChannel {
    Adc1,
    Adc2,
}

impl AdcChannel {
    pub fn number(&self) -> u8 {
        match self {
            AdcChannel::Adc1 => 1,
            AdcChannel::Adc2 => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(AdcChannel::Adc1),
            2 => Some(AdcChannel::Adc2),
            _ => None,
        }
    }
}

/// Auxiliary digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxChannel {
    Aux1,
    Aux2,
    Aux3,
}

impl AuxChannel {
    pub fn number(&self) -> u8 {
        match self {
            AuxChannel::Aux1 => 1,
            AuxChannel::Aux2 => 2,
            AuxChannel::Aux3 => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(AuxChannel::Aux1),
            2 => Some(AuxChannel::Aux2),
            3 => Some(AuxChannel::Aux3),
            _ => None,
        }
    }
}

/// PWM output channel. The board drives PWM on the X and Y outputs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PwmChannel {
    X,
    Y,
}

impl PwmChannel {
    pub fn letter(&self) -> char {
        match self {
            PwmChannel::X => 'X',
            PwmChannel::Y => 'Y',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'X' => Some(PwmChannel::X),
            'Y' => Some(PwmChannel::Y),
            _ => None,
        }
    }
}

/// Direction of motor travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Clockwise (`0`).
    #[default]
    Forward,
    /// Counter-clockwise (`1`).
    Reverse,
}

impl Direction {
    pub fn digit(&self) -> u8 {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }

    pub fn from_digit(d: u8) -> Option<Self> {
        match d {
            0 => Some(Direction::Forward),
            1 => Some(Direction::Reverse),
            _ => None,
        }
    }
}

/// Logic level the motor driver's enable line is held at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnablePolarity {
    /// Enable line at 0 V (`0`).
    #[default]
    ZeroVolts,
    /// Enable line at 5 V (`1`).
    FiveVolts,
}

impl EnablePolarity {
    pub fn digit(&self) -> u8 {
        match self {
            EnablePolarity::ZeroVolts => 0,
            EnablePolarity::FiveVolts => 1,
        }
    }

    pub fn from_digit(d: u8) -> Option<Self> {
        match d {
            0 => Some(EnablePolarity::ZeroVolts),
            1 => Some(EnablePolarity::FiveVolts),
            _ => None,
        }
    }
}

/// Unit of a wait-delay command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DelayUnit {
    /// `WW`
    #[default]
    Milliseconds,
    /// `WM`
    Microseconds,
}

impl DelayUnit {
    pub fn letter(&self) -> char {
        match self {
            DelayUnit::Milliseconds => 'W',
            DelayUnit::Microseconds => 'M',
        }
    }
}

/// Per-axis on/off flags, rendered as four digits in X, Y, Z, E order.
///
/// Used by the auto pulse-count report and pause/resume commands to select
/// which axes send their pulse counts back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AxisMask {
    pub x: bool,
    pub y: bool,
    pub z: bool,
    pub e: bool,
}

impl AxisMask {
    pub const NONE: AxisMask = AxisMask {
        x: false,
        y: false,
        z: false,
        e: false,
    };

    pub const ALL: AxisMask = AxisMask {
        x: true,
        y: true,
        z: true,
        e: true,
    };

    /// A mask with only `axis` set.
    pub fn only(axis: Axis) -> Self {
        let mut mask = AxisMask::NONE;
        mask.set(axis, true);
        mask
    }

    pub fn get(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::E => self.e,
        }
    }

    pub fn set(&mut self, axis: Axis, on: bool) {
        match axis {
            Axis::X => self.x = on,
            Axis::Y => self.y = on,
            Axis::Z => self.z = on,
            Axis::E => self.e = on,
        }
    }
}

/// Current pulse count of one axis and the direction it is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PulseCountReport {
    pub axis: Axis,
    pub direction: Direction,
    pub count: u32,
}

/// State of the emergency-stop and limit-switch inputs.
///
/// The board reports this as five digits, most significant first:
/// ES, X limit, Y limit, Z limit, E limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IoPortStatus {
    pub emergency_stop: bool,
    pub x_limit: bool,
    pub y_limit: bool,
    pub z_limit: bool,
    pub e_limit: bool,
}

impl IoPortStatus {
    /// Limit input state for one axis.
    pub fn limit(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x_limit,
            Axis::Y => self.y_limit,
            Axis::Z => self.z_limit,
            Axis::E => self.e_limit,
        }
    }
}
