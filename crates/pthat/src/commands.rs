//! Command model and wire rendering.
//!
//! Every operation the board understands is one variant of [`Command`]. A
//! command is rendered against a [`Header`] (mode and id) into a single
//! terminated ASCII string:
//!
//! ```text
//! <mode:1><id:2><opcode:2><fields...>*
//! ```
//!
//! The reset and buffer-control commands are the exceptions: they carry no
//! header at all (`N*`, `H0000*`).
//!
//! Rendering is pure. All fields are validated first, and a command with any
//! out-of-range field yields an error instead of a partial string, so nothing
//! invalid can ever reach the wire.
//!
//! Parameters that the board keeps per axis (frequency, ramps, report flags)
//! are passed explicitly through small config structs such as [`AxisConfig`];
//! nothing is remembered between renders.

use pthat_core::error::Result;
use pthat_core::types::{
    AdcChannel, AuxChannel, Axis, AxisMask, AxisSelector, CommandId, CommandMode, DelayUnit,
    Direction, EnablePolarity, Header, PwmChannel,
};

use crate::fields::{
    self, ADC_LINK, BUFFER_VALUE, CONFIG_FREQUENCY, PULSE_COUNT, PWM_FREQUENCY, RAMP_DIVIDE,
    RAMP_PAUSE, SPEED_FREQUENCY, WAIT_DELAY, encode_flag,
};
use crate::opcode::Opcode;
use crate::protocol::encode_command;

// ---------------------------------------------------------------------------
// Per-call configuration
// ---------------------------------------------------------------------------

/// Full configuration of one axis, sent with [`Command::ConfigureAxis`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConfig {
    /// Pulse frequency in Hz, 0.0-500000.0.
    pub frequency: f64,
    /// Number of pulses to emit, 0-4294967295. Zero runs until stopped.
    pub pulse_count: u64,
    pub direction: Direction,
    pub start_ramp: bool,
    pub finish_ramp: bool,
    /// Target frequency is divided by this for each ramp increment, 0-255.
    pub ramp_divide: u16,
    /// Pause between ramp increments, 0-255.
    pub ramp_pause: u16,
    /// 0 for none, or the ADC (1-2) that scales the output frequency.
    pub link_to_adc: u8,
    pub enable_polarity: EnablePolarity,
}

impl Default for AxisConfig {
    fn default() -> Self {
        AxisConfig {
            frequency: 0.0,
            pulse_count: 0,
            direction: Direction::Forward,
            start_ramp: false,
            finish_ramp: false,
            ramp_divide: 0,
            ramp_pause: 0,
            link_to_adc: 0,
            enable_polarity: EnablePolarity::ZeroVolts,
        }
    }
}

impl AxisConfig {
    fn encode_fields(&self) -> Result<String> {
        let mut out = String::with_capacity(32);
        out.push_str(&CONFIG_FREQUENCY.encode(self.frequency)?);
        out.push_str(&PULSE_COUNT.encode(self.pulse_count)?);
        out.push(digit(self.direction.digit()));
        out.push(encode_flag(self.start_ramp));
        out.push(encode_flag(self.finish_ramp));
        out.push_str(&RAMP_DIVIDE.encode(u64::from(self.ramp_divide))?);
        out.push_str(&RAMP_PAUSE.encode(u64::from(self.ramp_pause))?);
        out.push_str(&ADC_LINK.encode(u64::from(self.link_to_adc))?);
        out.push(digit(self.enable_polarity.digit()));
        Ok(out)
    }

    /// Decode the fields that follow `C<axis>` in a configure command.
    pub fn decode_fields(text: &str) -> Option<AxisConfig> {
        let mut cursor = Cursor::new(text);
        let config = AxisConfig {
            frequency: CONFIG_FREQUENCY.decode(cursor.take(CONFIG_FREQUENCY.width)?)?,
            pulse_count: PULSE_COUNT.decode(cursor.take(PULSE_COUNT.width)?)?,
            direction: Direction::from_digit(cursor.digit()?)?,
            start_ramp: fields::decode_flag(cursor.char()?)?,
            finish_ramp: fields::decode_flag(cursor.char()?)?,
            ramp_divide: RAMP_DIVIDE.decode(cursor.take(RAMP_DIVIDE.width)?)? as u16,
            ramp_pause: RAMP_PAUSE.decode(cursor.take(RAMP_PAUSE.width)?)? as u16,
            link_to_adc: ADC_LINK.decode(cursor.take(ADC_LINK.width)?)? as u8,
            enable_polarity: EnablePolarity::from_digit(cursor.digit()?)?,
        };
        cursor.is_empty().then_some(config)
    }
}

/// Parameters of the auto pulse-count report ([`Command::AutoPulseReport`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseReportConfig {
    /// Pulse count at which every selected axis reports its count.
    pub pulse_count: u64,
    /// Axes whose counts are sent back.
    pub replies: AxisMask,
}

impl Default for PulseReportConfig {
    fn default() -> Self {
        PulseReportConfig {
            pulse_count: 0,
            replies: AxisMask::ALL,
        }
    }
}

/// Frequency and duty cycle of one PWM output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PwmSetting {
    /// Output frequency in whole Hz, 0-1000000.
    pub frequency: u32,
    /// Duty cycle in percent, 0.0-100.0, with two decimal places on the wire.
    pub duty_percent: f64,
}

impl PwmSetting {
    fn encode_fields(&self) -> Result<String> {
        let mut out = PWM_FREQUENCY.encode(u64::from(self.frequency))?;
        out.push_str(&fields::encode_duty_percent(self.duty_percent)?);
        Ok(out)
    }
}

/// The three headerless buffer-control operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferOp {
    /// `H0000*`: clear the buffer and start accepting buffered commands.
    Initiate,
    /// `Z0000*`: execute the buffered commands once.
    Start,
    /// `W0000*`: execute the buffered commands in a loop until stopped.
    StartLoop,
}

impl BufferOp {
    fn letter(&self) -> char {
        match self {
            BufferOp::Initiate => 'H',
            BufferOp::Start => 'Z',
            BufferOp::StartLoop => 'W',
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One operation understood by the board.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // -- general -----------------------------------------------------------
    /// Request the emergency-stop and limit-switch input states.
    RequestPortStatus,
    /// Delay before the next command is executed, 0-9999 units.
    WaitDelay { unit: DelayUnit, delay: u16 },
    ToggleMotorEnable,
    /// Turn received (`R`) replies on or off.
    ReceivedReplies(bool),
    /// Turn completed (`C`) replies on or off.
    CompletedReplies(bool),
    RequestFirmwareVersion,
    /// Reset the board (`N*`, headerless).
    Reset,
    /// Buffer control (headerless).
    Buffer(BufferOp),

    // -- axis --------------------------------------------------------------
    ConfigureAxis { axis: Axis, config: AxisConfig },
    /// Reverse direction each time `pulse_count` pulses have been emitted.
    AutoDirectionChange { axis: Axis, pulse_count: u64 },
    AutoPulseReport { axis: Axis, report: PulseReportConfig },
    Start(AxisSelector),
    Stop(AxisSelector),
    /// Pause a running axis, or resume a paused one. `report` selects the
    /// axes whose pulse counts are sent back.
    PauseResume { target: AxisSelector, report: AxisMask },
    /// Change the frequency of a running axis, 0.0-125000.0 Hz.
    ChangeSpeed { axis: Axis, frequency: f64 },
    RequestPulseCount(Axis),
    LimitSwitch { axis: Axis, enabled: bool },
    EmergencyStop { enabled: bool },

    // -- adc / aux / pwm ---------------------------------------------------
    RequestAdcReading(AdcChannel),
    AuxOutput { channel: AuxChannel, on: bool },
    Pwm { channel: PwmChannel, setting: PwmSetting },
    PwmBoth { x: PwmSetting, y: PwmSetting },
}

impl Command {
    /// The opcode this command carries, and that its replies echo.
    ///
    /// Headerless commands have no opcode.
    pub fn opcode(&self) -> Option<Opcode> {
        let op = match self {
            Command::RequestPortStatus => Opcode::PortStatus,
            Command::WaitDelay { unit, .. } => Opcode::WaitDelay(*unit),
            Command::ToggleMotorEnable => Opcode::ToggleMotorEnable,
            Command::ReceivedReplies(on) => Opcode::ReceivedReplies(*on),
            Command::CompletedReplies(on) => Opcode::CompletedReplies(*on),
            Command::RequestFirmwareVersion => Opcode::FirmwareVersion,
            Command::Reset | Command::Buffer(_) => return None,
            Command::ConfigureAxis { axis, .. } => Opcode::Configure(*axis),
            Command::AutoDirectionChange { axis, .. } => Opcode::AutoDirectionChange(*axis),
            Command::AutoPulseReport { axis, .. } => Opcode::AutoPulseReport(*axis),
            Command::Start(sel) => Opcode::Start(*sel),
            Command::Stop(sel) => Opcode::Stop(*sel),
            Command::PauseResume { target, .. } => Opcode::PauseResume(*target),
            Command::ChangeSpeed { axis, .. } => Opcode::ChangeSpeed(*axis),
            Command::RequestPulseCount(axis) => Opcode::PulseCount(*axis),
            Command::LimitSwitch { axis, .. } => Opcode::LimitSwitch(*axis),
            Command::EmergencyStop { .. } => Opcode::EmergencyStop,
            Command::RequestAdcReading(ch) => Opcode::Adc(*ch),
            Command::AuxOutput { channel, .. } => Opcode::Aux(*channel),
            Command::Pwm { channel, .. } => Opcode::Pwm(*channel),
            Command::PwmBoth { .. } => Opcode::PwmBoth,
        };
        Some(op)
    }

    /// Whether the command is sent without a mode/id header.
    pub fn is_headerless(&self) -> bool {
        matches!(self, Command::Reset | Command::Buffer(_))
    }

    /// Render the complete wire string, including the terminator.
    ///
    /// Fails with [`Error::Validation`](pthat_core::Error::Validation) if any
    /// field is out of range.
    pub fn render(&self, header: Header) -> Result<String> {
        let mut body = String::with_capacity(40);

        match self {
            Command::Reset => body.push('N'),
            Command::Buffer(op) => {
                body.push(op.letter());
                body.push_str(&BUFFER_VALUE.encode(0)?);
            }
            _ => {
                body.push_str(&header.to_string());
                if let Some(op) = self.opcode() {
                    body.push_str(&op.to_string());
                }
                self.encode_fields(&mut body)?;
            }
        }

        Ok(encode_command(&body))
    }

    /// Check every field against its range without keeping the rendered text.
    pub fn validate(&self) -> Result<()> {
        self.render(Header::default()).map(|_| ())
    }

    fn encode_fields(&self, out: &mut String) -> Result<()> {
        match self {
            Command::WaitDelay { delay, .. } => {
                out.push_str(&WAIT_DELAY.encode(u64::from(*delay))?);
            }
            Command::ConfigureAxis { config, .. } => {
                out.push_str(&config.encode_fields()?);
            }
            Command::AutoDirectionChange { pulse_count, .. } => {
                out.push_str(&PULSE_COUNT.encode(*pulse_count)?);
            }
            Command::AutoPulseReport { report, .. } => {
                out.push_str(&PULSE_COUNT.encode(report.pulse_count)?);
                push_mask(out, report.replies);
            }
            Command::PauseResume { report, .. } => push_mask(out, *report),
            Command::ChangeSpeed { frequency, .. } => {
                out.push_str(&SPEED_FREQUENCY.encode(*frequency)?);
            }
            Command::LimitSwitch { enabled, .. } | Command::EmergencyStop { enabled } => {
                out.push(encode_flag(*enabled));
            }
            Command::AuxOutput { on, .. } => out.push(encode_flag(*on)),
            Command::Pwm { setting, .. } => out.push_str(&setting.encode_fields()?),
            Command::PwmBoth { x, y } => {
                out.push_str(&x.encode_fields()?);
                out.push_str(&y.encode_fields()?);
            }
            Command::RequestPortStatus
            | Command::ToggleMotorEnable
            | Command::ReceivedReplies(_)
            | Command::CompletedReplies(_)
            | Command::RequestFirmwareVersion
            | Command::Reset
            | Command::Buffer(_)
            | Command::Start(_)
            | Command::Stop(_)
            | Command::RequestPulseCount(_)
            | Command::RequestAdcReading(_) => {}
        }
        Ok(())
    }
}

/// Parse a rendered axis configure command back into its parts.
///
/// Accepts the wire string with or without its terminator.
pub fn parse_configure(wire: &str) -> Option<(Header, Axis, AxisConfig)> {
    let body = wire.strip_suffix('*').unwrap_or(wire);
    let mut cursor = Cursor::new(body);
    let mode = CommandMode::from_char(cursor.char()?)?;
    let id: u8 = cursor.take(2)?.parse().ok()?;
    let id = CommandId::new(id).ok()?;
    match Opcode::parse(cursor.rest())? {
        (Opcode::Configure(axis), fields) => {
            let config = AxisConfig::decode_fields(fields)?;
            Some((Header::new(mode, id), axis, config))
        }
        _ => None,
    }
}

fn push_mask(out: &mut String, mask: AxisMask) {
    for axis in Axis::ALL {
        out.push(encode_flag(mask.get(axis)));
    }
}

fn digit(n: u8) -> char {
    char::from(b'0' + n)
}

/// Minimal left-to-right reader over an ASCII field string.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor { rest: text }
    }

    fn take(&mut self, n: usize) -> Option<&'a str> {
        if !self.rest.is_char_boundary(n.min(self.rest.len())) || self.rest.len() < n {
            return None;
        }
        let (head, tail) = self.rest.split_at(n);
        self.rest = tail;
        Some(head)
    }

    fn char(&mut self) -> Option<char> {
        let c = self.rest.chars().next()?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    fn digit(&mut self) -> Option<u8> {
        self.char()?.to_digit(10).map(|d| d as u8)
    }

    fn rest(&self) -> &'a str {
        self.rest
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}
