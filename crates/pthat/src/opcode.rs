//! Two-character operation mnemonics.
//!
//! Every addressed command carries a two-character opcode after its header,
//! and every reply echoes the same two characters. [`Opcode`] is the shared
//! vocabulary used both to render commands and to correlate replies.

use std::fmt;

use pthat_core::types::{AdcChannel, AuxChannel, Axis, AxisSelector, DelayUnit, PwmChannel};

/// The operation (and its target selector) named by a command or reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `LI`
    PortStatus,
    /// `WW` / `WM`
    WaitDelay(DelayUnit),
    /// `HT`
    ToggleMotorEnable,
    /// `R1` / `R0`
    ReceivedReplies(bool),
    /// `G1` / `G0`
    CompletedReplies(bool),
    /// `FW`
    FirmwareVersion,
    /// `C<axis>`
    Configure(Axis),
    /// `B<axis>`
    AutoDirectionChange(Axis),
    /// `J<axis>`
    AutoPulseReport(Axis),
    /// `S<axis>` / `SA`
    Start(AxisSelector),
    /// `T<axis>` / `TA`
    Stop(AxisSelector),
    /// `P<axis>` / `PA`. Pause and resume share one opcode.
    PauseResume(AxisSelector),
    /// `Q<axis>`
    ChangeSpeed(Axis),
    /// `<axis>P`
    PulseCount(Axis),
    /// `K<axis>`
    LimitSwitch(Axis),
    /// `KS`
    EmergencyStop,
    /// `D1` / `D2`
    Adc(AdcChannel),
    /// `A1` - `A3`
    Aux(AuxChannel),
    /// `UX` / `UY`
    Pwm(PwmChannel),
    /// `UA`
    PwmBoth,
}

impl Opcode {
    /// The two wire characters for this opcode.
    pub fn mnemonic(&self) -> [char; 2] {
        match self {
            Opcode::PortStatus => ['L', 'I'],
            Opcode::WaitDelay(unit) => ['W', unit.letter()],
            Opcode::ToggleMotorEnable => ['H', 'T'],
            Opcode::ReceivedReplies(on) => ['R', flag_char(*on)],
            Opcode::CompletedReplies(on) => ['G', flag_char(*on)],
            Opcode::FirmwareVersion => ['F', 'W'],
            Opcode::Configure(axis) => ['C', axis.letter()],
            Opcode::AutoDirectionChange(axis) => ['B', axis.letter()],
            Opcode::AutoPulseReport(axis) => ['J', axis.letter()],
            Opcode::Start(sel) => ['S', sel.letter()],
            Opcode::Stop(sel) => ['T', sel.letter()],
            Opcode::PauseResume(sel) => ['P', sel.letter()],
            Opcode::ChangeSpeed(axis) => ['Q', axis.letter()],
            Opcode::PulseCount(axis) => [axis.letter(), 'P'],
            Opcode::LimitSwitch(axis) => ['K', axis.letter()],
            Opcode::EmergencyStop => ['K', 'S'],
            Opcode::Adc(ch) => ['D', digit_char(ch.number())],
            Opcode::Aux(ch) => ['A', digit_char(ch.number())],
            Opcode::Pwm(ch) => ['U', ch.letter()],
            Opcode::PwmBoth => ['U', 'A'],
        }
    }

    /// Parse the opcode at the start of `text`.
    ///
    /// Returns the opcode and the remainder of `text` after its two
    /// characters, or `None` if the first two characters are not a known
    /// opcode.
    pub fn parse(text: &str) -> Option<(Opcode, &str)> {
        let mut chars = text.chars();
        let first = chars.next()?;
        let second = chars.next()?;
        let rest = chars.as_str();

        let opcode = match (first, second) {
            ('L', 'I') => Opcode::PortStatus,
            ('W', 'W') => Opcode::WaitDelay(DelayUnit::Milliseconds),
            ('W', 'M') => Opcode::WaitDelay(DelayUnit::Microseconds),
            ('H', 'T') => Opcode::ToggleMotorEnable,
            ('R', '1') => Opcode::ReceivedReplies(true),
            ('R', '0') => Opcode::ReceivedReplies(false),
            ('G', '1') => Opcode::CompletedReplies(true),
            ('G', '0') => Opcode::CompletedReplies(false),
            ('F', 'W') => Opcode::FirmwareVersion,
            ('C', c) => Opcode::Configure(Axis::from_letter(c)?),
            ('B', c) => Opcode::AutoDirectionChange(Axis::from_letter(c)?),
            ('J', c) => Opcode::AutoPulseReport(Axis::from_letter(c)?),
            ('S', c) => Opcode::Start(AxisSelector::from_letter(c)?),
            ('T', c) => Opcode::Stop(AxisSelector::from_letter(c)?),
            ('P', c) => Opcode::PauseResume(AxisSelector::from_letter(c)?),
            ('Q', c) => Opcode::ChangeSpeed(Axis::from_letter(c)?),
            ('K', 'S') => Opcode::EmergencyStop,
            ('K', c) => Opcode::LimitSwitch(Axis::from_letter(c)?),
            ('D', c) => Opcode::Adc(AdcChannel::from_number(c.to_digit(10)? as u8)?),
            ('A', c) => Opcode::Aux(AuxChannel::from_number(c.to_digit(10)? as u8)?),
            ('U', 'A') => Opcode::PwmBoth,
            ('U', c) => Opcode::Pwm(PwmChannel::from_letter(c)?),
            (c, 'P') => Opcode::PulseCount(Axis::from_letter(c)?),
            _ => return None,
        };
        Some((opcode, rest))
    }

    /// Whether the board answers this query with a data payload after the
    /// received reply.
    pub fn expects_payload(&self) -> bool {
        matches!(
            self,
            Opcode::PortStatus | Opcode::FirmwareVersion | Opcode::Adc(_) | Opcode::PulseCount(_)
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.mnemonic();
        write!(f, "{a}{b}")
    }
}

fn flag_char(on: bool) -> char {
    if on { '1' } else { '0' }
}

fn digit_char(n: u8) -> char {
    char::from(b'0' + n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_opcodes() -> Vec<Opcode> {
        let mut ops = vec![
            Opcode::PortStatus,
            Opcode::WaitDelay(DelayUnit::Milliseconds),
            Opcode::WaitDelay(DelayUnit::Microseconds),
            Opcode::ToggleMotorEnable,
            Opcode::ReceivedReplies(true),
            Opcode::ReceivedReplies(false),
            Opcode::CompletedReplies(true),
            Opcode::CompletedReplies(false),
            Opcode::FirmwareVersion,
            Opcode::EmergencyStop,
            Opcode::Adc(AdcChannel::Adc1),
            Opcode::Adc(AdcChannel::Adc2),
            Opcode::Aux(AuxChannel::Aux1),
            Opcode::Aux(AuxChannel::Aux2),
            Opcode::Aux(AuxChannel::Aux3),
            Opcode::Pwm(PwmChannel::X),
            Opcode::Pwm(PwmChannel::Y),
            Opcode::PwmBoth,
            Opcode::Start(AxisSelector::All),
            Opcode::Stop(AxisSelector::All),
            Opcode::PauseResume(AxisSelector::All),
        ];
        for axis in Axis::ALL {
            ops.extend([
                Opcode::Configure(axis),
                Opcode::AutoDirectionChange(axis),
                Opcode::AutoPulseReport(axis),
                Opcode::Start(axis.into()),
                Opcode::Stop(axis.into()),
                Opcode::PauseResume(axis.into()),
                Opcode::ChangeSpeed(axis),
                Opcode::PulseCount(axis),
                Opcode::LimitSwitch(axis),
            ]);
        }
        ops
    }

    #[test]
    fn every_opcode_parses_back() {
        for op in all_opcodes() {
            let text = op.to_string();
            assert_eq!(Opcode::parse(&text), Some((op, "")), "opcode {text}");
        }
    }

    #[test]
    fn mnemonics_are_distinct() {
        let ops = all_opcodes();
        let mut seen = std::collections::HashSet::new();
        for op in &ops {
            assert!(seen.insert(op.to_string()), "duplicate mnemonic {op}");
        }
    }

    #[test]
    fn parse_returns_remainder() {
        assert_eq!(
            Opcode::parse("XP01"),
            Some((Opcode::PulseCount(Axis::X), "01"))
        );
        assert_eq!(
            Opcode::parse("LIL10000"),
            Some((Opcode::PortStatus, "L10000"))
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(Opcode::parse("ZZ"), None);
        assert_eq!(Opcode::parse("D3"), None);
        assert_eq!(Opcode::parse("A4"), None);
        assert_eq!(Opcode::parse("UZ"), None);
        assert_eq!(Opcode::parse("CA"), None);
        assert_eq!(Opcode::parse("Q"), None);
        assert_eq!(Opcode::parse(""), None);
    }

    #[test]
    fn display_examples() {
        assert_eq!(Opcode::Configure(Axis::X).to_string(), "CX");
        assert_eq!(Opcode::Start(AxisSelector::All).to_string(), "SA");
        assert_eq!(Opcode::PulseCount(Axis::E).to_string(), "EP");
        assert_eq!(Opcode::Adc(AdcChannel::Adc2).to_string(), "D2");
        assert_eq!(Opcode::WaitDelay(DelayUnit::Microseconds).to_string(), "WM");
    }

    #[test]
    fn payload_queries() {
        assert!(Opcode::FirmwareVersion.expects_payload());
        assert!(Opcode::Adc(AdcChannel::Adc1).expects_payload());
        assert!(Opcode::PortStatus.expects_payload());
        assert!(Opcode::PulseCount(Axis::Y).expects_payload());
        assert!(!Opcode::Start(AxisSelector::All).expects_payload());
    }
}
