//! Per-axis command construction with start/pause idempotence.
//!
//! [`AxisControl`] builds the commands addressed to one axis and remembers
//! whether that axis has been started or paused. Repeated `start`, `stop`,
//! `pause` or `resume` calls that would not change that state return `None`
//! instead of a command, so a caller that polls and re-issues commands never
//! puts duplicates on the wire.
//!
//! Commands with range-checked fields are validated when built.

use pthat_core::error::Result;
use pthat_core::types::{Axis, AxisMask, AxisSelector};

use crate::commands::{AxisConfig, Command, PulseReportConfig};

#[derive(Debug, Clone)]
pub struct AxisControl {
    axis: Axis,
    started: bool,
    paused: bool,
}

impl AxisControl {
    pub fn new(axis: Axis) -> Self {
        AxisControl {
            axis,
            started: false,
            paused: false,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Forget the started and paused state, as after a board reset.
    pub fn reset(&mut self) {
        self.started = false;
        self.paused = false;
    }

    // -----------------------------------------------------------------------
    // Validated commands
    // -----------------------------------------------------------------------

    pub fn configure(&self, config: AxisConfig) -> Result<Command> {
        validated(Command::ConfigureAxis {
            axis: self.axis,
            config,
        })
    }

    /// Change the frequency while running. Limited to 125000 Hz.
    pub fn change_speed(&self, frequency: f64) -> Result<Command> {
        validated(Command::ChangeSpeed {
            axis: self.axis,
            frequency,
        })
    }

    pub fn auto_direction_change(&self, pulse_count: u64) -> Result<Command> {
        validated(Command::AutoDirectionChange {
            axis: self.axis,
            pulse_count,
        })
    }

    pub fn auto_pulse_report(&self, report: PulseReportConfig) -> Result<Command> {
        validated(Command::AutoPulseReport {
            axis: self.axis,
            report,
        })
    }

    // -----------------------------------------------------------------------
    // Unconditional commands
    // -----------------------------------------------------------------------

    pub fn request_pulse_count(&self) -> Command {
        Command::RequestPulseCount(self.axis)
    }

    pub fn limit_switch(&self, enabled: bool) -> Command {
        Command::LimitSwitch {
            axis: self.axis,
            enabled,
        }
    }

    pub fn emergency_stop(&self, enabled: bool) -> Command {
        Command::EmergencyStop { enabled }
    }

    // -----------------------------------------------------------------------
    // Guarded commands
    // -----------------------------------------------------------------------

    /// Start this axis. `None` if it is already started.
    pub fn start(&mut self) -> Option<Command> {
        self.start_target(self.axis.into())
    }

    /// Start every axis. `None` if this axis is already started.
    pub fn start_all(&mut self) -> Option<Command> {
        self.start_target(AxisSelector::All)
    }

    /// Stop this axis. `None` if it is not started.
    pub fn stop(&mut self) -> Option<Command> {
        self.stop_target(self.axis.into())
    }

    pub fn stop_all(&mut self) -> Option<Command> {
        self.stop_target(AxisSelector::All)
    }

    /// Pause this axis, reporting the pulse counts of the axes in `report`.
    /// `None` if it is already paused.
    pub fn pause(&mut self, report: AxisMask) -> Option<Command> {
        self.pause_target(self.axis.into(), report)
    }

    pub fn pause_all(&mut self, report: AxisMask) -> Option<Command> {
        self.pause_target(AxisSelector::All, report)
    }

    /// Resume this axis. `None` if it is not paused.
    pub fn resume(&mut self, report: AxisMask) -> Option<Command> {
        self.resume_target(self.axis.into(), report)
    }

    pub fn resume_all(&mut self, report: AxisMask) -> Option<Command> {
        self.resume_target(AxisSelector::All, report)
    }

    fn start_target(&mut self, target: AxisSelector) -> Option<Command> {
        if self.started {
            return None;
        }
        self.started = true;
        Some(Command::Start(target))
    }

    fn stop_target(&mut self, target: AxisSelector) -> Option<Command> {
        if !self.started {
            return None;
        }
        self.started = false;
        self.paused = false;
        Some(Command::Stop(target))
    }

    fn pause_target(&mut self, target: AxisSelector, report: AxisMask) -> Option<Command> {
        if self.paused {
            return None;
        }
        self.paused = true;
        Some(Command::PauseResume { target, report })
    }

    fn resume_target(&mut self, target: AxisSelector, report: AxisMask) -> Option<Command> {
        if !self.paused {
            return None;
        }
        self.paused = false;
        Some(Command::PauseResume { target, report })
    }
}

fn validated(cmd: Command) -> Result<Command> {
    cmd.validate()?;
    Ok(cmd)
}
