//! Motion conversions between motor speed and pulse frequency.
//!
//! The board is driven in pulses per second; callers usually think in
//! revolutions per minute. These helpers convert between the two for a motor
//! with a given number of full steps per revolution.
//!
//! Rounding is to nearest with ties to even (`f64::round_ties_even`).

/// Convert a motor speed in RPM to a pulse frequency in Hz.
///
/// The result is rounded to `round_digits` decimal places; `0` rounds to the
/// nearest whole hertz.
///
/// Returns `0.0` when `steps_per_rev` is zero.
pub fn rpm_to_frequency(rpm: f64, steps_per_rev: u32, round_digits: u32) -> f64 {
    if steps_per_rev == 0 {
        return 0.0;
    }
    let step_angle = 360.0 / f64::from(steps_per_rev);
    let factor = step_angle / 360.0 * 60.0;
    round_to(rpm / factor, round_digits)
}

/// Convert a pulse frequency in Hz to a motor speed in whole RPM.
pub fn frequency_to_rpm(frequency: f64, steps_per_rev: u32) -> i64 {
    if steps_per_rev == 0 {
        return 0;
    }
    let step_angle = 360.0 / f64::from(steps_per_rev);
    (step_angle / 360.0 * frequency * 60.0).round_ties_even() as i64
}

/// Number of pulses needed to turn a motor `total_revs` full revolutions.
pub fn calculate_pulse_count(steps_per_rev: u32, total_revs: u32) -> u64 {
    u64::from(steps_per_rev) * u64::from(total_revs)
}

/// Revolutions produced by `pulse_count` pulses.
pub fn calculate_revolutions(steps_per_rev: u32, pulse_count: u64) -> f64 {
    if steps_per_rev == 0 {
        return 0.0;
    }
    pulse_count as f64 / f64::from(steps_per_rev)
}

/// Size of each frequency step the board takes while ramping towards
/// `frequency` with the given ramp divide.
///
/// A divide of zero means the board jumps straight to the target.
pub fn ramp_increment_frequency(frequency: f64, ramp_divide: u8) -> f64 {
    if ramp_divide == 0 {
        frequency
    } else {
        frequency / f64::from(ramp_divide)
    }
}

fn round_to(value: f64, digits: u32) -> f64 {
    if digits == 0 {
        return value.round_ties_even();
    }
    let scale = 10f64.powi(digits.min(15) as i32);
    (value * scale).round_ties_even() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpm_to_frequency_whole_hertz() {
        assert_eq!(rpm_to_frequency(800.0, 200, 0), 2667.0);
    }

    #[test]
    fn rpm_to_frequency_with_digits() {
        assert_eq!(rpm_to_frequency(800.0, 200, 3), 2666.667);
        assert_eq!(rpm_to_frequency(60.0, 200, 2), 200.0);
    }

    #[test]
    fn rpm_to_frequency_zero_steps() {
        assert_eq!(rpm_to_frequency(800.0, 0, 0), 0.0);
    }

    #[test]
    fn frequency_to_rpm_rounds() {
        assert_eq!(frequency_to_rpm(2667.0, 200), 800);
        assert_eq!(frequency_to_rpm(200.0, 200), 60);
        assert_eq!(frequency_to_rpm(1000.0, 0), 0);
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(frequency_to_rpm(1.0, 24), 2);
        assert_eq!(rpm_to_frequency(30.0, 1, 0), 0.0);
        assert_eq!(rpm_to_frequency(90.0, 1, 0), 2.0);
    }

    #[test]
    fn pulse_count_and_revolutions() {
        assert_eq!(calculate_pulse_count(200, 50), 10000);
        assert_eq!(calculate_revolutions(200, 10000), 50.0);
        assert_eq!(calculate_revolutions(200, 300), 1.5);
    }

    #[test]
    fn pulse_count_does_not_overflow_u32() {
        assert_eq!(
            calculate_pulse_count(u32::MAX, 2),
            u64::from(u32::MAX) * 2
        );
    }

    #[test]
    fn ramp_increment() {
        assert_eq!(ramp_increment_frequency(1000.0, 100), 10.0);
        assert_eq!(ramp_increment_frequency(1000.0, 0), 1000.0);
    }
}
