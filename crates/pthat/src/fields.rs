//! Fixed-width ASCII field codec.
//!
//! Every numeric parameter in a command occupies a fixed number of characters
//! on the wire. Integers are zero-padded on the left; decimals are rendered
//! with a fixed number of fractional digits and zero-padded to the full
//! width (`125000.000` is a 10.3 field). Each field carries its valid range,
//! and a value outside that range is rejected before anything is rendered.

use pthat_core::error::ValidationError;

/// A zero-padded unsigned integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntField {
    /// Human-readable field name used in validation errors.
    pub name: &'static str,
    /// Exact number of characters on the wire.
    pub width: usize,
    pub min: u64,
    pub max: u64,
}

impl IntField {
    pub const fn new(name: &'static str, width: usize, min: u64, max: u64) -> Self {
        IntField {
            name,
            width,
            min,
            max,
        }
    }

    /// Check `value` against the field's range.
    pub fn validate(&self, value: u64) -> Result<u64, ValidationError> {
        if value < self.min || value > self.max {
            return Err(ValidationError::out_of_range(
                self.name, value, self.min, self.max,
            ));
        }
        Ok(value)
    }

    /// Validate and render `value` as exactly `width` digits.
    pub fn encode(&self, value: u64) -> Result<String, ValidationError> {
        let value = self.validate(value)?;
        Ok(format!("{value:0width$}", width = self.width))
    }

    /// Decode exactly `width` ASCII digits. Returns `None` for any other input.
    pub fn decode(&self, text: &str) -> Option<u64> {
        if text.len() != self.width || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        text.parse().ok()
    }
}

/// A zero-padded fixed-point decimal field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalField {
    pub name: &'static str,
    /// Total characters on the wire, including the decimal point.
    pub width: usize,
    /// Digits after the decimal point.
    pub precision: usize,
    pub min: f64,
    pub max: f64,
}

impl DecimalField {
    pub const fn new(name: &'static str, width: usize, precision: usize, min: f64, max: f64) -> Self {
        DecimalField {
            name,
            width,
            precision,
            min,
            max,
        }
    }

    /// Check `value` against the field's range. NaN is always rejected.
    pub fn validate(&self, value: f64) -> Result<f64, ValidationError> {
        if value.is_nan() || value < self.min || value > self.max {
            return Err(ValidationError::out_of_range(
                self.name, value, self.min, self.max,
            ));
        }
        Ok(value)
    }

    /// Validate and render `value` as `width` characters with `precision`
    /// fractional digits.
    pub fn encode(&self, value: f64) -> Result<String, ValidationError> {
        let value = self.validate(value)?;
        Ok(format!(
            "{value:0width$.precision$}",
            width = self.width,
            precision = self.precision
        ))
    }

    /// Decode a field previously produced by [`encode`](Self::encode).
    ///
    /// The text must be exactly `width` characters with the decimal point in
    /// the expected position.
    pub fn decode(&self, text: &str) -> Option<f64> {
        if text.len() != self.width {
            return None;
        }
        let point = self.width.checked_sub(self.precision + 1)?;
        let bytes = text.as_bytes();
        let well_formed = bytes.iter().enumerate().all(|(i, b)| {
            if i == point {
                *b == b'.'
            } else {
                b.is_ascii_digit()
            }
        });
        if !well_formed {
            return None;
        }
        text.parse().ok()
    }
}

// ---------------------------------------------------------------------------
// Field catalogue
// ---------------------------------------------------------------------------

/// Pulse frequency in an axis configuration command.
pub const CONFIG_FREQUENCY: DecimalField = DecimalField::new("frequency", 10, 3, 0.0, 500_000.0);

/// Pulse frequency in a live change-speed command.
pub const SPEED_FREQUENCY: DecimalField = DecimalField::new("frequency", 10, 3, 0.0, 125_000.0);

pub const PULSE_COUNT: IntField = IntField::new("pulse count", 10, 0, u32::MAX as u64);

pub const RAMP_DIVIDE: IntField = IntField::new("ramp divide", 3, 0, 255);

pub const RAMP_PAUSE: IntField = IntField::new("ramp pause", 3, 0, 255);

/// Which ADC (if any) modulates the axis frequency: 0 none, 1 or 2.
pub const ADC_LINK: IntField = IntField::new("link to adc", 1, 0, 2);

/// Single-digit on/off or enum field.
pub const FLAG: IntField = IntField::new("flag", 1, 0, 1);

pub const WAIT_DELAY: IntField = IntField::new("wait delay", 4, 0, 9999);

/// Value carried by the headerless buffer commands. The board always expects `0000`.
pub const BUFFER_VALUE: IntField = IntField::new("buffer value", 4, 0, 9999);

pub const PWM_FREQUENCY: IntField = IntField::new("pwm frequency", 7, 0, 1_000_000);

/// Duty cycle in hundredths of a percent (`08050` is 80.5 %).
pub const PWM_DUTY: IntField = IntField::new("duty cycle", 5, 0, 10_000);

/// Render a boolean as a single `0`/`1` digit.
pub fn encode_flag(on: bool) -> char {
    if on { '1' } else { '0' }
}

/// Decode a single `0`/`1` digit.
pub fn decode_flag(c: char) -> Option<bool> {
    match c {
        '0' => Some(false),
        '1' => Some(true),
        _ => None,
    }
}

/// Convert a duty cycle percentage (0.0-100.0) to wire hundredths and render it.
pub fn encode_duty_percent(percent: f64) -> Result<String, ValidationError> {
    if percent.is_nan() || !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::out_of_range("duty cycle", percent, 0.0, 100.0));
    }
    PWM_DUTY.encode((percent * 100.0).round() as u64)
}

/// Decode five duty-cycle digits back into a percentage.
pub fn decode_duty_percent(text: &str) -> Option<f64> {
    PWM_DUTY.decode(text).map(|hundredths| hundredths as f64 / 100.0)
}
