//! Mock combination dial.

use crate::traits::PositionDial;
use crate::{HardwareError, Result};
use latchkey_core::constants::{MAX_DIGIT, MAX_RAW_POSITION};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct DialProbe {
    raw: u16,
    fail_count: u32,
}

/// Mock analog dial (potentiometer behind an ADC).
///
/// The handle scripts the knob: `set_raw` for exact readings and
/// `turn_to_digit` for the bucket-center reading of a digit, which is what
/// combination tests usually want.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockDial;
/// use latchkey_hardware::traits::PositionDial;
///
/// # async fn example() -> latchkey_hardware::Result<()> {
/// let (mut dial, handle) = MockDial::new();
/// handle.turn_to_digit(7);
/// let raw = dial.read_raw().await?;
/// assert!(raw > 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockDial {
    probe: Arc<Mutex<DialProbe>>,
}

impl MockDial {
    /// Create a mock dial resting at position zero.
    pub fn new() -> (Self, MockDialHandle) {
        let probe = Arc::new(Mutex::new(DialProbe {
            raw: 0,
            fail_count: 0,
        }));
        let dial = Self {
            probe: Arc::clone(&probe),
        };
        let handle = MockDialHandle { probe };
        (dial, handle)
    }
}

impl PositionDial for MockDial {
    async fn read_raw(&mut self) -> Result<u16> {
        let mut probe = self.probe.lock().expect("dial probe poisoned");
        if probe.fail_count > 0 {
            probe.fail_count -= 1;
            return Err(HardwareError::communication("ADC conversion failed"));
        }
        Ok(probe.raw)
    }
}

/// Scripting handle for a [`MockDial`].
#[derive(Debug, Clone)]
pub struct MockDialHandle {
    probe: Arc<Mutex<DialProbe>>,
}

impl MockDialHandle {
    /// Set the raw reading, clamped to the ADC range.
    pub fn set_raw(&self, raw: u16) {
        self.probe.lock().expect("dial probe poisoned").raw = raw.min(MAX_RAW_POSITION);
    }

    /// Turn the dial to the raw value at the center of a digit's bucket.
    pub fn turn_to_digit(&self, digit: u8) {
        let digit = digit.min(MAX_DIGIT);
        let raw = u32::from(digit) * u32::from(MAX_RAW_POSITION) / u32::from(MAX_DIGIT);
        self.set_raw(raw as u16);
    }

    /// Make the next `count` readings fail with a communication error.
    pub fn fail_next(&self, count: u32) {
        self.probe.lock().expect("dial probe poisoned").fail_count = count;
    }
}
