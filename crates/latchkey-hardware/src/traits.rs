//! Hardware device trait definitions.
//!
//! These traits establish the contract between the control plane and its
//! peripherals. All methods are normalized: implementations translate
//! between logical state and wire levels internally (see
//! [`latchkey_core::Polarity`]), so the control plane never reasons about
//! electrical polarity.
//!
//! All traits use native `async fn` methods (Edition 2024 RPITIT). They are
//! not object-safe; the control-plane loops are generic over their device
//! parameters, which is the only dispatch this crate needs.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::Led;
use std::future::Future;
use std::time::Duration;

/// Door lock actuator (electromagnet, motorized bolt, or servo).
///
/// `set_locked(true)` drives the mechanism to the locked position. The
/// actuator itself has no interlock; the door-closed safety guard lives in
/// the lock controller, which is the sole caller.
pub trait LockActuator: Send + Sync {
    /// Drive the actuator to the locked (`true`) or released (`false`)
    /// position.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator cannot be driven, e.g. the device
    /// is disconnected or the underlying bus write fails.
    fn set_locked(&mut self, locked: bool) -> impl Future<Output = Result<()>> + Send;
}

/// Magnetic door contact (reed switch).
pub trait DoorContact: Send + Sync {
    /// Sample the contact. Returns `true` while the door is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample cannot be taken; callers treat this
    /// as a skipped poll cycle, not a door transition.
    fn is_closed(&mut self) -> impl Future<Output = Result<bool>> + Send;
}

/// Analog combination dial (potentiometer behind an ADC).
pub trait PositionDial: Send + Sync {
    /// Read the raw dial position in `0..=MAX_RAW_POSITION`.
    ///
    /// The reading is noisy by nature; quantization and settle detection
    /// are the combination-capture state machine's job.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    fn read_raw(&mut self) -> impl Future<Output = Result<u16>> + Send;
}

/// Two-line character display.
pub trait Display: Send + Sync {
    /// Replace both display lines. Implementations truncate or pad each
    /// line to the panel width.
    ///
    /// # Errors
    ///
    /// Returns an error if the display transaction fails.
    fn show(&mut self, line1: &str, line2: &str) -> impl Future<Output = Result<()>> + Send;
}

/// PWM buzzer.
pub trait Buzzer: Send + Sync {
    /// Sound the buzzer for `duration` at the given drive intensity, then
    /// silence it. The call returns after the tone completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the buzzer cannot be driven.
    fn beep(&mut self, duration: Duration, intensity: u16) -> impl Future<Output = Result<()>> + Send;
}

/// Panel status LEDs.
pub trait StatusLeds: Send + Sync {
    /// Switch one LED on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the LED cannot be driven.
    fn set(&mut self, led: Led, on: bool) -> impl Future<Output = Result<()>> + Send;
}
