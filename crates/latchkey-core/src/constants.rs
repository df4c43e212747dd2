//! Timing, quantization, and default-credential constants.
//!
//! Every tunable of the access controller is collected here and consumed
//! through [`AccessConfig`](crate::config::AccessConfig), which is assembled
//! once at startup. The values mirror the electrical characteristics of the
//! reference hardware (12-bit ADC dial, reed-switch door contact, MFRC522
//! reader) and should be changed together with the wiring they describe.

use std::time::Duration;

// ============================================================================
// Poll cadences
// ============================================================================

/// Door contact sampling interval.
///
/// The monitor loop detects door transitions by edge comparison at this
/// cadence; the polling interval itself provides sufficient debounce for a
/// reed switch.
pub const DOOR_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Dial position sampling interval for combination capture.
pub const DIAL_POLL_INTERVAL: Duration = Duration::from_millis(120);

/// Card reader polling interval between request/anti-collision attempts.
pub const CARD_POLL_INTERVAL: Duration = Duration::from_millis(150);

// ============================================================================
// Lock timing
// ============================================================================

/// Delay between observing the door closed and re-engaging the lock.
///
/// Armed when the door closes while a re-lock is pending; cancelled if the
/// door reopens before it fires.
pub const RELOCK_DELAY: Duration = Duration::from_millis(1000);

/// Maximum time the lock may stay released before it is re-engaged
/// without further credential input.
pub const MAX_UNLOCK_OPEN: Duration = Duration::from_millis(10_000);

// ============================================================================
// Combination capture
// ============================================================================

/// Quiescent time a dial reading must hold one digit before it is accepted
/// as a deliberate entry.
pub const SETTLE_DURATION: Duration = Duration::from_millis(1200);

/// Minimum spacing between dial-movement advisory logs.
pub const DIAL_LOG_INTERVAL: Duration = Duration::from_millis(300);

/// Highest raw reading the dial can produce (12-bit ADC).
pub const MAX_RAW_POSITION: u16 = 4095;

/// Highest digit value a dial position quantizes to (inclusive), giving
/// `MAX_DIGIT + 1` equally sized buckets over the raw range.
pub const MAX_DIGIT: u8 = 10;

/// Default combination the captured digit sequence is compared against.
pub const DEFAULT_COMBO_TARGET: [u8; 3] = [3, 6, 4];

// ============================================================================
// Card allow-list
// ============================================================================

/// UIDs authorized out of the box.
///
/// The allow-list is compiled in; there is no runtime enrollment and no
/// persistence (see the configuration surface in the project docs).
pub const DEFAULT_ALLOWED_UIDS: &[[u8; 4]] = &[[0xEA, 0xE8, 0xD2, 0x84]];

// ============================================================================
// Operator-facing messages
// ============================================================================

/// Idle prompt shown when no entry is in progress (line 1 / line 2).
pub const MSG_IDLE: (&str, &str) = ("WELCOME, INPUT", "PASSWORD OR RFID");

/// Shown while a correct credential has been accepted.
pub const MSG_GRANTED: (&str, &str) = ("ACCESS GRANTED!", "WELCOME HOME");

/// Shown after a rejected credential.
pub const MSG_DENIED: (&str, &str) = ("ACCESS DENIED!", "");

/// Splash shown briefly while the lock re-engages.
pub const MSG_LOCKING: (&str, &str) = ("LOCKING...", "");

/// Header for the combination progress line.
pub const MSG_COMBO_PROGRESS: &str = "CURRENT PASS:";
