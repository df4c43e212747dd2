//! Common types shared across hardware device implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Status LEDs available on the access panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Led {
    /// System-ready indicator, lit whenever the controller is running.
    Status,
    /// Lit while access is granted (lock released).
    Granted,
    /// Flashed briefly after a rejected credential.
    Denied,
}

impl fmt::Display for Led {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Led::Status => write!(f, "status"),
            Led::Granted => write!(f, "granted"),
            Led::Denied => write!(f, "denied"),
        }
    }
}

/// Gap inserted between the tones of a multi-tone pattern.
pub const INTER_TONE_GAP: Duration = Duration::from_millis(40);

/// Audible feedback patterns the controller emits.
///
/// The shapes mirror the panel conventions: one short pip per captured
/// digit or card scan, a double pip on grant, a triple pip on denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeepPattern {
    /// Single short acknowledgment pip.
    Tick,
    /// Double pip: credential accepted.
    Granted,
    /// Triple pip: credential rejected.
    Denied,
}

impl BeepPattern {
    /// Tone sequence as `(duration, intensity)` pairs, separated by
    /// [`INTER_TONE_GAP`] when played back.
    #[must_use]
    pub fn tones(self) -> &'static [(Duration, u16)] {
        const TICK: (Duration, u16) = (Duration::from_millis(30), 300);
        const PIP: (Duration, u16) = (Duration::from_millis(80), 300);
        match self {
            BeepPattern::Tick => &[TICK],
            BeepPattern::Granted => &[PIP, PIP],
            BeepPattern::Denied => &[TICK, TICK, TICK],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_tone_counts() {
        assert_eq!(BeepPattern::Tick.tones().len(), 1);
        assert_eq!(BeepPattern::Granted.tones().len(), 2);
        assert_eq!(BeepPattern::Denied.tones().len(), 3);
    }

    #[test]
    fn test_granted_tones_longer_than_tick() {
        let tick = BeepPattern::Tick.tones()[0].0;
        for (duration, _) in BeepPattern::Granted.tones() {
            assert!(*duration > tick);
        }
    }

    #[test]
    fn test_led_serialization() {
        let led = Led::Granted;
        let json = serde_json::to_string(&led).unwrap();
        assert_eq!(json, "\"granted\"");
        let back: Led = serde_json::from_str(&json).unwrap();
        assert_eq!(back, led);
    }
}
