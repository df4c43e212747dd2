//! Mock feedback devices: display, buzzer, LEDs.

use crate::Result;
use crate::traits::{Buzzer, Display, StatusLeds};
use crate::types::Led;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DisplayProbe {
    lines: [String; 2],
    writes: Vec<(String, String)>,
}

/// Mock two-line character display recording every write.
#[derive(Debug)]
pub struct MockDisplay {
    probe: Arc<Mutex<DisplayProbe>>,
}

impl MockDisplay {
    /// Create a blank mock display.
    pub fn new() -> (Self, MockDisplayHandle) {
        let probe = Arc::new(Mutex::new(DisplayProbe::default()));
        let display = Self {
            probe: Arc::clone(&probe),
        };
        (display, MockDisplayHandle { probe })
    }
}

impl Display for MockDisplay {
    async fn show(&mut self, line1: &str, line2: &str) -> Result<()> {
        let mut probe = self.probe.lock().expect("display probe poisoned");
        probe.lines = [line1.to_string(), line2.to_string()];
        probe.writes.push((line1.to_string(), line2.to_string()));
        Ok(())
    }
}

/// Inspection handle for a [`MockDisplay`].
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    probe: Arc<Mutex<DisplayProbe>>,
}

impl MockDisplayHandle {
    /// Current content of a display line (0 or 1).
    pub fn line(&self, index: usize) -> String {
        self.probe.lock().expect("display probe poisoned").lines[index].clone()
    }

    /// Every write performed so far, oldest first.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.probe
            .lock()
            .expect("display probe poisoned")
            .writes
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Buzzer
// ---------------------------------------------------------------------------

/// Mock buzzer recording every tone played.
#[derive(Debug)]
pub struct MockBuzzer {
    tones: Arc<Mutex<Vec<(Duration, u16)>>>,
}

impl MockBuzzer {
    /// Create a silent mock buzzer.
    pub fn new() -> (Self, MockBuzzerHandle) {
        let tones = Arc::new(Mutex::new(Vec::new()));
        let buzzer = Self {
            tones: Arc::clone(&tones),
        };
        (buzzer, MockBuzzerHandle { tones })
    }
}

impl Buzzer for MockBuzzer {
    async fn beep(&mut self, duration: Duration, intensity: u16) -> Result<()> {
        self.tones
            .lock()
            .expect("buzzer probe poisoned")
            .push((duration, intensity));
        Ok(())
    }
}

/// Inspection handle for a [`MockBuzzer`].
#[derive(Debug, Clone)]
pub struct MockBuzzerHandle {
    tones: Arc<Mutex<Vec<(Duration, u16)>>>,
}

impl MockBuzzerHandle {
    /// Every tone played so far, oldest first.
    pub fn tones(&self) -> Vec<(Duration, u16)> {
        self.tones.lock().expect("buzzer probe poisoned").clone()
    }
}

// ---------------------------------------------------------------------------
// LEDs
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct LedsProbe {
    states: HashMap<Led, bool>,
    writes: Vec<(Led, bool)>,
}

/// Mock status LED bank.
#[derive(Debug)]
pub struct MockLeds {
    probe: Arc<Mutex<LedsProbe>>,
}

impl MockLeds {
    /// Create a mock LED bank with all LEDs off.
    pub fn new() -> (Self, MockLedsHandle) {
        let probe = Arc::new(Mutex::new(LedsProbe::default()));
        let leds = Self {
            probe: Arc::clone(&probe),
        };
        (leds, MockLedsHandle { probe })
    }
}

impl StatusLeds for MockLeds {
    async fn set(&mut self, led: Led, on: bool) -> Result<()> {
        let mut probe = self.probe.lock().expect("led probe poisoned");
        probe.states.insert(led, on);
        probe.writes.push((led, on));
        Ok(())
    }
}

/// Inspection handle for a [`MockLeds`].
#[derive(Debug, Clone)]
pub struct MockLedsHandle {
    probe: Arc<Mutex<LedsProbe>>,
}

impl MockLedsHandle {
    /// Whether an LED is currently lit.
    pub fn is_on(&self, led: Led) -> bool {
        *self
            .probe
            .lock()
            .expect("led probe poisoned")
            .states
            .get(&led)
            .unwrap_or(&false)
    }

    /// Every LED write performed so far, oldest first.
    pub fn writes(&self) -> Vec<(Led, bool)> {
        self.probe
            .lock()
            .expect("led probe poisoned")
            .writes
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_display_records_writes() {
        let (mut display, handle) = MockDisplay::new();

        display.show("ACCESS GRANTED!", "WELCOME HOME").await.unwrap();
        display.show("LOCKING...", "").await.unwrap();

        assert_eq!(handle.line(0), "LOCKING...");
        assert_eq!(handle.writes().len(), 2);
        assert_eq!(handle.writes()[0].1, "WELCOME HOME");
    }

    #[tokio::test]
    async fn test_mock_buzzer_records_tones() {
        let (mut buzzer, handle) = MockBuzzer::new();

        buzzer.beep(Duration::from_millis(30), 300).await.unwrap();
        buzzer.beep(Duration::from_millis(80), 300).await.unwrap();

        let tones = handle.tones();
        assert_eq!(tones.len(), 2);
        assert_eq!(tones[0], (Duration::from_millis(30), 300));
    }

    #[tokio::test]
    async fn test_mock_leds_state_tracking() {
        let (mut leds, handle) = MockLeds::new();
        assert!(!handle.is_on(Led::Status));

        leds.set(Led::Status, true).await.unwrap();
        leds.set(Led::Denied, true).await.unwrap();
        leds.set(Led::Denied, false).await.unwrap();

        assert!(handle.is_on(Led::Status));
        assert!(!handle.is_on(Led::Denied));
        assert_eq!(handle.writes().len(), 3);
    }
}
