//! Mock door contact.

use crate::traits::DoorContact;
use crate::{HardwareError, Result};
use latchkey_core::Polarity;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct DoorProbe {
    /// Wire level currently on the contact pin.
    level: bool,
    /// Number of upcoming samples that should fail.
    fail_count: u32,
}

/// Mock reed-switch door contact.
///
/// The handle scripts the physical door: `set_closed` moves the door, and
/// `fail_once` injects a transient sample failure so tests can verify the
/// monitor loop skips the cycle instead of inventing a transition.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockDoorContact;
/// use latchkey_hardware::traits::DoorContact;
///
/// # async fn example() -> latchkey_hardware::Result<()> {
/// let (mut contact, handle) = MockDoorContact::new(true);
/// assert!(contact.is_closed().await?);
///
/// handle.set_closed(false);
/// assert!(!contact.is_closed().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockDoorContact {
    probe: Arc<Mutex<DoorProbe>>,
    polarity: Polarity,
}

impl MockDoorContact {
    /// Create a mock contact with active-low wiring (reed to ground when
    /// closed), starting in the given position.
    pub fn new(closed: bool) -> (Self, MockDoorHandle) {
        Self::with_polarity(Polarity::ActiveLow, closed)
    }

    /// Create a mock contact with explicit wiring polarity.
    pub fn with_polarity(polarity: Polarity, closed: bool) -> (Self, MockDoorHandle) {
        let probe = Arc::new(Mutex::new(DoorProbe {
            level: polarity.level_for(closed),
            fail_count: 0,
        }));
        let contact = Self {
            probe: Arc::clone(&probe),
            polarity,
        };
        let handle = MockDoorHandle { probe, polarity };
        (contact, handle)
    }
}

impl DoorContact for MockDoorContact {
    async fn is_closed(&mut self) -> Result<bool> {
        let mut probe = self.probe.lock().expect("door probe poisoned");
        if probe.fail_count > 0 {
            probe.fail_count -= 1;
            return Err(HardwareError::communication("door contact sample failed"));
        }
        Ok(self.polarity.is_active(probe.level))
    }
}

/// Scripting handle for a [`MockDoorContact`].
#[derive(Debug, Clone)]
pub struct MockDoorHandle {
    probe: Arc<Mutex<DoorProbe>>,
    polarity: Polarity,
}

impl MockDoorHandle {
    /// Move the door to the given position.
    pub fn set_closed(&self, closed: bool) {
        let mut probe = self.probe.lock().expect("door probe poisoned");
        probe.level = self.polarity.level_for(closed);
    }

    /// Drive the raw wire level directly, bypassing polarity mapping.
    pub fn set_level(&self, level: bool) {
        self.probe.lock().expect("door probe poisoned").level = level;
    }

    /// Make the next `count` samples fail with a communication error.
    pub fn fail_next(&self, count: u32) {
        self.probe.lock().expect("door probe poisoned").fail_count = count;
    }
}
