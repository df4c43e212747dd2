//! Mock lock actuator.

use crate::Result;
use crate::traits::LockActuator;
use latchkey_core::Polarity;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct LockProbe {
    /// Last wire level driven, `None` until the first actuation.
    level: Option<bool>,
    /// Logical positions commanded, in order.
    transitions: Vec<bool>,
}

/// Mock lock actuator recording every commanded position.
///
/// The mock models the wiring: the logical `locked` flag is translated to a
/// wire level through the configured [`Polarity`], and the handle exposes
/// both views so tests can assert that polarity mapping is honored.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockLock;
/// use latchkey_hardware::traits::LockActuator;
///
/// # async fn example() -> latchkey_hardware::Result<()> {
/// let (mut lock, handle) = MockLock::new();
/// lock.set_locked(true).await?;
/// assert_eq!(handle.is_locked(), Some(true));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockLock {
    probe: Arc<Mutex<LockProbe>>,
    polarity: Polarity,
}

impl MockLock {
    /// Create a mock actuator with active-high wiring.
    pub fn new() -> (Self, MockLockHandle) {
        Self::with_polarity(Polarity::ActiveHigh)
    }

    /// Create a mock actuator with explicit wiring polarity.
    pub fn with_polarity(polarity: Polarity) -> (Self, MockLockHandle) {
        let probe = Arc::new(Mutex::new(LockProbe::default()));
        let lock = Self {
            probe: Arc::clone(&probe),
            polarity,
        };
        let handle = MockLockHandle { probe, polarity };
        (lock, handle)
    }
}

impl LockActuator for MockLock {
    async fn set_locked(&mut self, locked: bool) -> Result<()> {
        let mut probe = self.probe.lock().expect("lock probe poisoned");
        probe.level = Some(self.polarity.level_for(locked));
        probe.transitions.push(locked);
        Ok(())
    }
}

/// Inspection handle for a [`MockLock`].
#[derive(Debug, Clone)]
pub struct MockLockHandle {
    probe: Arc<Mutex<LockProbe>>,
    polarity: Polarity,
}

impl MockLockHandle {
    /// Logical position last commanded, `None` before the first actuation.
    pub fn is_locked(&self) -> Option<bool> {
        let probe = self.probe.lock().expect("lock probe poisoned");
        probe.level.map(|level| self.polarity.is_active(level))
    }

    /// Raw wire level last driven.
    pub fn level(&self) -> Option<bool> {
        self.probe.lock().expect("lock probe poisoned").level
    }

    /// All logical positions commanded so far, oldest first.
    pub fn transitions(&self) -> Vec<bool> {
        self.probe
            .lock()
            .expect("lock probe poisoned")
            .transitions
            .clone()
    }
}
