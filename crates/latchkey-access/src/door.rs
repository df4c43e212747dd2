//! Door monitor: contact polling, deferred re-lock, max-open enforcement.
//!
//! The monitor is the sole writer of [`latchkey_core::DoorState`]. It polls
//! the contact at a fixed cadence and detects transitions by edge
//! comparison against the last observed value; the cadence itself provides
//! the debounce a reed switch needs.
//!
//! Two timed duties ride on the same loop:
//!
//! - **Deferred re-lock**: when the door closes while a re-lock is owed,
//!   engagement is armed one second out; reopening cancels the arm and a
//!   later close re-arms it. There is no timer task to cancel, the loop
//!   checks the armed deadline opportunistically each poll.
//! - **Max-open enforcement**: once the lock has been released longer than
//!   the configured ceiling, the monitor engages it as soon as the door
//!   permits, warning once if it has to wait for a close. The stopwatch is
//!   not restarted by a missed ceiling; it runs until a lock happens.

use crate::lock::LockController;
use crate::state::SharedState;
use latchkey_core::constants::DOOR_POLL_INTERVAL;
use latchkey_core::{AccessConfig, DoorState, LockState};
use latchkey_hardware::{DoorContact, LockActuator};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Polling task owning the door contact.
pub struct DoorMonitor<C, A> {
    contact: C,
    lock: Arc<Mutex<LockController<A>>>,
    state: Arc<SharedState>,
    config: Arc<AccessConfig>,
}

impl<C, A> DoorMonitor<C, A>
where
    C: DoorContact,
    A: LockActuator,
{
    /// Wire the monitor to its contact and the shared lock controller.
    pub fn new(
        contact: C,
        lock: Arc<Mutex<LockController<A>>>,
        state: Arc<SharedState>,
        config: Arc<AccessConfig>,
    ) -> Self {
        Self {
            contact,
            lock,
            state,
            config,
        }
    }

    /// Poll the contact forever.
    pub async fn run(mut self) {
        let mut last = DoorState::Unknown;
        let mut ceiling_warned = false;

        loop {
            match self.contact.is_closed().await {
                Ok(closed) => {
                    let now = Instant::now();
                    let observed = DoorState::from_contact(closed);

                    if observed != last {
                        last = observed;
                        self.on_transition(observed, now);
                    }

                    self.fire_due_relock(now).await;
                    self.enforce_max_open(now, &mut ceiling_warned).await;
                }
                Err(e) => debug!(error = %e, "door contact sample failed, skipping cycle"),
            }

            sleep(DOOR_POLL_INTERVAL).await;
        }
    }

    fn on_transition(&self, observed: DoorState, now: Instant) {
        self.state.set_door(observed);
        match observed {
            DoorState::Closed => {
                info!("door closed");
                if self.state.pending_relock() {
                    self.state.arm_relock(now + self.config.relock_delay);
                    info!(
                        delay_ms = self.config.relock_delay.as_millis() as u64,
                        "re-lock armed"
                    );
                }
            }
            DoorState::Open => {
                info!("door open");
                // The owed re-lock stays pending; only the schedule dies.
                self.state.cancel_relock_arm();
            }
            DoorState::Unknown => unreachable!("contact readings map to Open/Closed"),
        }
    }

    /// Engage the lock when an armed re-lock deadline has passed and the
    /// door is still closed.
    async fn fire_due_relock(&self, now: Instant) {
        let due = self
            .state
            .relock_armed_at()
            .is_some_and(|at| now >= at && self.state.door_state().is_closed());
        if !due {
            return;
        }
        self.state.cancel_relock_arm();
        info!("deferred re-lock firing");
        self.lock.lock().await.engage_lock().await;
    }

    /// Engage the lock once it has been released past the ceiling, as soon
    /// as the door allows it.
    async fn enforce_max_open(&self, now: Instant, ceiling_warned: &mut bool) {
        if self.state.lock_state() != LockState::Unlocked {
            *ceiling_warned = false;
            return;
        }
        let Some(unlocked_at) = self.state.unlocked_at() else {
            return;
        };
        if now.duration_since(unlocked_at) < self.config.max_unlock_open {
            return;
        }

        if self.state.door_state().is_closed() {
            info!(
                open_ms = now.duration_since(unlocked_at).as_millis() as u64,
                "max unlock-open reached, re-engaging lock"
            );
            self.lock.lock().await.engage_lock().await;
            *ceiling_warned = false;
        } else if !*ceiling_warned {
            warn!("max unlock-open reached but door is open, waiting for close");
            *ceiling_warned = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AccessLog;
    use latchkey_hardware::mock::{
        MockBuzzer, MockDisplay, MockDoorContact, MockDoorHandle, MockLeds, MockLock,
        MockLockHandle,
    };
    use latchkey_hardware::panel::FeedbackWorker;
    use std::time::Duration;

    struct Fixture {
        state: Arc<SharedState>,
        door: MockDoorHandle,
        lock: MockLockHandle,
    }

    fn spawn_monitor(door_closed: bool, config: AccessConfig) -> Fixture {
        let state = Arc::new(SharedState::new());
        let config = Arc::new(config);

        let (display, _) = MockDisplay::new();
        let (buzzer, _) = MockBuzzer::new();
        let (leds, _) = MockLeds::new();
        let (worker, feedback) = FeedbackWorker::new(display, buzzer, leds, "IDLE", "");
        tokio::spawn(worker.run());

        let (actuator, lock_handle) = MockLock::new();
        let controller = LockController::new(
            actuator,
            Arc::clone(&state),
            feedback,
            AccessLog::new(),
        );
        let lock = Arc::new(Mutex::new(controller));

        let (contact, door_handle) = MockDoorContact::new(door_closed);
        let monitor = DoorMonitor::new(
            contact,
            Arc::clone(&lock),
            Arc::clone(&state),
            Arc::clone(&config),
        );
        tokio::spawn(monitor.run());

        Fixture {
            state,
            door: door_handle,
            lock: lock_handle,
        }
    }

    async fn settle() {
        tokio::time::sleep(DOOR_POLL_INTERVAL * 3).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_publishes_transitions() {
        let fixture = spawn_monitor(true, AccessConfig::default());
        settle().await;
        assert_eq!(fixture.state.door_state(), DoorState::Closed);

        fixture.door.set_closed(false);
        settle().await;
        assert_eq!(fixture.state.door_state(), DoorState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_relock_after_close() {
        let fixture = spawn_monitor(true, AccessConfig::default());
        settle().await;

        // Simulate an unlock, then a door cycle.
        fixture.state.note_unlocked(Instant::now());
        fixture.door.set_closed(false);
        settle().await;
        fixture.door.set_closed(true);
        settle().await;

        // Armed but not yet fired.
        assert!(fixture.state.relock_armed_at().is_some());
        assert_eq!(fixture.state.lock_state(), LockState::Unlocked);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(fixture.state.lock_state(), LockState::Locked);
        assert_eq!(fixture.lock.is_locked(), Some(true));
        assert!(!fixture.state.pending_relock());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_cancels_armed_relock() {
        let fixture = spawn_monitor(true, AccessConfig::default());
        settle().await;

        fixture.state.note_unlocked(Instant::now());
        fixture.door.set_closed(false);
        settle().await;
        fixture.door.set_closed(true);
        settle().await;
        assert!(fixture.state.relock_armed_at().is_some());

        // Reopen inside the 1s window: the arm dies, the debt stays.
        fixture.door.set_closed(false);
        settle().await;
        assert!(fixture.state.relock_armed_at().is_none());
        assert!(fixture.state.pending_relock());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fixture.state.lock_state(), LockState::Unlocked);

        // Closing again re-arms and the re-lock lands.
        fixture.door.set_closed(true);
        tokio::time::sleep(Duration::from_millis(1300)).await;
        assert_eq!(fixture.state.lock_state(), LockState::Locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_open_autolock_with_door_closed() {
        let config = AccessConfig {
            max_unlock_open: Duration::from_secs(2),
            ..AccessConfig::default()
        };
        let fixture = spawn_monitor(true, config);
        settle().await;

        fixture.state.note_unlocked(Instant::now());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(fixture.state.lock_state(), LockState::Unlocked);

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(fixture.state.lock_state(), LockState::Locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_open_waits_for_door_close() {
        let config = AccessConfig {
            max_unlock_open: Duration::from_secs(2),
            // Long re-lock delay so only the ceiling path can engage here.
            relock_delay: Duration::from_secs(60),
            ..AccessConfig::default()
        };
        let fixture = spawn_monitor(true, config);
        settle().await;

        fixture.state.note_unlocked(Instant::now());
        fixture.door.set_closed(false);
        settle().await;

        // Ceiling passes with the door open: nothing engages yet.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fixture.state.lock_state(), LockState::Unlocked);

        // Closing the door lets the overdue ceiling engage immediately,
        // without waiting for the (long) re-lock delay.
        fixture.door.set_closed(true);
        settle().await;
        assert_eq!(fixture.state.lock_state(), LockState::Locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_contact_failure_skips_cycle_without_transition() {
        let fixture = spawn_monitor(true, AccessConfig::default());
        settle().await;
        assert_eq!(fixture.state.door_state(), DoorState::Closed);

        // A failed sample must not be interpreted as the door moving.
        fixture.door.fail_next(3);
        settle().await;
        assert_eq!(fixture.state.door_state(), DoorState::Closed);
    }
}
