//! Lock controller: the only component that actuates the lock.
//!
//! Owns the door-closed safety guard: [`LockController::engage_lock`] is a
//! logged no-op unless the door is observed closed at the moment of the
//! call. Release carries no guard, but always schedules the re-lock debt
//! that the door monitor later settles.

use crate::audit::{AccessEventKind, AccessLog};
use crate::state::SharedState;
use latchkey_core::constants::MSG_LOCKING;
use latchkey_hardware::{FeedbackHandle, Led, LockActuator};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// How long the LOCKING splash stays on the display.
const LOCKING_SPLASH: Duration = Duration::from_secs(1);

/// Exclusive owner of the lock actuator.
///
/// Shared between the door monitor (engagement paths) and the dispatcher
/// (release path) behind a `tokio::sync::Mutex`; the mutex plus this type
/// being the only actuator owner give the single-writer discipline the
/// hardware needs.
pub struct LockController<A> {
    actuator: A,
    state: Arc<SharedState>,
    feedback: FeedbackHandle,
    audit: AccessLog,
}

impl<A: LockActuator> LockController<A> {
    /// Wire the controller to its actuator and shared groups.
    pub fn new(
        actuator: A,
        state: Arc<SharedState>,
        feedback: FeedbackHandle,
        audit: AccessLog,
    ) -> Self {
        Self {
            actuator,
            state,
            feedback,
            audit,
        }
    }

    /// Engage the lock, subject to the door-closed guard.
    ///
    /// Returns `true` if the lock was engaged. A guard refusal or actuator
    /// failure leaves every piece of state untouched; both are advisory-log
    /// situations, retried by the caller's next poll.
    pub async fn engage_lock(&mut self) -> bool {
        if !self.state.door_state().is_closed() {
            warn!(
                door = %self.state.door_state(),
                "lock engagement refused: door is not closed"
            );
            return false;
        }
        if let Err(e) = self.actuator.set_locked(true).await {
            warn!(error = %e, "lock actuator failed to engage");
            return false;
        }

        self.state.note_locked();
        self.state.request_combo_reset();
        self.audit.record(AccessEventKind::Locked);
        info!("lock engaged");

        self.feedback.led(Led::Granted, false).await;
        self.feedback.led(Led::Denied, false).await;
        self.feedback
            .show_temporary(MSG_LOCKING.0, MSG_LOCKING.1, LOCKING_SPLASH)
            .await;
        true
    }

    /// Release the lock unconditionally and start the re-lock debt and the
    /// max-open stopwatch.
    ///
    /// Returns `true` if the actuator accepted the command.
    pub async fn release_lock(&mut self) -> bool {
        if let Err(e) = self.actuator.set_locked(false).await {
            warn!(error = %e, "lock actuator failed to release");
            return false;
        }

        self.state.note_unlocked(Instant::now());
        info!("lock released");

        self.feedback.led(Led::Denied, false).await;
        self.feedback.led(Led::Granted, true).await;
        true
    }

    /// Fail-secure boot: drive the actuator to the locked position without
    /// consulting the guard.
    ///
    /// At startup no unlock cycle has happened yet, so driving the bolt
    /// home is safe even when the contact reads open; every later
    /// engagement goes through [`engage_lock`](Self::engage_lock).
    pub async fn boot_lock(&mut self) {
        if let Err(e) = self.actuator.set_locked(true).await {
            warn!(error = %e, "lock actuator failed during boot engagement");
            return;
        }
        self.state.note_locked();
        self.audit.record(AccessEventKind::Locked);
        info!(door = %self.state.door_state(), "boot: lock driven to engaged position");
    }
}
