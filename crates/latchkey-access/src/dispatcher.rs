//! Access dispatcher: credential policy, door gate, unlock.
//!
//! A perpetual cycle: wait for the credential signals to satisfy the
//! configured policy, wait (if needed) for the door to be closed, release
//! the lock, clear both signals, repeat. The two waits are the only places
//! the control plane blocks without a bounded sleep, and both are woken by
//! other loops' writes.

use crate::audit::{AccessEventKind, AccessLog};
use crate::lock::LockController;
use crate::signals::CredentialSignals;
use crate::state::SharedState;
use latchkey_core::AccessConfig;
use latchkey_hardware::LockActuator;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Event-driven task combining the credential channels into unlock
/// decisions.
pub struct AccessDispatcher<A> {
    lock: Arc<Mutex<LockController<A>>>,
    state: Arc<SharedState>,
    signals: Arc<CredentialSignals>,
    config: Arc<AccessConfig>,
    audit: AccessLog,
}

impl<A: LockActuator> AccessDispatcher<A> {
    /// Wire the dispatcher to the shared groups and the lock controller.
    pub fn new(
        lock: Arc<Mutex<LockController<A>>>,
        state: Arc<SharedState>,
        signals: Arc<CredentialSignals>,
        config: Arc<AccessConfig>,
        audit: AccessLog,
    ) -> Self {
        Self {
            lock,
            state,
            signals,
            config,
            audit,
        }
    }

    /// Engage the lock fail-secure, then serve access cycles forever.
    pub async fn run(self) {
        self.lock.lock().await.boot_lock().await;

        loop {
            info!(policy = %self.config.policy, "waiting for credentials");
            let grant = self.signals.wait_granted(self.config.policy).await;
            info!(card = grant.card, combo = grant.combo, "access condition met");

            if !self.state.door_state().is_closed() {
                warn!("credentials satisfied but door is open, deferring unlock");
                self.state.wait_door_closed().await;
            }

            self.lock.lock().await.release_lock().await;
            // Anything latched while we waited on the door must not leak
            // into the next cycle.
            self.signals.clear_all();
            self.audit.record(AccessEventKind::AccessGranted {
                via_card: grant.card,
                via_combo: grant.combo,
            });
        }
    }
}
