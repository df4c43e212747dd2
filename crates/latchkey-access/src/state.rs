//! Shared door/lock state group.
//!
//! One mutex guards the door state, lock state, and re-lock bookkeeping as a
//! single logically-atomic group; door transitions are additionally
//! published on a `watch` channel so the dispatcher can block on "door
//! closed" without polling. Critical sections never await, so a plain
//! `std::sync::Mutex` is sufficient and keeps the accessors callable from
//! sync test code.

use latchkey_core::{DoorState, LockState};
use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::watch;
use tokio::time::Instant;

/// Consistent point-in-time view of the door/lock group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorLockSnapshot {
    pub door: DoorState,
    pub lock: LockState,
    pub pending_relock: bool,
}

#[derive(Debug)]
struct Inner {
    door: DoorState,
    lock: LockState,
    /// A re-lock is owed: set on every release, cleared on engagement.
    pending_relock: bool,
    /// When the armed deferred re-lock fires. Non-`None` only while
    /// `pending_relock` is true (checked invariant).
    relock_armed_at: Option<Instant>,
    /// Moment of the last release; runs until a lock occurs, even past the
    /// max-open ceiling.
    unlocked_at: Option<Instant>,
}

/// Door/lock state shared by the monitor, controller, and dispatcher.
///
/// Writers are fixed by construction: only the door monitor calls
/// [`set_door`](Self::set_door), only the lock controller calls
/// [`note_locked`](Self::note_locked)/[`note_unlocked`](Self::note_unlocked).
#[derive(Debug)]
pub struct SharedState {
    inner: Mutex<Inner>,
    door_tx: watch::Sender<DoorState>,
    combo_reset: AtomicBool,
}

impl SharedState {
    /// Create the state group with everything unknown.
    pub fn new() -> Self {
        let (door_tx, _) = watch::channel(DoorState::Unknown);
        Self {
            inner: Mutex::new(Inner {
                door: DoorState::Unknown,
                lock: LockState::Unknown,
                pending_relock: false,
                relock_armed_at: None,
                unlocked_at: None,
            }),
            door_tx,
            combo_reset: AtomicBool::new(false),
        }
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("door/lock state poisoned")
    }

    /// Current door state.
    pub fn door_state(&self) -> DoorState {
        self.lock_inner().door
    }

    /// Current lock state.
    pub fn lock_state(&self) -> LockState {
        self.lock_inner().lock
    }

    /// Consistent snapshot of the whole group.
    pub fn snapshot(&self) -> DoorLockSnapshot {
        let inner = self.lock_inner();
        DoorLockSnapshot {
            door: inner.door,
            lock: inner.lock,
            pending_relock: inner.pending_relock,
        }
    }

    /// Record a door observation and publish it to watchers.
    ///
    /// Door monitor only.
    pub fn set_door(&self, door: DoorState) {
        {
            let mut inner = self.lock_inner();
            inner.door = door;
        }
        self.door_tx.send_replace(door);
    }

    /// Subscribe to door transitions.
    pub fn subscribe_door(&self) -> watch::Receiver<DoorState> {
        self.door_tx.subscribe()
    }

    /// Block until the door is observed closed (immediately if it already
    /// is).
    pub async fn wait_door_closed(&self) {
        let mut rx = self.subscribe_door();
        // The sender lives inside self, so the channel cannot close while
        // we are waiting on it.
        let _ = rx.wait_for(|door| door.is_closed()).await;
    }

    /// Record that the lock was engaged: clears the pending re-lock, its
    /// schedule, and the unlock stopwatch.
    ///
    /// Lock controller only.
    pub fn note_locked(&self) {
        let mut inner = self.lock_inner();
        inner.lock = LockState::Locked;
        inner.pending_relock = false;
        inner.relock_armed_at = None;
        inner.unlocked_at = None;
    }

    /// Record that the lock was released at `now`: starts the max-open
    /// stopwatch and marks the re-lock as owed.
    ///
    /// Lock controller only.
    pub fn note_unlocked(&self, now: Instant) {
        let mut inner = self.lock_inner();
        inner.lock = LockState::Unlocked;
        inner.pending_relock = true;
        inner.relock_armed_at = None;
        inner.unlocked_at = Some(now);
    }

    /// Whether a re-lock is owed.
    pub fn pending_relock(&self) -> bool {
        self.lock_inner().pending_relock
    }

    /// Schedule the deferred re-lock. Ignored unless a re-lock is owed,
    /// which keeps the armed-implies-pending invariant by construction.
    pub fn arm_relock(&self, at: Instant) {
        let mut inner = self.lock_inner();
        if inner.pending_relock {
            inner.relock_armed_at = Some(at);
        }
    }

    /// Cancel the armed schedule (the owed re-lock itself stays pending).
    pub fn cancel_relock_arm(&self) {
        self.lock_inner().relock_armed_at = None;
    }

    /// When the armed re-lock fires, if one is armed.
    pub fn relock_armed_at(&self) -> Option<Instant> {
        self.lock_inner().relock_armed_at
    }

    /// Moment of the last release, while the lock remains released.
    pub fn unlocked_at(&self) -> Option<Instant> {
        self.lock_inner().unlocked_at
    }

    /// Ask the combination capture loop to drop any partial entry. Checked
    /// opportunistically by that loop on its next iteration.
    pub fn request_combo_reset(&self) {
        self.combo_reset.store(true, Ordering::Release);
    }

    /// Consume a pending combo-reset request.
    pub fn take_combo_reset(&self) -> bool {
        self.combo_reset.swap(false, Ordering::AcqRel)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
