//! Latched credential signals and their drain semantics.
//!
//! Each producer (card poller, combination capture) raises its own flag;
//! the dispatcher is the single consumer. Flags live behind one mutex so a
//! consumer can never observe a half-updated pair, and a `Notify` wakes the
//! dispatcher instead of having it poll.

use latchkey_core::{AccessPolicy, Channel};
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Flags {
    card: bool,
    combo: bool,
}

/// Which channels were drained to satisfy the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub card: bool,
    pub combo: bool,
}

/// The credential-signal group: two latched flags plus a wakeup.
///
/// Designed for exactly one consumer ([`wait_granted`](Self::wait_granted));
/// producers may be arbitrary.
#[derive(Debug, Default)]
pub struct CredentialSignals {
    flags: Mutex<Flags>,
    notify: Notify,
}

impl CredentialSignals {
    /// Create with both signals clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a channel's signal and wake the dispatcher.
    pub fn raise(&self, channel: Channel) {
        {
            let mut flags = self.flags.lock().expect("signal flags poisoned");
            match channel {
                Channel::Card => flags.card = true,
                Channel::Combo => flags.combo = true,
            }
        }
        self.notify.notify_one();
    }

    /// Whether a channel's signal is currently latched.
    pub fn is_raised(&self, channel: Channel) -> bool {
        let flags = self.flags.lock().expect("signal flags poisoned");
        match channel {
            Channel::Card => flags.card,
            Channel::Combo => flags.combo,
        }
    }

    /// Clear both signals unconditionally.
    pub fn clear_all(&self) {
        let mut flags = self.flags.lock().expect("signal flags poisoned");
        flags.card = false;
        flags.combo = false;
    }

    /// Block until the policy is satisfied, draining the involved signals
    /// atomically.
    ///
    /// - `And`: returns only once both signals are latched concurrently,
    ///   consuming the pair in one critical section. Arrival order is
    ///   irrelevant.
    /// - `Or`: returns once either signal is latched; every signal set at
    ///   that moment is drained so a stale latch cannot satisfy a future
    ///   cycle.
    pub async fn wait_granted(&self, policy: AccessPolicy) -> Grant {
        loop {
            // Register for wakeup before checking, so a raise between the
            // check and the await is not lost (notify_one stores a permit).
            let notified = self.notify.notified();
            if let Some(grant) = self.try_consume(policy) {
                return grant;
            }
            notified.await;
        }
    }

    fn try_consume(&self, policy: AccessPolicy) -> Option<Grant> {
        let mut flags = self.flags.lock().expect("signal flags poisoned");
        match policy {
            AccessPolicy::And => {
                if flags.card && flags.combo {
                    flags.card = false;
                    flags.combo = false;
                    Some(Grant {
                        card: true,
                        combo: true,
                    })
                } else {
                    None
                }
            }
            AccessPolicy::Or => {
                if flags.card || flags.combo {
                    let grant = Grant {
                        card: flags.card,
                        combo: flags.combo,
                    };
                    flags.card = false;
                    flags.combo = false;
                    Some(grant)
                } else {
                    None
                }
            }
        }
    }
}
