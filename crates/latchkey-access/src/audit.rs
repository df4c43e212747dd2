//! Volatile access event log.
//!
//! A bounded in-memory ring of the most recent access decisions and lock
//! transitions, for diagnostics and tests. Nothing is persisted: credential
//! history outliving the process is explicitly out of scope.

use chrono::{DateTime, Utc};
use latchkey_core::CardUid;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Maximum number of events retained. About 32 bytes each, and a complete
/// access cycle produces 2-3 events, so this covers dozens of cycles.
const MAX_EVENTS: usize = 100;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum AccessEventKind {
    /// An allow-listed card was presented.
    CardAccepted { uid: CardUid },
    /// A card outside the allow-list was presented.
    CardRejected { uid: CardUid },
    /// The captured combination matched the target.
    ComboAccepted,
    /// A full-length combination did not match the target.
    ComboRejected,
    /// The dispatcher released the lock.
    AccessGranted { via_card: bool, via_combo: bool },
    /// The lock was engaged.
    Locked,
}

/// One timestamped log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: AccessEventKind,
}

/// Cloneable handle to the shared event ring.
#[derive(Debug, Clone, Default)]
pub struct AccessLog {
    events: Arc<Mutex<VecDeque<AccessEvent>>>,
}

impl AccessLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, evicting the oldest entry when full.
    pub fn record(&self, kind: AccessEventKind) {
        let mut events = self.events.lock().expect("access log poisoned");
        events.push_back(AccessEvent {
            timestamp: Utc::now(),
            kind,
        });
        if events.len() > MAX_EVENTS {
            events.pop_front();
        }
    }

    /// All retained events, oldest first.
    pub fn events(&self) -> Vec<AccessEvent> {
        self.events
            .lock()
            .expect("access log poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Kinds only, oldest first. Convenient for assertions.
    pub fn kinds(&self) -> Vec<AccessEventKind> {
        self.events
            .lock()
            .expect("access log poisoned")
            .iter()
            .map(|e| e.kind)
            .collect()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.lock().expect("access log poisoned").len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_read_back() {
        let log = AccessLog::new();
        assert!(log.is_empty());

        let uid = CardUid::new([0xEA, 0xE8, 0xD2, 0x84]);
        log.record(AccessEventKind::CardAccepted { uid });
        log.record(AccessEventKind::AccessGranted {
            via_card: true,
            via_combo: false,
        });

        let kinds = log.kinds();
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[0], AccessEventKind::CardAccepted { uid });
    }

    #[test]
    fn test_ring_caps_at_limit() {
        let log = AccessLog::new();
        for _ in 0..(MAX_EVENTS + 25) {
            log.record(AccessEventKind::Locked);
        }
        assert_eq!(log.len(), MAX_EVENTS);
    }

    #[test]
    fn test_clone_shares_storage() {
        let log = AccessLog::new();
        let clone = log.clone();
        clone.record(AccessEventKind::ComboAccepted);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_event_serialization() {
        let event = AccessEvent {
            timestamp: Utc::now(),
            kind: AccessEventKind::CardRejected {
                uid: CardUid::new([1, 2, 3, 4]),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("card_rejected"));
    }
}
