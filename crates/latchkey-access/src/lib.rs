//! Control plane of the Latchkey door access controller.
//!
//! Five cooperating tokio tasks own the system's behavior:
//!
//! - the **door monitor** ([`door::DoorMonitor`]) polls the door contact,
//!   publishes [`latchkey_core::DoorState`] transitions, arms and fires the
//!   deferred re-lock, and enforces the maximum-unlock-open ceiling;
//! - the **combination capture** loop ([`combo::ComboCaptureLoop`]) turns the
//!   noisy dial reading into settled digits and evaluates the sequence;
//! - the **card poller** ([`card::CardPoller`]) runs the request /
//!   anti-collision exchange and checks the UID against the allow-list;
//! - the **access dispatcher** ([`dispatcher::AccessDispatcher`]) merges the
//!   two credential signals under the configured AND/OR policy, gates on the
//!   door being closed, and releases the lock;
//! - the **feedback worker** (from `latchkey-hardware`) serializes display,
//!   buzzer, and LED output.
//!
//! Shared state is split into independent mutual-exclusion groups so that a
//! blocked dispatcher never stalls an unrelated loop: the door/lock group
//! ([`state::SharedState`], with a `watch` channel for door transitions),
//! the credential-signal group ([`signals::CredentialSignals`], with a
//! `Notify`), and the display group (the feedback worker's queue).
//!
//! The one safety invariant lives in [`lock::LockController`]: the lock is
//! never commanded to the engaged position unless the door is observed
//! closed at that moment.

pub mod audit;
pub mod card;
pub mod combo;
pub mod dispatcher;
pub mod door;
pub mod lock;
pub mod signals;
pub mod state;
pub mod system;

pub use audit::{AccessEvent, AccessEventKind, AccessLog};
pub use combo::{ComboCapture, ComboEvent, quantize};
pub use signals::{CredentialSignals, Grant};
pub use state::SharedState;
pub use system::{AccessSystem, spawn_system};
