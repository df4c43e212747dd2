//! Hardware collaborator layer for the Latchkey door access controller.
//!
//! This crate defines trait-based abstractions for the peripherals the
//! controller drives or samples: the lock actuator, the door contact, the
//! analog combination dial, and the operator feedback devices (character
//! display, buzzer, status LEDs). Mock implementations with programmatic
//! control handles support development and testing without physical
//! hardware.
//!
//! # Design
//!
//! - **Async-first**: all I/O is `async fn` in traits (Edition 2024 RPITIT,
//!   no `async_trait` macro).
//! - **Normalized contracts**: trait methods speak logical state (`closed`,
//!   `locked`); electrical polarity is a wiring concern handled inside each
//!   device implementation via [`latchkey_core::Polarity`].
//! - **Serialized feedback**: display, buzzer, and LEDs are owned by a
//!   single [`panel::FeedbackWorker`] task; the rest of the system sends
//!   fire-and-forget commands through a cloneable [`panel::FeedbackHandle`],
//!   so concurrent loops can never interleave partial display writes.
//! - **Error-aware**: operations return [`Result<T>`][error::Result] with
//!   [`HardwareError`] describing disconnections and I/O failures. Callers
//!   in the control plane treat these as transient and retry next poll.

pub mod error;
pub mod mock;
pub mod panel;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use panel::{FeedbackCommand, FeedbackHandle, FeedbackWorker};
pub use traits::{Buzzer, Display, DoorContact, LockActuator, PositionDial, StatusLeds};
pub use types::{BeepPattern, Led};
