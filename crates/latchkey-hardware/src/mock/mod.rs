//! Mock device implementations for testing and development.
//!
//! Every mock comes as a `(device, handle)` pair: the device half implements
//! the hardware trait and is handed to a control loop, the handle half stays
//! with the test (or the simulator) to script stimuli and inspect what the
//! loop did.

pub mod dial;
pub mod door;
pub mod feedback;
pub mod lock;

// Re-export commonly used types
pub use dial::{MockDial, MockDialHandle};
pub use door::{MockDoorContact, MockDoorHandle};
pub use feedback::{
    MockBuzzer, MockBuzzerHandle, MockDisplay, MockDisplayHandle, MockLeds, MockLedsHandle,
};
pub use lock::{MockLock, MockLockHandle};
