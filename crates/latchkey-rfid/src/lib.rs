//! MFRC522-style contactless reader driver for the Latchkey controller.
//!
//! The reader chip is addressed register-by-register over a clocked serial
//! bus; this crate abstracts that bus behind [`RegisterBus`] and implements
//! the ISO 14443A presence/identification exchange on top of it:
//!
//! 1. [`Mfrc522::reset_and_configure`] — soft reset and programming of the
//!    timer, modulation, and gain registers to fixed known-good values.
//! 2. [`Mfrc522::request_a`] — the REQA wake command with short-frame bit
//!    alignment, answered by a 2-byte ATQA when a card is in the field.
//! 3. [`Mfrc522::anticollision_cl1`] — the cascade-level-1 anti-collision
//!    exchange, answered by 4 UID bytes plus a block check character.
//!
//! Every exchange runs through the bounded-timeout [`Mfrc522::transceive`]
//! primitive. Failures are ordinary [`RfidError`] values; the caller maps
//! all of them to "no card this cycle" and retries on its next poll.
//!
//! [`mock::MockChipBus`] emulates the chip's register file and FIFO together
//! with a single card in the field, so driver behavior — including short
//! frames, error flags, and timeouts — is testable without hardware.

pub mod bus;
pub mod driver;
pub mod error;
pub mod mock;
pub mod registers;

pub use bus::{RegisterBus, spi_address};
pub use driver::{Atqa, Mfrc522, RawUid, TRANSCEIVE_TIMEOUT, TransceiveResult};
pub use error::{ErrorFlags, Result, RfidError};
pub use registers::{BitFraming, PcdCommand, Register};
