//! Error types for reader operations.
//!
//! None of these are fatal to the system: the card polling loop maps every
//! variant to "no card present this cycle" and retries on the next poll.

use crate::registers::{ERR_BUFFER_OVFL, ERR_FATAL_MASK, ERR_PARITY, ERR_PROTOCOL};
use std::fmt;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, RfidError>;

/// Errors that can occur while talking to the reader chip or the card.
#[derive(Debug, thiserror::Error)]
pub enum RfidError {
    /// The register bus transaction itself failed.
    #[error("Bus error: {message}")]
    Bus { message: String },

    /// No receive-complete/idle interrupt within the caller's timeout.
    #[error("Transceive timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The chip flagged the exchange as corrupt.
    #[error("Protocol error: {flags}")]
    Protocol { flags: ErrorFlags },

    /// The card answered with fewer bytes than the exchange requires.
    #[error("Short frame: expected {expected} bytes, got {got}")]
    ShortFrame { expected: usize, got: usize },

    /// The command completed but the FIFO holds no response.
    #[error("Empty response")]
    EmptyResponse,
}

impl RfidError {
    /// Create a new bus error.
    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus {
            message: message.into(),
        }
    }
}

/// Decoded view of the chip's error register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFlags(u8);

impl ErrorFlags {
    /// Decode the raw error register value.
    #[must_use]
    pub fn from_register(raw: u8) -> Self {
        ErrorFlags(raw)
    }

    /// Any error bit that fails a transceive is set.
    #[must_use]
    pub fn any_fatal(self) -> bool {
        self.0 & ERR_FATAL_MASK != 0
    }

    /// The FIFO overflowed while receiving.
    #[must_use]
    pub fn buffer_overflow(self) -> bool {
        self.0 & ERR_BUFFER_OVFL != 0
    }

    /// A parity check failed.
    #[must_use]
    pub fn parity(self) -> bool {
        self.0 & ERR_PARITY != 0
    }

    /// The frame violated the protocol (bad SOF).
    #[must_use]
    pub fn protocol(self) -> bool {
        self.0 & ERR_PROTOCOL != 0
    }

    /// Raw register value.
    #[must_use]
    pub fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = Vec::new();
        if self.buffer_overflow() {
            names.push("buffer-overflow");
        }
        if self.parity() {
            names.push("parity");
        }
        if self.protocol() {
            names.push("protocol");
        }
        if names.is_empty() {
            write!(f, "none (0x{:02X})", self.0)
        } else {
            write!(f, "{} (0x{:02X})", names.join("+"), self.0)
        }
    }
}
