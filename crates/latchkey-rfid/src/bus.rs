//! Register-addressed serial bus abstraction.
//!
//! The reader chip exposes a flat register file; concrete transports (SPI on
//! the reference hardware, the in-memory simulation in [`crate::mock`])
//! implement single-register reads and writes, and the driver builds
//! everything else from those two operations.

#![allow(async_fn_in_trait)]

use crate::Result;
use crate::registers::Register;
use std::future::Future;

/// Byte-wide register access to the reader chip.
///
/// Implementations must be cancel-safe at transaction granularity: a read or
/// write either completes or fails as a unit.
pub trait RegisterBus: Send {
    /// Read one register.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction does not complete.
    fn read(&mut self, reg: Register) -> impl Future<Output = Result<u8>> + Send;

    /// Write one register.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction does not complete.
    fn write(&mut self, reg: Register, value: u8) -> impl Future<Output = Result<()>> + Send;

    /// Read-modify-write: set the bits in `mask`.
    ///
    /// # Errors
    ///
    /// Returns an error if either underlying transaction fails.
    fn set_bits(&mut self, reg: Register, mask: u8) -> impl Future<Output = Result<()>> + Send {
        async move {
            let value = self.read(reg).await?;
            self.write(reg, value | mask).await
        }
    }

    /// Read-modify-write: clear the bits in `mask`.
    ///
    /// # Errors
    ///
    /// Returns an error if either underlying transaction fails.
    fn clear_bits(&mut self, reg: Register, mask: u8) -> impl Future<Output = Result<()>> + Send {
        async move {
            let value = self.read(reg).await?;
            self.write(reg, value & !mask).await
        }
    }
}

/// SPI address byte for a register access.
///
/// The chip expects the register address in bits 6..1 with bit 7 as the
/// read flag and bit 0 held low.
#[inline]
#[must_use]
pub fn spi_address(reg: Register, read: bool) -> u8 {
    let mut addr = (reg.addr() << 1) & 0x7E;
    if read {
        addr |= 0x80;
    }
    addr
}
