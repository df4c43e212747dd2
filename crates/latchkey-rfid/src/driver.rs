//! Request/anti-collision driver for the reader chip.

use crate::bus::RegisterBus;
use crate::error::{ErrorFlags, Result, RfidError};
use crate::registers::{
    ANTENNA_ON, BitFraming, COLL_CLEAR, FIFO_FLUSH, IRQ_CLEAR_ALL, IRQ_IDLE, IRQ_RX, PcdCommand,
    Register, START_SEND, picc,
};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::trace;

/// Timeout for a single request or anti-collision exchange. Generous for
/// the chip's command turnaround, short enough to keep the poll loop live.
pub const TRANSCEIVE_TIMEOUT: Duration = Duration::from_millis(50);

/// Interval between interrupt-status polls during a transceive.
const IRQ_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Settle time after a soft reset before the chip accepts configuration.
const RESET_SETTLE: Duration = Duration::from_millis(50);

/// Fixed configuration programmed after every reset: timer auto-start with a
/// ~25ms reload (TMode/TPrescaler/TReload), forced 100% ASK modulation,
/// maximum receiver gain, and the ISO 14443A CRC preset 0x6363.
const INIT_SEQUENCE: [(Register, u8); 7] = [
    (Register::TMode, 0x8D),
    (Register::TPrescaler, 0x3E),
    (Register::TReloadHi, 0x00),
    (Register::TReloadLo, 0x1E),
    (Register::TxAsk, 0x40),
    (Register::RfCfg, 0x70),
    (Register::Mode, 0x3D),
];

/// Answer-to-request payload: two bytes acknowledging card presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atqa(pub [u8; 2]);

/// Cascade-level-1 identification: four UID bytes plus the block check
/// character the card appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawUid {
    pub uid: [u8; 4],
    pub bcc: u8,
}

impl RawUid {
    /// Whether the transmitted check byte matches the XOR of the UID bytes.
    #[must_use]
    pub fn bcc_ok(&self) -> bool {
        self.uid.iter().fold(0u8, |acc, b| acc ^ b) == self.bcc
    }
}

/// Outcome of a completed transceive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransceiveResult {
    /// Received bytes, at most the caller-supplied capacity.
    pub bytes: Vec<u8>,

    /// The FIFO held more bytes than the caller's capacity.
    pub truncated: bool,
}

/// Driver for an MFRC522-style reader over a [`RegisterBus`].
///
/// # Examples
///
/// ```
/// use latchkey_rfid::{Mfrc522, mock::MockChipBus};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> latchkey_rfid::Result<()> {
/// let (bus, handle) = MockChipBus::new();
/// let mut reader = Mfrc522::new(bus);
///
/// let version = reader.reset_and_configure().await?;
/// assert_eq!(version, 0x92);
///
/// handle.present_card([0xEA, 0xE8, 0xD2, 0x84]);
/// reader.request_a().await?;
/// let raw = reader.anticollision_cl1().await?;
/// assert!(raw.bcc_ok());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Mfrc522<B> {
    bus: B,
}

impl<B: RegisterBus> Mfrc522<B> {
    /// Wrap a register bus.
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Soft-reset the chip and program the fixed operating configuration,
    /// enabling the transmit antenna if it is not already on.
    ///
    /// Returns the Version register value read back, which doubles as the
    /// liveness check: a dead bus fails here and the caller degrades the
    /// card channel instead of aborting.
    ///
    /// # Errors
    ///
    /// Returns an error if any bus transaction fails.
    pub async fn reset_and_configure(&mut self) -> Result<u8> {
        self.bus
            .write(Register::Command, PcdCommand::SoftReset as u8)
            .await?;
        sleep(RESET_SETTLE).await;

        for (reg, value) in INIT_SEQUENCE {
            self.bus.write(reg, value).await?;
        }
        self.antenna_on().await?;

        let version = self.bus.read(Register::Version).await?;
        trace!(version = %format_args!("0x{version:02X}"), "reader configured");
        Ok(version)
    }

    /// Enable both antenna drivers unless they are already on.
    async fn antenna_on(&mut self) -> Result<()> {
        let value = self.bus.read(Register::TxControl).await?;
        if value & ANTENNA_ON != ANTENNA_ON {
            self.bus.write(Register::TxControl, value | ANTENNA_ON).await?;
        }
        Ok(())
    }

    /// Send REQA and wait for an ATQA.
    ///
    /// Any pending collision state is cleared first; the wake command is a
    /// 7-bit short frame per ISO 14443A.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` when no card answers, `ShortFrame` on a truncated
    /// ATQA, and bus/protocol errors as-is. All of them mean "no card" to
    /// the polling loop.
    pub async fn request_a(&mut self) -> Result<Atqa> {
        self.bus.write(Register::Coll, COLL_CLEAR).await?;
        let result = self
            .transceive(&[picc::REQA], BitFraming::ShortFrame, 2, TRANSCEIVE_TIMEOUT)
            .await?;
        if result.bytes.len() < 2 {
            return Err(RfidError::ShortFrame {
                expected: 2,
                got: result.bytes.len(),
            });
        }
        Ok(Atqa([result.bytes[0], result.bytes[1]]))
    }

    /// Run the cascade-level-1 select/anti-collision exchange.
    ///
    /// Expects exactly five returned bytes: four UID bytes and the card's
    /// check byte. The exchange uses full-byte framing.
    ///
    /// # Errors
    ///
    /// Returns `ShortFrame` when the card answers with fewer than five
    /// bytes (a truncated cascade must not be reported as a UID), plus the
    /// usual timeout/bus/protocol errors.
    pub async fn anticollision_cl1(&mut self) -> Result<RawUid> {
        self.bus.write(Register::Coll, COLL_CLEAR).await?;
        let result = self
            .transceive(
                &[picc::SEL_CL1, picc::ANTICOLL],
                BitFraming::FullBytes,
                5,
                TRANSCEIVE_TIMEOUT,
            )
            .await?;
        if result.bytes.len() < 5 {
            return Err(RfidError::ShortFrame {
                expected: 5,
                got: result.bytes.len(),
            });
        }
        let mut uid = [0u8; 4];
        uid.copy_from_slice(&result.bytes[..4]);
        Ok(RawUid {
            uid,
            bcc: result.bytes[4],
        })
    }

    /// Execute one framed exchange: load the FIFO, start the Transceive
    /// command, and poll the interrupt status until the response is ready
    /// or `timeout` elapses.
    ///
    /// The received byte count is read from the FIFO level register and
    /// capped at `capacity`.
    ///
    /// # Errors
    ///
    /// - `Timeout` if neither the receive-complete nor the idle interrupt
    ///   arrives in time (the bounded busy-poll, not an unbounded spin).
    /// - `Protocol` if the error register flags buffer overflow, parity, or
    ///   protocol violations.
    /// - `EmptyResponse` if the command completed with an empty FIFO.
    /// - `Bus` if any register transaction fails.
    pub async fn transceive(
        &mut self,
        tx: &[u8],
        framing: BitFraming,
        capacity: usize,
        timeout: Duration,
    ) -> Result<TransceiveResult> {
        // Stop whatever command is running and start from a clean slate.
        self.bus
            .write(Register::Command, PcdCommand::Idle as u8)
            .await?;
        self.bus.write(Register::ComIrq, IRQ_CLEAR_ALL).await?;
        self.bus.set_bits(Register::FifoLevel, FIFO_FLUSH).await?;
        self.bus.write(Register::BitFraming, framing.bits()).await?;

        for &byte in tx {
            self.bus.write(Register::FifoData, byte).await?;
        }

        self.bus
            .write(Register::Command, PcdCommand::Transceive as u8)
            .await?;
        self.bus.set_bits(Register::BitFraming, START_SEND).await?;

        let deadline = Instant::now() + timeout;
        loop {
            let irq = self.bus.read(Register::ComIrq).await?;
            if irq & (IRQ_RX | IRQ_IDLE) != 0 {
                break;
            }
            if Instant::now() >= deadline {
                // Stop driving the carrier before reporting the miss.
                let _ = self.bus.clear_bits(Register::BitFraming, START_SEND).await;
                return Err(RfidError::Timeout {
                    duration_ms: timeout.as_millis() as u64,
                });
            }
            sleep(IRQ_POLL_INTERVAL).await;
        }

        self.bus.clear_bits(Register::BitFraming, START_SEND).await?;

        let flags = ErrorFlags::from_register(self.bus.read(Register::Error).await?);
        if flags.any_fatal() {
            return Err(RfidError::Protocol { flags });
        }

        let level = self.bus.read(Register::FifoLevel).await?;
        if level == 0 {
            return Err(RfidError::EmptyResponse);
        }
        let count = (level as usize).min(capacity);
        let mut bytes = Vec::with_capacity(count);
        for _ in 0..count {
            bytes.push(self.bus.read(Register::FifoData).await?);
        }
        trace!(rx = count, truncated = level as usize > capacity, "transceive complete");
        Ok(TransceiveResult {
            bytes,
            truncated: level as usize > capacity,
        })
    }
}
