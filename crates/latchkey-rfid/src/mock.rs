//! In-memory simulation of the reader chip and a card in its field.
//!
//! [`MockChipBus`] implements [`RegisterBus`] over a simulated register
//! file and FIFO. The paired [`MockChipHandle`] scripts the environment:
//! which card (if any) sits in the field, whether the next exchange is
//! corrupted or truncated, and whether the bus itself fails.
//!
//! The simulation executes an exchange at the moment the driver sets the
//! StartSend bit while the Transceive command is active, which is exactly
//! the ordering contract the real chip imposes.

use crate::bus::RegisterBus;
use crate::error::{Result, RfidError};
use crate::registers::{FIFO_FLUSH, IRQ_RX, PcdCommand, Register, START_SEND, picc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// ATQA reported by the simulated card (Mifare Classic 1K, LSB first).
const SIM_ATQA: [u8; 2] = [0x04, 0x00];

/// Version register value of the simulated chip (MFRC522 v2).
const SIM_VERSION: u8 = 0x92;

#[derive(Debug)]
struct ChipState {
    regs: [u8; 0x40],
    fifo: VecDeque<u8>,
    tx_buffer: Vec<u8>,
    card: Option<([u8; 4], u8)>,
    version: u8,
    truncate_anticoll: bool,
    inject_error: u8,
    fail_bus: u32,
}

impl ChipState {
    fn new() -> Self {
        Self {
            regs: [0; 0x40],
            fifo: VecDeque::new(),
            tx_buffer: Vec::new(),
            card: None,
            version: SIM_VERSION,
            truncate_anticoll: false,
            inject_error: 0,
            fail_bus: 0,
        }
    }

    fn soft_reset(&mut self) {
        self.regs = [0; 0x40];
        self.fifo.clear();
        self.tx_buffer.clear();
    }

    /// Run one over-the-air exchange based on the loaded FIFO bytes.
    fn execute_exchange(&mut self) {
        self.regs[Register::Error.addr() as usize] = self.inject_error;
        let injected = self.inject_error != 0;
        self.inject_error = 0;

        let tx = std::mem::take(&mut self.tx_buffer);
        if injected {
            // The chip saw a carrier but flagged the frame: the command
            // completes and the error register tells the story.
            self.regs[Register::ComIrq.addr() as usize] |= IRQ_RX;
            return;
        }

        let Some((uid, bcc)) = self.card else {
            // Empty field: no interrupt ever fires, the driver times out.
            return;
        };

        match tx.as_slice() {
            [cmd] if *cmd == picc::REQA => {
                self.fifo.extend(SIM_ATQA);
                self.regs[Register::ComIrq.addr() as usize] |= IRQ_RX;
            }
            [sel, nvb] if *sel == picc::SEL_CL1 && *nvb == picc::ANTICOLL => {
                self.fifo.extend(uid);
                if !self.truncate_anticoll {
                    self.fifo.push_back(bcc);
                }
                self.regs[Register::ComIrq.addr() as usize] |= IRQ_RX;
            }
            _ => {
                // Unknown frame: the card stays silent.
            }
        }
    }
}

/// Simulated register bus to a reader chip with a scriptable card field.
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
/// reader.reset_and_configure().await?;
///
/// handle.present_card([0x01, 0x02, 0x03, 0x04]);
/// assert!(reader.request_a().await.is_ok());
///
/// handle.remove_card();
/// assert!(reader.request_a().await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockChipBus {
    state: Arc<Mutex<ChipState>>,
}

impl MockChipBus {
    /// Create a simulated chip with an empty card field.
    pub fn new() -> (Self, MockChipHandle) {
        let state = Arc::new(Mutex::new(ChipState::new()));
        let bus = Self {
            state: Arc::clone(&state),
        };
        (bus, MockChipHandle { state })
    }
}

impl RegisterBus for MockChipBus {
    async fn read(&mut self, reg: Register) -> Result<u8> {
        let mut state = self.state.lock().expect("chip state poisoned");
        if state.fail_bus > 0 {
            state.fail_bus -= 1;
            return Err(RfidError::bus("simulated bus failure"));
        }
        let value = match reg {
            Register::Version => state.version,
            Register::FifoLevel => state.fifo.len() as u8,
            Register::FifoData => state.fifo.pop_front().unwrap_or(0),
            other => state.regs[other.addr() as usize],
        };
        Ok(value)
    }

    async fn write(&mut self, reg: Register, value: u8) -> Result<()> {
        let mut state = self.state.lock().expect("chip state poisoned");
        if state.fail_bus > 0 {
            state.fail_bus -= 1;
            return Err(RfidError::bus("simulated bus failure"));
        }
        match reg {
            Register::Command => {
                state.regs[reg.addr() as usize] = value;
                if value == PcdCommand::SoftReset as u8 {
                    state.soft_reset();
                }
            }
            Register::ComIrq => {
                // Writing with bit 7 clear clears the marked request bits.
                let current = state.regs[reg.addr() as usize];
                state.regs[reg.addr() as usize] = current & !value;
            }
            Register::FifoData => {
                state.tx_buffer.push(value);
            }
            Register::FifoLevel => {
                if value & FIFO_FLUSH != 0 {
                    state.fifo.clear();
                    state.tx_buffer.clear();
                }
            }
            Register::BitFraming => {
                state.regs[reg.addr() as usize] = value;
                let transceiving = state.regs[Register::Command.addr() as usize]
                    == PcdCommand::Transceive as u8;
                if value & START_SEND != 0 && transceiving {
                    state.execute_exchange();
                }
            }
            other => {
                state.regs[other.addr() as usize] = value;
            }
        }
        Ok(())
    }
}

/// Scripting handle for a [`MockChipBus`].
#[derive(Debug, Clone)]
pub struct MockChipHandle {
    state: Arc<Mutex<ChipState>>,
}

impl MockChipHandle {
    /// Place a card in the field; its check byte is derived from the UID.
    pub fn present_card(&self, uid: [u8; 4]) {
        let bcc = uid.iter().fold(0u8, |acc, b| acc ^ b);
        self.present_card_with_bcc(uid, bcc);
    }

    /// Place a card in the field with an explicit (possibly wrong) check
    /// byte.
    pub fn present_card_with_bcc(&self, uid: [u8; 4], bcc: u8) {
        self.state.lock().expect("chip state poisoned").card = Some((uid, bcc));
    }

    /// Remove the card from the field.
    pub fn remove_card(&self) {
        self.state.lock().expect("chip state poisoned").card = None;
    }

    /// Deliver only 4 of the 5 anti-collision bytes on subsequent
    /// exchanges.
    pub fn truncate_anticollision(&self, truncate: bool) {
        self.state
            .lock()
            .expect("chip state poisoned")
            .truncate_anticoll = truncate;
    }

    /// Set the error register for the next exchange (one-shot).
    pub fn inject_error(&self, flags: u8) {
        self.state.lock().expect("chip state poisoned").inject_error = flags;
    }

    /// Make the next `count` bus transactions fail.
    pub fn fail_bus(&self, count: u32) {
        self.state.lock().expect("chip state poisoned").fail_bus = count;
    }

    /// Override the Version register value.
    pub fn set_version(&self, version: u8) {
        self.state.lock().expect("chip state poisoned").version = version;
    }

    /// Current value of a simulated register.
    pub fn reg(&self, reg: Register) -> u8 {
        self.state.lock().expect("chip state poisoned").regs[reg.addr() as usize]
    }
}
