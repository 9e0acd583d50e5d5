//! Simulated reader chips for tests and host-side development.
//!
//! [`MockBus`] answers the same register protocol a real chip does: a
//! transceive command latches the presented tag (or nothing) into the FIFO,
//! a FIFO flush clears it, and register reads return the latched values.

use crate::register::{Command, Fifo, Register, FIFO_LEN, FRAME_LEN};
use crate::transceiver::Transceiver;
use crate::{Error, Result};

const ADDRESS_SPACE: usize = 128;
const WRITE_LOG_LEN: usize = 64;

#[derive(Debug, Clone, Copy)]
struct MockChip {
    attached: bool,
    fail_init: bool,
    fail_read: Option<u8>,
    initialized: bool,
    tag: Option<Fifo>,
    fifo_len: Option<u8>,
    error_flags: u8,
    pointer: u8,
    latched_len: u8,
    latched: Fifo,
    transceives: u32,
}

const DETACHED: MockChip = MockChip {
    attached: false,
    fail_init: false,
    fail_read: None,
    initialized: false,
    tag: None,
    fifo_len: None,
    error_flags: 0,
    pointer: 0,
    latched_len: 0,
    latched: [0; FIFO_LEN],
    transceives: 0,
};

impl MockChip {
    fn write(&mut self, bytes: &[u8]) -> core::result::Result<(), ()> {
        let (&reg, value) = match bytes.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };
        self.pointer = reg;
        let first = match value.first() {
            Some(&b) => b,
            None => return Ok(()),
        };
        if reg == Register::FifoControl as u8 {
            self.latched_len = 0;
            self.latched = [0; FIFO_LEN];
        } else if reg == Register::Command as u8 {
            if first == Command::SoftReset as u8 {
                if self.fail_init {
                    return Err(());
                }
                self.initialized = true;
            } else if first == Command::Transceive as u8 {
                self.transceives += 1;
                let present = if self.tag.is_some() { FRAME_LEN } else { 0 };
                self.latched_len = self.fifo_len.unwrap_or(present);
                self.latched = self.tag.unwrap_or([0; FIFO_LEN]);
            }
        }
        Ok(())
    }

    fn read(&self, buf: &mut [u8]) -> usize {
        if self.pointer == Register::FifoLength as u8 {
            fill(buf, &[self.latched_len])
        } else if self.pointer == Register::FifoData as u8 {
            let n = FIFO_LEN.min(self.latched_len as usize);
            fill(buf, &self.latched[..n])
        } else if self.pointer == Register::Error as u8 {
            fill(buf, &[self.error_flags])
        } else {
            buf.iter_mut().for_each(|b| *b = 0);
            buf.len()
        }
    }
}

fn fill(buf: &mut [u8], src: &[u8]) -> usize {
    let n = buf.len().min(src.len());
    buf[..n].copy_from_slice(&src[..n]);
    n
}

/// A bus with up to 128 simulated chips, all detached initially.
#[derive(Debug, Clone)]
pub struct MockBus {
    chips: [MockChip; ADDRESS_SPACE],
    transactions: usize,
    write_log: heapless::Vec<(u8, u8), WRITE_LOG_LEN>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            chips: [DETACHED; ADDRESS_SPACE],
            transactions: 0,
            write_log: heapless::Vec::new(),
        }
    }

    fn chip_mut(&mut self, address: u8) -> Option<&mut MockChip> {
        self.chips.get_mut(address as usize)
    }

    fn chip(&self, address: u8) -> Option<&MockChip> {
        self.chips.get(address as usize)
    }

    /// Connects a chip at `address`; it acknowledges from now on.
    pub fn attach(&mut self, address: u8) {
        if let Some(chip) = self.chip_mut(address) {
            chip.attached = true;
        }
    }

    /// Disconnects `address`; every transaction to it fails.
    pub fn detach(&mut self, address: u8) {
        if let Some(chip) = self.chip_mut(address) {
            chip.attached = false;
        }
    }

    /// Places a tag in the field. `fifo` is what the next transceive latches.
    pub fn present_tag(&mut self, address: u8, fifo: Fifo) {
        if let Some(chip) = self.chip_mut(address) {
            chip.tag = Some(fifo);
        }
    }

    pub fn remove_tag(&mut self, address: u8) {
        if let Some(chip) = self.chip_mut(address) {
            chip.tag = None;
        }
    }

    /// Overrides the FIFO length reported after a transceive.
    pub fn set_fifo_len(&mut self, address: u8, len: Option<u8>) {
        if let Some(chip) = self.chip_mut(address) {
            chip.fifo_len = len;
        }
    }

    pub fn set_error_flags(&mut self, address: u8, flags: u8) {
        if let Some(chip) = self.chip_mut(address) {
            chip.error_flags = flags;
        }
    }

    /// Makes the soft reset step of bring-up fail at `address`.
    pub fn fail_init(&mut self, address: u8, fail: bool) {
        if let Some(chip) = self.chip_mut(address) {
            chip.fail_init = fail;
        }
    }

    /// Makes every read of `reg` at `address` fail; `None` restores reads.
    pub fn fail_register_read(&mut self, address: u8, reg: Option<Register>) {
        if let Some(chip) = self.chip_mut(address) {
            chip.fail_read = reg.map(|r| r as u8);
        }
    }

    /// `(address, register)` of each register write, oldest first. Holds the
    /// first 64 writes since the last [`MockBus::clear_write_log`].
    pub fn write_log(&self) -> &[(u8, u8)] {
        &self.write_log
    }

    pub fn clear_write_log(&mut self) {
        self.write_log.clear();
    }

    pub fn is_initialized(&self, address: u8) -> bool {
        self.chip(address).map_or(false, |c| c.initialized)
    }

    /// Transceive commands received by `address`.
    pub fn transceive_count(&self, address: u8) -> u32 {
        self.chip(address).map_or(0, |c| c.transceives)
    }

    /// Every transaction attempted on the bus, failed ones included.
    pub fn transactions(&self) -> usize {
        self.transactions
    }
}

impl Transceiver for MockBus {
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<()> {
        self.transactions += 1;
        if let Some(&reg) = bytes.first() {
            let _ = self.write_log.push((address, reg));
        }
        match self.chip_mut(address) {
            Some(chip) if chip.attached => chip.write(bytes).map_err(|_| Error::Com { address }),
            _ => Err(Error::Com { address }),
        }
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize> {
        self.transactions += 1;
        match self.chip(address) {
            Some(chip) if chip.attached && chip.fail_read != Some(chip.pointer) => {
                Ok(chip.read(buf))
            }
            _ => Err(Error::Com { address }),
        }
    }
}
