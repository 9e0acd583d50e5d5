use crate::register::{Register, INIT_SEQUENCE};
use crate::{Error, Result};

/// Largest single write transaction, register byte included.
pub const MAX_WRITE: usize = 16;

/// Addressed access to a shared bus.
///
/// Writes and reads are issued in call order; nothing is buffered across calls.
pub trait Transceiver {
    /// One complete write transaction to `address`.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<()>;

    /// Requests `buf.len()` bytes from `address` and returns how many arrived.
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize>;

    /// `true` if a device acknowledges `address`.
    fn probe(&mut self, address: u8) -> bool {
        self.write(address, &[]).is_ok()
    }

    fn write_register(&mut self, address: u8, reg: Register, value: &[u8]) -> Result<()> {
        let overflow = Error::Overflow {
            len: value.len() + 1,
        };
        let mut tx: heapless::Vec<u8, MAX_WRITE> = heapless::Vec::new();
        tx.push(reg as u8).map_err(|_| overflow)?;
        tx.extend_from_slice(value).map_err(|_| overflow)?;
        self.write(address, &tx)
    }

    fn read_register(&mut self, address: u8, reg: Register, buf: &mut [u8]) -> Result<usize> {
        self.write(address, &[reg as u8])?;
        self.read(address, buf)
    }

    /// Runs the bring-up sequence for the reader at `address`.
    fn initialize(&mut self, address: u8) -> Result<()> {
        for (reg, value) in INIT_SEQUENCE {
            self.write_register(address, *reg, value)?;
        }
        Ok(())
    }
}

impl<T: Transceiver + ?Sized> Transceiver for &mut T {
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<()> {
        (**self).write(address, bytes)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize> {
        (**self).read(address, buf)
    }

    fn probe(&mut self, address: u8) -> bool {
        (**self).probe(address)
    }

    fn initialize(&mut self, address: u8) -> Result<()> {
        (**self).initialize(address)
    }
}
