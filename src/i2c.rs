use crate::transceiver::Transceiver;
use crate::{Error, Result};
use embedded_hal::blocking::i2c;

/// [`Transceiver`] over a blocking `embedded-hal` I2C bus.
pub struct I2cTransceiver<I2C> {
    com: I2C,
}
impl<I2C> I2cTransceiver<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { com: i2c }
    }
    pub fn release(self) -> I2C {
        self.com
    }
}
impl<I2C> Transceiver for I2cTransceiver<I2C>
where
    I2C: i2c::Read + i2c::Write,
{
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<()> {
        self.com
            .write(address, bytes)
            .map_err(|_| Error::Com { address })
    }
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize> {
        self.com
            .read(address, buf)
            .map_err(|_| Error::Com { address })?;
        Ok(buf.len())
    }
}
