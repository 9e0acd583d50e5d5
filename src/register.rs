//! Register map and fixed command sequences of the reader chip.

/// Bytes in a complete tag frame as reported by the FIFO length register.
pub const FRAME_LEN: u8 = 13;
/// Bytes captured from the FIFO on each collection.
pub const FIFO_LEN: usize = 9;

pub type Fifo = [u8; FIFO_LEN];

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    Command = 0x00,
    HostCtrl = 0x01,
    FifoControl = 0x02,
    WaterLevel = 0x03,
    FifoLength = 0x04,
    FifoData = 0x05,
    Irq0 = 0x06,
    Irq1 = 0x07,
    Irq0En = 0x08,
    Irq1En = 0x09,
    Error = 0x0A,
    Status = 0x0B,
    DrvMode = 0x28,
    RxAna = 0x37,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Idle = 0x00,
    Transmit = 0x06,
    Transceive = 0x07,
    LoadReg = 0x0C,
    LoadProtocol = 0x0D,
    SoftReset = 0x1F,
}

/// FIFO control value that flushes the FIFO.
pub const FIFO_FLUSH: u8 = 0xB0;

/// Tag request written to the FIFO before each transceive.
pub const SCAN_REQUEST: [u8; 7] = [0x76, 0xA0, 0x04, 0x00, 0x00, 0x00, 0x00];

/// Bring-up sequence, written in order once per discovered reader.
pub const INIT_SEQUENCE: &[(Register, &[u8])] = &[
    (Register::Command, &[Command::SoftReset as u8]),
    (Register::FifoControl, &[FIFO_FLUSH]),
    // protocol arguments: rx 0, tx 0
    (Register::FifoData, &[0x00, 0x00]),
    (Register::Command, &[Command::LoadProtocol as u8]),
    (Register::FifoControl, &[FIFO_FLUSH]),
    // EEPROM 0x0194 -> 0x28, 17 registers
    (Register::FifoData, &[0x01, 0x94, 0x28, 0x11]),
    (Register::Command, &[Command::LoadReg as u8]),
    (Register::Command, &[Command::Transmit as u8]),
    (Register::DrvMode, &[0x8F]),
    (Register::RxAna, &[0x14]),
];
