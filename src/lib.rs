//! Non-blocking tag presence detection for I2C RFID readers.
//!
//! A [`ReaderGroup`] owns every reader found on one bus and advances exactly
//! one of them per [`ReaderGroup::tick`]. Each [`Reader`] runs a small state
//! machine: it triggers a scan, returns immediately, and collects the answer
//! on a later call once the chip's response window has elapsed. Debounced
//! status changes are delivered to a [`ReaderEventHandler`].
//!
//! ```
//! use sfr_rfid::mock::MockBus;
//! use sfr_rfid::{GroupConfig, ReadStatus, ReaderGroup};
//! use core::cell::Cell;
//!
//! let now = Cell::new(0u64);
//! let mut bus = MockBus::new();
//! bus.attach(0x28);
//! bus.present_tag(0x28, [0, 0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6, 0x07, 0x18]);
//!
//! let mut group = ReaderGroup::new(bus, || now.get(), GroupConfig::default()).unwrap();
//! assert_eq!(group.discover(), 1);
//!
//! group.tick();
//! now.set(12);
//! let event = group.tick().unwrap();
//! assert_eq!(event.status, ReadStatus::TagEnter);
//! assert_eq!(group.reader(0).unwrap().uid_string(), "1807F6E5D4C3B2A1");
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod clock;
pub mod config;
pub mod group;
pub mod i2c;
pub mod mock;
pub mod reader;
pub mod register;
pub mod status;
pub mod transceiver;
pub mod uid;

pub use clock::{Clock, Millis};
pub use config::{GroupConfig, ReaderConfig, MAX_READERS};
pub use group::{NoHandler, ReaderEvent, ReaderEventHandler, ReaderGroup};
pub use i2c::I2cTransceiver;
pub use reader::Reader;
pub use status::ReadStatus;
pub use transceiver::Transceiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// 通信接口出错
    #[error("bus transaction with 0x{address:02X} failed")]
    Com { address: u8 },
    /// Payload does not fit a single write transaction.
    #[error("write of {len} bytes exceeds transaction buffer")]
    Overflow { len: usize },
    #[error("invalid configuration: {0}")]
    Config(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;
