//! Tag presence state machine for a single reader.
//!
//! [`Reader::advance`] never blocks. A call either triggers a scan, does
//! nothing because the chip is still answering, or collects the answer and
//! updates the debounced [`ReadStatus`]:
//!
//! ```text
//!   idle --scan--> waiting --window elapsed--> collect --> idle
//! ```
//!
//! A valid frame is [`FRAME_LEN`] bytes with no error flags. Anything else is
//! a miss. `miss_threshold` consecutive misses demote a present tag to
//! `TagExit`; a further miss cycle drops to `NoTag` and forgets the tag.

use crate::clock::Millis;
use crate::config::ReaderConfig;
use crate::register::{Command, Fifo, Register, FIFO_FLUSH, FIFO_LEN, FRAME_LEN, SCAN_REQUEST};
use crate::status::ReadStatus;
use crate::transceiver::Transceiver;
use crate::uid::{self, MERG_STR_LEN, UID_STR_LEN};
use crate::{Error, Result};
use tracing::{debug, trace, warn};

/// Error flags assumed when the error register cannot be read.
const UNREADABLE_FLAGS: u8 = 0xFF;

/// Register values read back in the collection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Collected {
    fifo_len: u8,
    error_flags: u8,
    /// A full `FIFO_LEN` payload was read this cycle.
    payload_ok: bool,
}

impl Collected {
    fn is_valid_frame(&self) -> bool {
        self.payload_ok && self.error_flags == 0 && self.fifo_len == FRAME_LEN
    }
}

#[derive(Debug, Clone)]
pub struct Reader {
    address: u8,
    status: ReadStatus,
    current_id: Fifo,
    previous_id: Fifo,
    miss_count: u8,
    waiting: bool,
    scan_issued_at: Millis,
    last_cycle_ms: Millis,
    bus_failing: bool,
    cycle_failed: bool,
    config: ReaderConfig,
}

impl Reader {
    pub fn new(address: u8) -> Self {
        Self::with_config(address, ReaderConfig::default())
    }

    pub fn with_config(address: u8, config: ReaderConfig) -> Self {
        Self {
            address,
            status: ReadStatus::Init,
            current_id: [0; FIFO_LEN],
            previous_id: [0; FIFO_LEN],
            miss_count: 0,
            waiting: false,
            scan_issued_at: 0,
            last_cycle_ms: 0,
            bus_failing: false,
            cycle_failed: false,
            config,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }
    pub fn status(&self) -> ReadStatus {
        self.status
    }
    pub fn status_str(&self) -> &'static str {
        self.status.as_str()
    }
    /// Most recently read FIFO payload.
    pub fn current_id(&self) -> &Fifo {
        &self.current_id
    }
    /// Payload of the last valid frame.
    pub fn previous_id(&self) -> &Fifo {
        &self.previous_id
    }
    pub fn miss_count(&self) -> u8 {
        self.miss_count
    }
    /// `true` while a scan is outstanding.
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }
    /// Duration of the most recently completed scan cycle.
    pub fn last_cycle_ms(&self) -> Millis {
        self.last_cycle_ms
    }
    /// `true` while bus transactions keep failing; cleared by a clean cycle.
    pub fn bus_failing(&self) -> bool {
        self.bus_failing
    }
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn uid_string(&self) -> heapless::String<UID_STR_LEN> {
        uid::uid_string(&self.current_id)
    }
    pub fn merg_string(&self) -> heapless::String<MERG_STR_LEN> {
        uid::merg_string(&self.current_id)
    }

    /// Runs the bring-up sequence on this reader's chip.
    pub fn init<T: Transceiver + ?Sized>(&mut self, bus: &mut T) -> Result<()> {
        bus.initialize(self.address)
    }

    /// Moves the state machine one step and returns the current status.
    pub fn advance<T: Transceiver + ?Sized>(&mut self, bus: &mut T, now: Millis) -> ReadStatus {
        if !self.waiting {
            self.issue_scan(bus, now);
        } else if now.saturating_sub(self.scan_issued_at) >= self.config.wait_ms {
            self.waiting = false;
            let collected = self.collect(bus);
            self.last_cycle_ms = now.saturating_sub(self.scan_issued_at);
            self.apply(collected);
        }
        self.status
    }

    /// First failure of a run is a warning, repeats are debug noise.
    fn bus_error(&mut self, what: &'static str, error: Error) {
        let address = self.address;
        if self.bus_failing {
            debug!(address, %error, "{}", what);
        } else {
            warn!(address, %error, "{}", what);
            self.bus_failing = true;
        }
        self.cycle_failed = true;
    }

    fn issue_scan<T: Transceiver + ?Sized>(&mut self, bus: &mut T, now: Millis) {
        let address = self.address;
        self.cycle_failed = false;
        let issued = bus
            .write_register(address, Register::FifoControl, &[FIFO_FLUSH])
            .and_then(|_| bus.write_register(address, Register::FifoData, &SCAN_REQUEST))
            .and_then(|_| {
                bus.write_register(address, Register::Command, &[Command::Transceive as u8])
            });
        if let Err(e) = issued {
            // the window still runs; collection will see an invalid frame
            self.bus_error("scan trigger failed", e);
        }
        trace!(address, now, "scan issued");
        self.scan_issued_at = now;
        self.waiting = true;
    }

    fn collect<T: Transceiver + ?Sized>(&mut self, bus: &mut T) -> Collected {
        let address = self.address;

        let mut len = [0u8; 1];
        let fifo_len = match bus.read_register(address, Register::FifoLength, &mut len) {
            Ok(1) => len[0],
            Ok(_) => 0,
            Err(e) => {
                self.bus_error("fifo length read failed", e);
                0
            }
        };

        let mut payload_ok = false;
        if fifo_len != 0 {
            let mut buf: Fifo = [0; FIFO_LEN];
            match bus.read_register(address, Register::FifoData, &mut buf) {
                Ok(n) => {
                    let n = n.min(FIFO_LEN);
                    self.current_id[..n].copy_from_slice(&buf[..n]);
                    payload_ok = n == FIFO_LEN;
                }
                Err(e) => self.bus_error("fifo read failed", e),
            }
        }

        if let Err(e) = bus.write_register(address, Register::FifoControl, &[FIFO_FLUSH]) {
            self.bus_error("fifo flush failed", e);
        }

        let mut flags = [0u8; 1];
        let error_flags = match bus.read_register(address, Register::Error, &mut flags) {
            Ok(1) => flags[0],
            Ok(_) => UNREADABLE_FLAGS,
            Err(e) => {
                self.bus_error("error flags read failed", e);
                UNREADABLE_FLAGS
            }
        };

        if !self.cycle_failed {
            self.bus_failing = false;
        }

        trace!(address, fifo_len, error_flags, payload_ok, "scan collected");
        Collected {
            fifo_len,
            error_flags,
            payload_ok,
        }
    }

    fn apply(&mut self, collected: Collected) {
        let before = self.status;

        if collected.is_valid_frame() {
            if self.current_id == self.previous_id {
                self.status = ReadStatus::TagRepeat;
            } else {
                self.status = ReadStatus::TagEnter;
                self.previous_id = self.current_id;
            }
            self.miss_count = 0;
        } else {
            self.miss_count = self.miss_count.saturating_add(1);
            if self.miss_count >= self.config.miss_threshold {
                if self.status.is_present() {
                    self.current_id = [0; FIFO_LEN];
                    self.status = ReadStatus::TagExit;
                } else {
                    self.current_id = [0; FIFO_LEN];
                    self.previous_id = [0; FIFO_LEN];
                    self.status = ReadStatus::NoTag;
                }
            }
        }

        if self.status != before {
            debug!(
                address = self.address,
                from = before.as_str(),
                to = self.status.as_str(),
                miss_count = self.miss_count,
                "status changed"
            );
        }
    }
}
