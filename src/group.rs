//! Round-robin scheduling of every reader on one bus.
//!
//! The bus is half duplex and shared, so the group advances exactly one
//! reader per [`ReaderGroup::tick`]. With `n` readers each one is advanced
//! once every `n` ticks. Calling `tick` from a single thread of control is
//! what serialises bus access; no locking is involved.

use crate::clock::Clock;
use crate::config::{GroupConfig, MAX_READERS};
use crate::reader::Reader;
use crate::status::ReadStatus;
use crate::transceiver::Transceiver;
use crate::Result;
use heapless::Vec;
use tracing::{debug, info, warn};

/// Edge-triggered status change of one reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderEvent {
    pub group_id: u8,
    /// Position of the reader in discovery order.
    pub reader_index: usize,
    pub status: ReadStatus,
}

pub trait ReaderEventHandler {
    fn on_reader_event(&mut self, event: ReaderEvent, reader: &Reader);
}

impl<F> ReaderEventHandler for F
where
    F: FnMut(ReaderEvent, &Reader),
{
    fn on_reader_event(&mut self, event: ReaderEvent, reader: &Reader) {
        self(event, reader)
    }
}

/// Handler that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHandler;

impl ReaderEventHandler for NoHandler {
    fn on_reader_event(&mut self, _event: ReaderEvent, _reader: &Reader) {}
}

pub struct ReaderGroup<T, C, H = NoHandler> {
    bus: T,
    clock: C,
    config: GroupConfig,
    readers: Vec<Reader, MAX_READERS>,
    last_status: [ReadStatus; MAX_READERS],
    cursor: usize,
    handler: H,
}

impl<T, C> ReaderGroup<T, C, NoHandler>
where
    T: Transceiver,
    C: Clock,
{
    /// Creates an empty group. Call [`ReaderGroup::discover`] to populate it.
    pub fn new(bus: T, clock: C, config: GroupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            bus,
            clock,
            config,
            readers: Vec::new(),
            last_status: [ReadStatus::Init; MAX_READERS],
            cursor: 0,
            handler: NoHandler,
        })
    }
}

impl<T, C, H> ReaderGroup<T, C, H>
where
    T: Transceiver,
    C: Clock,
    H: ReaderEventHandler,
{
    /// Replaces the event handler.
    pub fn with_event_handler<H2: ReaderEventHandler>(self, handler: H2) -> ReaderGroup<T, C, H2> {
        ReaderGroup {
            bus: self.bus,
            clock: self.clock,
            config: self.config,
            readers: self.readers,
            last_status: self.last_status,
            cursor: self.cursor,
            handler,
        }
    }

    /// Probes every candidate address and rebuilds the group from the readers
    /// that acknowledge and complete bring-up. Returns how many were found.
    pub fn discover(&mut self) -> usize {
        self.readers.clear();
        self.last_status = [ReadStatus::Init; MAX_READERS];
        self.cursor = 0;

        for address in self.config.addresses() {
            if !self.bus.probe(address) {
                debug!(group = self.config.group_id, address, "no reader");
                continue;
            }
            let mut reader = Reader::with_config(address, self.config.reader);
            if let Err(e) = reader.init(&mut self.bus) {
                warn!(group = self.config.group_id, address, error = %e, "reader bring-up failed");
                continue;
            }
            debug!(group = self.config.group_id, address, index = self.readers.len(), "reader found");
            // at most MAX_READERS candidate addresses
            let _ = self.readers.push(reader);
        }

        info!(group = self.config.group_id, found = self.readers.len(), "discovery complete");
        self.readers.len()
    }

    /// Advances the reader under the cursor and moves the cursor on.
    ///
    /// Returns the event delivered to the handler, if the reader's status
    /// changed to anything other than [`ReadStatus::Init`].
    pub fn tick(&mut self) -> Option<ReaderEvent> {
        if self.readers.is_empty() {
            return None;
        }
        if self.cursor >= self.readers.len() {
            self.cursor = 0;
        }

        let index = self.cursor;
        let now = self.clock.now();
        let reader = &mut self.readers[index];
        let status = reader.advance(&mut self.bus, now);

        let mut fired = None;
        if status != ReadStatus::Init && status != self.last_status[index] {
            self.last_status[index] = status;
            let event = ReaderEvent {
                group_id: self.config.group_id,
                reader_index: index,
                status,
            };
            self.handler.on_reader_event(event, reader);
            fired = Some(event);
        }

        self.cursor = (index + 1) % self.readers.len();
        fired
    }

    pub fn group_id(&self) -> u8 {
        self.config.group_id
    }
    pub fn config(&self) -> &GroupConfig {
        &self.config
    }
    pub fn len(&self) -> usize {
        self.readers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
    pub fn readers(&self) -> &[Reader] {
        &self.readers
    }
    pub fn reader(&self, index: usize) -> Option<&Reader> {
        self.readers.get(index)
    }
    /// Last status reported to the handler for `index`.
    pub fn last_status(&self, index: usize) -> Option<ReadStatus> {
        self.readers.get(index).map(|_| self.last_status[index])
    }
    /// Index of the reader the next `tick` advances.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
    pub fn bus(&self) -> &T {
        &self.bus
    }
    pub fn bus_mut(&mut self) -> &mut T {
        &mut self.bus
    }
    pub fn handler(&self) -> &H {
        &self.handler
    }
    pub fn into_bus(self) -> T {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;
    use crate::register::Fifo;
    use core::cell::{Cell, RefCell};
    use std::rc::Rc;

    const TAG: Fifo = [0x00, 0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6, 0x07, 0x18];

    fn bus_with(addresses: &[u8]) -> MockBus {
        let mut bus = MockBus::new();
        for &a in addresses {
            bus.attach(a);
        }
        bus
    }

    #[test]
    fn discover_keeps_probe_order_and_skips_gaps() {
        let now = Cell::new(0u64);
        let bus = bus_with(&[0x2B, 0x28, 0x2A]);
        let mut group = ReaderGroup::new(bus, || now.get(), GroupConfig::default()).unwrap();
        assert_eq!(group.discover(), 3);
        let addresses: std::vec::Vec<u8> = group.readers().iter().map(Reader::address).collect();
        assert_eq!(addresses, vec![0x28, 0x2A, 0x2B]);
        assert!(group.bus().is_initialized(0x2A));
    }

    #[test]
    fn discover_skips_failed_bring_up() {
        let now = Cell::new(0u64);
        let mut bus = bus_with(&[0x28, 0x29]);
        bus.fail_init(0x28, true);
        let mut group = ReaderGroup::new(bus, || now.get(), GroupConfig::default()).unwrap();
        assert_eq!(group.discover(), 1);
        assert_eq!(group.reader(0).map(Reader::address), Some(0x29));
    }

    #[test]
    fn rediscovery_rebuilds_the_group() {
        let now = Cell::new(0u64);
        let bus = bus_with(&[0x28, 0x29]);
        let mut group = ReaderGroup::new(bus, || now.get(), GroupConfig::default()).unwrap();
        group.discover();
        group.tick();
        group.bus_mut().detach(0x28);
        assert_eq!(group.discover(), 1);
        assert_eq!(group.cursor(), 0);
        assert_eq!(group.last_status(0), Some(ReadStatus::Init));
        assert_eq!(group.last_status(1), None);
    }

    #[test]
    fn tick_without_readers_is_a_no_op() {
        let mut group =
            ReaderGroup::new(MockBus::new(), || 0u64, GroupConfig::default()).unwrap();
        assert_eq!(group.discover(), 0);
        assert!(group.is_empty());
        assert_eq!(group.tick(), None);
        assert_eq!(group.bus().transactions(), MAX_READERS);
    }

    #[test]
    fn round_robin_advances_each_reader_once() {
        let now = Cell::new(0u64);
        let bus = bus_with(&[0x28, 0x29, 0x2A, 0x2B]);
        let mut group = ReaderGroup::new(bus, || now.get(), GroupConfig::default()).unwrap();
        group.discover();

        for (i, address) in (0x28..=0x2B).enumerate() {
            assert_eq!(group.cursor(), i);
            group.tick();
            assert_eq!(group.bus().transceive_count(address), 1);
            for later in address + 1..=0x2B {
                assert_eq!(group.bus().transceive_count(later), 0);
            }
        }
        assert_eq!(group.cursor(), 0);
        assert!(group.readers().iter().all(Reader::is_waiting));
    }

    #[test]
    fn events_are_edge_triggered() {
        let now = Cell::new(0u64);
        let events = Rc::new(RefCell::new(std::vec::Vec::new()));
        let sink = events.clone();

        let mut bus = bus_with(&[0x28]);
        bus.present_tag(0x28, TAG);
        let config = GroupConfig::default().with_group_id(3);
        let mut group = ReaderGroup::new(bus, || now.get(), config)
            .unwrap()
            .with_event_handler(move |event: ReaderEvent, reader: &Reader| {
                sink.borrow_mut().push((event, reader.uid_string()));
            });
        group.discover();

        for step in 0..10 {
            now.set(step * 12);
            group.tick();
        }

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].0,
            ReaderEvent {
                group_id: 3,
                reader_index: 0,
                status: ReadStatus::TagEnter
            }
        );
        assert_eq!(events[0].1, "1807F6E5D4C3B2A1");
        assert_eq!(events[1].0.status, ReadStatus::TagRepeat);
    }

    #[test]
    fn init_status_is_never_reported() {
        let now = Cell::new(0u64);
        let bus = bus_with(&[0x28]);
        let mut group = ReaderGroup::new(bus, || now.get(), GroupConfig::default()).unwrap();
        group.discover();

        // scan, then one miss: still Init
        assert_eq!(group.tick(), None);
        now.set(12);
        assert_eq!(group.tick(), None);
        assert_eq!(group.tick(), None);
        now.set(24);
        let event = group.tick().unwrap();
        assert_eq!(event.status, ReadStatus::NoTag);
        assert_eq!(group.last_status(0), Some(ReadStatus::NoTag));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GroupConfig::default().with_base_address(0x76);
        assert!(ReaderGroup::new(MockBus::new(), || 0u64, config).is_err());
    }
}
