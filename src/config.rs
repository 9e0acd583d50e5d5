use crate::clock::Millis;
use crate::{Error, Result};

/// Readers per bus, bounded by the chip's selectable address range.
pub const MAX_READERS: usize = 4;

/// Highest 7-bit address outside the reserved range.
const MAX_ADDRESS: u8 = 0x77;

/// Per-reader timing and debounce settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderConfig {
    /// Time the chip needs between a transceive command and a readable FIFO.
    pub wait_ms: Millis,
    /// Consecutive invalid reads before presence is demoted.
    pub miss_threshold: u8,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            wait_ms: 12,
            miss_threshold: 2,
        }
    }
}

impl ReaderConfig {
    pub fn with_wait_ms(mut self, wait_ms: Millis) -> Self {
        self.wait_ms = wait_ms;
        self
    }

    pub fn with_miss_threshold(mut self, miss_threshold: u8) -> Self {
        self.miss_threshold = miss_threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.wait_ms == 0 {
            return Err(Error::Config("wait_ms must be greater than zero"));
        }
        if self.miss_threshold == 0 {
            return Err(Error::Config("miss_threshold must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GroupConfig {
    /// Reported with every event from this group.
    pub group_id: u8,
    /// First candidate address; discovery probes `MAX_READERS` consecutive addresses.
    pub base_address: u8,
    pub reader: ReaderConfig,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            group_id: 0,
            base_address: 0x28,
            reader: ReaderConfig::default(),
        }
    }
}

impl GroupConfig {
    pub fn with_group_id(mut self, group_id: u8) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn with_base_address(mut self, base_address: u8) -> Self {
        self.base_address = base_address;
        self
    }

    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    /// Candidate addresses in probe order.
    pub fn addresses(&self) -> impl Iterator<Item = u8> {
        let base = self.base_address;
        (0..MAX_READERS as u8).map(move |i| base.wrapping_add(i))
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_address < 0x08
            || self.base_address as usize + MAX_READERS - 1 > MAX_ADDRESS as usize
        {
            return Err(Error::Config("base_address range must lie within 0x08..=0x77"));
        }
        self.reader.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_hardware() {
        let config = GroupConfig::default();
        assert_eq!(config.base_address, 0x28);
        assert_eq!(config.reader.wait_ms, 12);
        assert_eq!(config.reader.miss_threshold, 2);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.addresses().collect::<Vec<_>>(),
            vec![0x28, 0x29, 0x2A, 0x2B]
        );
    }

    #[rstest]
    #[case(GroupConfig::default().with_base_address(0x75))]
    #[case(GroupConfig::default().with_base_address(0x00))]
    #[case(GroupConfig::default().with_reader(ReaderConfig::default().with_wait_ms(0)))]
    #[case(GroupConfig::default().with_reader(ReaderConfig::default().with_miss_threshold(0)))]
    fn invalid_configs(#[case] config: GroupConfig) {
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn highest_valid_base() {
        assert!(GroupConfig::default()
            .with_base_address(0x74)
            .validate()
            .is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_and_defaults() {
        let config = GroupConfig::default()
            .with_group_id(2)
            .with_reader(ReaderConfig::default().with_wait_ms(8));
        let json = serde_json::to_string(&config).unwrap();
        let back: GroupConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: GroupConfig = serde_json::from_str(r#"{"group_id": 5}"#).unwrap();
        assert_eq!(partial.group_id, 5);
        assert_eq!(partial.base_address, 0x28);
        assert_eq!(partial.reader, ReaderConfig::default());
    }
}
