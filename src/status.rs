use core::fmt;

/// Debounced presence status of one reader.
///
/// Variants are ordered: anything above [`ReadStatus::TagExit`] means a tag
/// is considered present.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReadStatus {
    /// No scan has completed yet.
    #[default]
    Init,
    NoTag,
    TagExit,
    TagEnter,
    TagRepeat,
}

const STATUS_STR: [&str; 5] = ["Initial", "No Tag", "Tag Exit", "Tag Enter", "Tag Repeat"];

impl ReadStatus {
    pub fn as_str(self) -> &'static str {
        STATUS_STR[self as usize]
    }

    /// `true` for [`ReadStatus::TagEnter`] and [`ReadStatus::TagRepeat`].
    pub fn is_present(self) -> bool {
        self > ReadStatus::TagExit
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReadStatus::Init, "Initial")]
    #[case(ReadStatus::NoTag, "No Tag")]
    #[case(ReadStatus::TagExit, "Tag Exit")]
    #[case(ReadStatus::TagEnter, "Tag Enter")]
    #[case(ReadStatus::TagRepeat, "Tag Repeat")]
    fn status_text(#[case] status: ReadStatus, #[case] text: &str) {
        assert_eq!(status.as_str(), text);
        assert_eq!(status.to_string(), text);
    }

    #[test]
    fn default_is_init() {
        assert_eq!(ReadStatus::default(), ReadStatus::Init);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_variant_names() {
        let json = serde_json::to_string(&ReadStatus::TagEnter).unwrap();
        assert_eq!(json, "\"TagEnter\"");
        let back: ReadStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ReadStatus::TagEnter);
    }

    #[test]
    fn only_enter_and_repeat_are_present() {
        assert!(!ReadStatus::Init.is_present());
        assert!(!ReadStatus::NoTag.is_present());
        assert!(!ReadStatus::TagExit.is_present());
        assert!(ReadStatus::TagEnter.is_present());
        assert!(ReadStatus::TagRepeat.is_present());
    }
}
