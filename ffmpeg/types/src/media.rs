/*!
    Media kinds and metadata.
*/

use std::collections::BTreeMap;
use std::fmt;

/**
    String tags read verbatim from a container or stream header.

    No schema is implied, keys differ between container formats.
*/
pub type Metadata = BTreeMap<String, String>;

/**
    Media type of an elementary stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
    Data,
    Attachment,
    Unknown,
}

impl MediaKind {
    /**
        Returns true for the kinds that carry a decodable codec.
    */
    pub const fn is_decodable(self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Data => "data",
            Self::Attachment => "attachment",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_decodable() {
        assert!(MediaKind::Video.is_decodable());
        assert!(MediaKind::Audio.is_decodable());
        assert!(!MediaKind::Subtitle.is_decodable());
        assert!(!MediaKind::Data.is_decodable());
    }

    #[test]
    fn media_kind_display() {
        assert_eq!(MediaKind::Subtitle.to_string(), "subtitle");
    }
}
