/*!
    Conversion utilities between ffmpeg-next types and ffmpeg-types.
*/

use ffmpeg_next::{DictionaryRef, media::Type};

use ffmpeg_types::{MediaKind, Metadata, Rational};

/**
    Convert ffmpeg_next::Rational to our Rational.
*/
pub(crate) fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

/**
    Convert an ffmpeg_next::Rational that may be 0/0 or 0/1 to an optional Rational.
*/
pub(crate) fn known_rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Option<Rational> {
    Rational::non_zero(r.numerator(), r.denominator())
}

pub(crate) fn media_kind_from_ffmpeg(kind: Type) -> MediaKind {
    match kind {
        Type::Video => MediaKind::Video,
        Type::Audio => MediaKind::Audio,
        Type::Subtitle => MediaKind::Subtitle,
        Type::Data => MediaKind::Data,
        Type::Attachment => MediaKind::Attachment,
        Type::Unknown => MediaKind::Unknown,
    }
}

/**
    Copy an FFmpeg dictionary into owned metadata.

    Keys repeated in the dictionary keep their first value.
*/
pub(crate) fn metadata_from_ffmpeg(dictionary: &DictionaryRef<'_>) -> Metadata {
    let mut metadata = Metadata::new();
    for (key, value) in dictionary.iter() {
        metadata
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_conversion() {
        let r = rational_from_ffmpeg(ffmpeg_next::Rational::new(1, 90000));
        assert_eq!(r, Rational::new(1, 90000));

        assert_eq!(
            known_rational_from_ffmpeg(ffmpeg_next::Rational::new(25, 1)),
            Some(Rational::new(25, 1))
        );
        assert_eq!(known_rational_from_ffmpeg(ffmpeg_next::Rational::new(0, 1)), None);
        assert_eq!(known_rational_from_ffmpeg(ffmpeg_next::Rational::new(0, 0)), None);
    }

    #[test]
    fn media_kind_conversion() {
        assert_eq!(media_kind_from_ffmpeg(Type::Video), MediaKind::Video);
        assert_eq!(media_kind_from_ffmpeg(Type::Audio), MediaKind::Audio);
        assert_eq!(media_kind_from_ffmpeg(Type::Subtitle), MediaKind::Subtitle);
        assert_eq!(media_kind_from_ffmpeg(Type::Unknown), MediaKind::Unknown);
    }

    #[test]
    fn metadata_conversion() {
        let mut dictionary = ffmpeg_next::Dictionary::new();
        dictionary.set("title", "Test Tone");
        dictionary.set("artist", "Nobody");

        let metadata = metadata_from_ffmpeg(&dictionary);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get("title").map(String::as_str), Some("Test Tone"));
        assert_eq!(metadata.get("artist").map(String::as_str), Some("Nobody"));
    }
}
