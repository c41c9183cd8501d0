/*!
    Elementary stream handle.
*/

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ffmpeg_types::{MediaKind, Metadata, Rational, StreamInfo};

use crate::codec::Codec;
use crate::frame::Frame;

struct StreamInner {
    info: StreamInfo,
    codec: Option<Codec>,
    session: Arc<AtomicBool>,
}

/**
    One elementary stream of a loaded container.

    Streams are shared handles. A stream is only valid while the session
    that enumerated it is alive, after that [`Stream::is_valid`] returns
    false and its packets decode to nothing.
*/
#[derive(Clone)]
pub struct Stream {
    inner: Arc<StreamInner>,
}

impl Stream {
    /**
        Create a stream handle.

        `session` is the liveness flag of the owning session, shared by all
        streams it enumerates. `codec` is None when no decoder could be
        opened, the stream stays enumerable but produces no frames.
    */
    pub fn new(info: StreamInfo, codec: Option<Codec>, session: Arc<AtomicBool>) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                info,
                codec,
                session,
            }),
        }
    }

    /**
        Container-relative index.
    */
    pub fn index(&self) -> usize {
        self.inner.info.index
    }

    pub fn kind(&self) -> MediaKind {
        self.inner.info.kind
    }

    pub fn time_base(&self) -> Rational {
        self.inner.info.time_base
    }

    /**
        Average frame rate, video streams only.
    */
    pub fn frame_rate(&self) -> Option<Rational> {
        self.inner.info.frame_rate
    }

    /**
        Duration in seconds, 0.0 when unknown.
    */
    pub fn duration(&self) -> f64 {
        self.inner.info.duration_seconds()
    }

    /**
        Bitrate in bits per second, 0 when unknown.
    */
    pub fn bit_rate(&self) -> u64 {
        self.inner.info.bit_rate
    }

    pub fn codec_name(&self) -> &str {
        &self.inner.info.codec_name
    }

    /**
        Stream tags, verbatim from the container.
    */
    pub fn metadata(&self) -> &Metadata {
        &self.inner.info.metadata
    }

    pub fn info(&self) -> &StreamInfo {
        &self.inner.info
    }

    /**
        Decoder of this stream, None if it failed to open.
    */
    pub fn codec(&self) -> Option<&Codec> {
        self.inner.codec.as_ref()
    }

    /**
        Returns true while the owning session is loaded.
    */
    pub fn is_valid(&self) -> bool {
        self.inner.session.load(Ordering::Acquire)
    }

    /**
        Returns true if this stream was enumerated by the given session.
    */
    pub fn belongs_to(&self, session: &Arc<AtomicBool>) -> bool {
        Arc::ptr_eq(&self.inner.session, session)
    }

    /**
        Drain frames still buffered in the decoder at end of stream.
    */
    pub fn flush(&self) -> Vec<Frame> {
        match self.codec() {
            Some(codec) if self.is_valid() => codec
                .drain()
                .into_iter()
                .map(|decoded| Frame::new(decoded, self.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /**
        Discard frames buffered in the decoder, e.g. after a seek.
    */
    pub fn reset(&self) {
        if let Some(codec) = self.codec() {
            codec.reset();
        }
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.index() == other.index() && Arc::ptr_eq(&self.inner.session, &other.inner.session)
    }
}

impl Eq for Stream {}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("index", &self.index())
            .field("kind", &self.kind())
            .field("codec", &self.codec_name())
            .field("time_base", &self.time_base())
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_types::MediaDuration;

    fn info(index: usize) -> StreamInfo {
        StreamInfo {
            index,
            kind: MediaKind::Subtitle,
            time_base: Rational::new(1, 1000),
            frame_rate: None,
            duration: Some(MediaDuration(2500)),
            bit_rate: 0,
            codec_name: "subrip".into(),
            metadata: Metadata::from([("language".to_string(), "eng".to_string())]),
        }
    }

    #[test]
    fn stream_follows_session() {
        let session = Arc::new(AtomicBool::new(true));
        let stream = Stream::new(info(2), None, session.clone());

        assert!(stream.is_valid());
        assert!(stream.belongs_to(&session));
        assert_eq!(stream.index(), 2);
        assert_eq!(stream.duration(), 2.5);
        assert_eq!(stream.metadata().get("language").map(String::as_str), Some("eng"));

        session.store(false, Ordering::Release);
        assert!(!stream.is_valid());
    }

    #[test]
    fn streams_compare_by_index_and_session() {
        let session = Arc::new(AtomicBool::new(true));
        let other_session = Arc::new(AtomicBool::new(true));

        let a = Stream::new(info(0), None, session.clone());
        let b = Stream::new(info(0), None, session.clone());
        let c = Stream::new(info(1), None, session);
        let d = Stream::new(info(0), None, other_session);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn stream_without_codec_flushes_nothing() {
        let stream = Stream::new(info(0), None, Arc::new(AtomicBool::new(true)));
        assert!(stream.codec().is_none());
        assert!(stream.flush().is_empty());
        stream.reset();
    }
}
