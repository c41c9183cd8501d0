/*!
    Decoded frame handle.
*/

use std::fmt;
use std::sync::Arc;

use ffmpeg_next::util::frame::{audio::Audio as AudioFrameFFmpeg, video::Video as VideoFrameFFmpeg};

use ffmpeg_types::{MediaKind, Pts};

use crate::stream::Stream;

/**
    Raw decoder output, before it is tied to a stream.
*/
pub(crate) enum DecodedFrame {
    Audio(AudioFrameFFmpeg),
    Video(VideoFrameFFmpeg),
}

impl DecodedFrame {
    fn timestamp(&self) -> Option<i64> {
        let frame = match self {
            Self::Audio(frame) => &**frame,
            Self::Video(frame) => &**frame,
        };
        frame.timestamp().or_else(|| frame.pts())
    }
}

struct FrameInner {
    decoded: DecodedFrame,
    stream: Stream,
    pts: f64,
}

// SAFETY: The wrapped AVFrame is never mutated after construction and its
// data buffers are reference-counted by FFmpeg, so shared reads from
// several threads are sound.
unsafe impl Send for FrameInner {}
unsafe impl Sync for FrameInner {}

/**
    A decoded audio or video unit.

    Frames are shared handles, cloning one is O(1) and both clones see the
    same data. The default frame is empty, see [`Frame::is_empty`].

    Convert to [`AudioFrame`](crate::AudioFrame) or
    [`VideoFrame`](crate::VideoFrame) for format-specific access.
*/
#[derive(Clone, Default)]
pub struct Frame {
    inner: Option<Arc<FrameInner>>,
}

impl Frame {
    pub(crate) fn new(decoded: DecodedFrame, stream: Stream) -> Self {
        let pts = decoded
            .timestamp()
            .map(|ts| Pts(ts).to_seconds(stream.time_base()))
            .unwrap_or(f64::NAN);

        Self {
            inner: Some(Arc::new(FrameInner {
                decoded,
                stream,
                pts,
            })),
        }
    }

    /**
        Returns true if this frame carries no data.
    */
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /**
        Presentation timestamp in seconds.

        NaN for an empty frame or when the decoder gave no timestamp.
    */
    pub fn pts(&self) -> f64 {
        self.inner.as_ref().map(|inner| inner.pts).unwrap_or(f64::NAN)
    }

    /**
        The stream that produced this frame.
    */
    pub fn stream(&self) -> Option<&Stream> {
        self.inner.as_ref().map(|inner| &inner.stream)
    }

    /**
        Media kind of the decoded data, None for an empty frame.
    */
    pub fn kind(&self) -> Option<MediaKind> {
        self.decoded().map(|decoded| match decoded {
            DecodedFrame::Audio(_) => MediaKind::Audio,
            DecodedFrame::Video(_) => MediaKind::Video,
        })
    }

    pub(crate) fn decoded(&self) -> Option<&DecodedFrame> {
        self.inner.as_ref().map(|inner| &inner.decoded)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => f.write_str("Frame(empty)"),
            Some(inner) => f
                .debug_struct("Frame")
                .field("kind", &self.kind())
                .field("stream", &inner.stream.index())
                .field("pts", &inner.pts)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_is_empty() {
        let frame = Frame::default();
        assert!(frame.is_empty());
        assert!(frame.pts().is_nan());
        assert!(frame.stream().is_none());
        assert!(frame.kind().is_none());
    }

    #[test]
    fn clone_of_empty_frame_is_empty() {
        let frame = Frame::default();
        let copy = frame.clone();
        assert!(copy.is_empty());
        assert!(copy.pts().is_nan());
    }
}
