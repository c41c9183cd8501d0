/*!
    Compressed packet handle.
*/

use std::fmt;
use std::sync::Arc;

use ffmpeg_types::{MediaDuration, Pts};

use crate::frame::Frame;
use crate::stream::Stream;

struct PacketInner {
    packet: ffmpeg_next::Packet,
    stream: Stream,
}

// SAFETY: The AVPacket is never mutated after construction, decoding only
// reads it, so it can be shared between threads.
unsafe impl Send for PacketInner {}
unsafe impl Sync for PacketInner {}

/**
    One demultiplexed compressed unit.

    Packets are shared handles, cloning one is O(1) and both clones share
    the payload. The default packet is empty and carries no data.
*/
#[derive(Clone, Default)]
pub struct Packet {
    inner: Option<Arc<PacketInner>>,
}

impl Packet {
    /**
        Wrap a packet read from `stream`.
    */
    pub fn new(packet: ffmpeg_next::Packet, stream: Stream) -> Self {
        Self {
            inner: Some(Arc::new(PacketInner { packet, stream })),
        }
    }

    /**
        Returns true if this packet carries no data.
    */
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /**
        Index of the owning stream, None for an empty packet.
    */
    pub fn stream_index(&self) -> Option<usize> {
        self.stream().map(Stream::index)
    }

    pub fn stream(&self) -> Option<&Stream> {
        self.inner.as_ref().map(|inner| &inner.stream)
    }

    /**
        Presentation timestamp in seconds, NaN when empty or unknown.
    */
    pub fn pts(&self) -> f64 {
        self.inner
            .as_ref()
            .and_then(|inner| {
                let pts = inner.packet.pts()?;
                Some(Pts(pts).to_seconds(inner.stream.time_base()))
            })
            .unwrap_or(f64::NAN)
    }

    /**
        Decode timestamp in seconds, NaN when empty or unknown.
    */
    pub fn dts(&self) -> f64 {
        self.inner
            .as_ref()
            .and_then(|inner| {
                let dts = inner.packet.dts()?;
                Some(Pts(dts).to_seconds(inner.stream.time_base()))
            })
            .unwrap_or(f64::NAN)
    }

    /**
        Duration in seconds, 0.0 when empty or unknown.
    */
    pub fn duration(&self) -> f64 {
        self.inner
            .as_ref()
            .map(|inner| {
                MediaDuration(inner.packet.duration()).to_seconds(inner.stream.time_base())
            })
            .unwrap_or(0.0)
    }

    /**
        Payload size in bytes.
    */
    pub fn bytes(&self) -> usize {
        self.inner
            .as_ref()
            .map(|inner| inner.packet.size())
            .unwrap_or(0)
    }

    pub fn data(&self) -> &[u8] {
        self.inner
            .as_ref()
            .and_then(|inner| inner.packet.data())
            .unwrap_or_default()
    }

    pub fn is_keyframe(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.packet.is_key())
    }

    /**
        Decode this packet with its stream's codec.

        Decoders buffer internally, so a packet may yield no frames and a
        later one may yield several. Corrupt packets, streams without a
        decoder and streams of an unloaded session all yield nothing.
        The packet itself is not modified.
    */
    pub fn decode(&self) -> Vec<Frame> {
        let Some(inner) = &self.inner else {
            return Vec::new();
        };
        if !inner.stream.is_valid() {
            return Vec::new();
        }
        let Some(codec) = inner.stream.codec() else {
            return Vec::new();
        };

        codec
            .decode(&inner.packet)
            .into_iter()
            .map(|decoded| Frame::new(decoded, inner.stream.clone()))
            .collect()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("Packet(empty)");
        }
        f.debug_struct("Packet")
            .field("stream", &self.stream_index())
            .field("pts", &self.pts())
            .field("duration", &self.duration())
            .field("bytes", &self.bytes())
            .field("keyframe", &self.is_keyframe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    use ffmpeg_types::{MediaKind, Metadata, Rational, StreamInfo};

    fn stream(session: Arc<AtomicBool>) -> Stream {
        let info = StreamInfo {
            index: 0,
            kind: MediaKind::Data,
            time_base: Rational::new(1, 1000),
            frame_rate: None,
            duration: None,
            bit_rate: 0,
            codec_name: "bin_data".into(),
            metadata: Metadata::new(),
        };
        Stream::new(info, None, session)
    }

    fn timed_packet(stream: Stream) -> Packet {
        let mut raw = ffmpeg_next::Packet::copy(&[1, 2, 3, 4]);
        raw.set_pts(Some(1500));
        raw.set_dts(Some(1500));
        raw.set_duration(40);
        Packet::new(raw, stream)
    }

    #[test]
    fn default_packet_is_empty() {
        let packet = Packet::default();
        assert!(packet.is_empty());
        assert!(packet.pts().is_nan());
        assert_eq!(packet.duration(), 0.0);
        assert_eq!(packet.bytes(), 0);
        assert!(packet.data().is_empty());
        assert_eq!(packet.stream_index(), None);
        assert!(!packet.is_keyframe());
        assert!(packet.decode().is_empty());
    }

    #[test]
    fn packet_timing_uses_stream_time_base() {
        let packet = timed_packet(stream(Arc::new(AtomicBool::new(true))));
        assert!(!packet.is_empty());
        assert_eq!(packet.stream_index(), Some(0));
        assert_eq!(packet.pts(), 1.5);
        assert_eq!(packet.dts(), 1.5);
        assert_eq!(packet.duration(), 0.04);
        assert_eq!(packet.bytes(), 4);
        assert_eq!(packet.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn packet_clones_share_payload() {
        let packet = timed_packet(stream(Arc::new(AtomicBool::new(true))));
        let copy = packet.clone();

        assert_eq!(copy.pts(), packet.pts());
        assert_eq!(copy.duration(), packet.duration());
        assert_eq!(copy.bytes(), packet.bytes());
        assert_eq!(copy.data().as_ptr(), packet.data().as_ptr());
    }

    #[test]
    fn packet_without_codec_decodes_nothing() {
        let session = Arc::new(AtomicBool::new(true));
        let packet = timed_packet(stream(session.clone()));
        assert!(packet.decode().is_empty());

        session.store(false, std::sync::atomic::Ordering::Release);
        assert!(packet.decode().is_empty());
    }
}
