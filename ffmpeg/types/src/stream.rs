/*!
    Stream information types.
*/

use crate::{MediaDuration, MediaKind, Metadata, Rational};

/**
    Static description of one elementary stream inside a container.
*/
#[derive(Clone, Debug)]
pub struct StreamInfo {
    /// Container-relative index, stable for the container's lifetime.
    pub index: usize,
    /// Media type of the stream.
    pub kind: MediaKind,
    /// Time base for timestamps.
    pub time_base: Rational,
    /// Average frame rate (video only, may be unavailable).
    pub frame_rate: Option<Rational>,
    /// Total duration in time base units (may be unavailable).
    pub duration: Option<MediaDuration>,
    /// Bitrate in bits per second (0 when unknown).
    pub bit_rate: u64,
    /// Short codec name, e.g. "h264" or "pcm_s32le".
    pub codec_name: String,
    /// Stream tags.
    pub metadata: Metadata,
}

impl StreamInfo {
    /**
        Returns the duration in seconds, or 0.0 when unknown.
    */
    pub fn duration_seconds(&self) -> f64 {
        self.duration
            .map(|d| d.to_seconds(self.time_base))
            .unwrap_or(0.0)
    }
}
