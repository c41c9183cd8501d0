/*!
    Probing of opened containers into stream descriptions.
*/

use ffmpeg_next::{
    ffi,
    format::{context::Input as InputContext, stream::Stream as StreamFFmpeg},
};

use ffmpeg_decode::Stream;
use ffmpeg_types::{MediaDuration, MediaKind, StreamInfo};

use crate::convert::{
    known_rational_from_ffmpeg, media_kind_from_ffmpeg, metadata_from_ffmpeg,
    rational_from_ffmpeg,
};

/**
    Describe one stream of an opened container.
*/
pub(crate) fn stream_info(stream: &StreamFFmpeg<'_>) -> StreamInfo {
    let parameters = stream.parameters();
    let kind = media_kind_from_ffmpeg(parameters.medium());

    // Prefer the average rate, fall back to the real base rate
    let frame_rate = if kind == MediaKind::Video {
        known_rational_from_ffmpeg(stream.avg_frame_rate())
            .or_else(|| known_rational_from_ffmpeg(stream.rate()))
    } else {
        None
    };

    let duration = (stream.duration() > 0).then(|| MediaDuration(stream.duration()));

    // SAFETY: reading a plain field of the AVCodecParameters owned by the stream
    let bit_rate = unsafe { (*parameters.as_ptr()).bit_rate }.max(0) as u64;

    StreamInfo {
        index: stream.index(),
        kind,
        time_base: rational_from_ffmpeg(stream.time_base()),
        frame_rate,
        duration,
        bit_rate,
        codec_name: parameters.id().name().to_string(),
        metadata: metadata_from_ffmpeg(&stream.metadata()),
    }
}

/**
    Container duration in seconds, 0.0 when unknown.

    Falls back to the longest stream duration when the container does
    not report one.
*/
pub(crate) fn container_duration(input: &InputContext, streams: &[Stream]) -> f64 {
    let duration = input.duration();
    if duration > 0 && duration != ffi::AV_NOPTS_VALUE {
        return duration as f64 / f64::from(ffi::AV_TIME_BASE);
    }

    streams
        .iter()
        .map(Stream::duration)
        .fold(0.0, f64::max)
}

/**
    Start offset of a stream in its own time base, 0 when unknown.
*/
pub(crate) fn start_time(stream: &StreamFFmpeg<'_>) -> i64 {
    match stream.start_time() {
        ffi::AV_NOPTS_VALUE => 0,
        start => start,
    }
}
