/*!
    Media demuxing for the ffmpeg demux and decode crates.

    This crate handles the input side of the media pipeline. A [`Demuxer`]
    opens media from a path, URL, device or caller-supplied [`MediaIo`],
    enumerates its elementary streams and reads encoded packets that
    decode through their stream's codec.

    ```ignore
    let mut demuxer = Demuxer::new();
    demuxer.load("movie.mkv")?;
    loop {
        let packet = demuxer.read();
        if packet.is_empty() {
            break;
        }
        for frame in packet.decode() {
            // ...
        }
    }
    ```
*/

mod abort;
mod caps;
mod convert;
mod demuxer;
mod input;
mod io;
mod probe;

pub use abort::AbortHandle;
pub use caps::{supported_formats, supported_protocols};
pub use demuxer::{Demuxer, DemuxerConfig};
pub use input::InputSpec;
pub use io::MediaIo;

pub use ffmpeg_decode::{
    AudioFrame, Codec, Frame, HwDevice, Packet, Stream, VideoBuffer, VideoDecoderConfig,
    VideoFrame,
};

static_assertions::assert_impl_all!(Demuxer: Send);
static_assertions::assert_impl_all!(AbortHandle: Send, Sync, Clone);
