/*!
    Demuxer implementation.

    A [`Demuxer`] owns at most one loaded session. The session holds the
    FFmpeg format context, the stream table and the current selections.
    Unloading or dropping the demuxer ends the session, which invalidates
    every [`Stream`] handed out from it.
*/

use std::ffi::{CString, c_int};
use std::fmt;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use ffmpeg_next::{Dictionary, ffi, format::context::Input as InputContext};
use log::{debug, warn};

use ffmpeg_decode::{Codec, Packet, Stream, VideoDecoderConfig};
use ffmpeg_types::{Error, MediaKind, Metadata, Pts, Rational, Result};

use crate::abort::{AbortHandle, interrupt_callback};
use crate::convert::metadata_from_ffmpeg;
use crate::input::InputSpec;
use crate::io::{IoContext, MediaIo, POLL_INTERVAL};
use crate::probe;

/**
    Configuration for loading media.
*/
#[derive(Clone, Debug, Default)]
pub struct DemuxerConfig {
    /// Decoder settings applied to every video stream.
    pub video_decoder: VideoDecoderConfig,
    /// Maximum number of bytes read while probing the container.
    pub probe_size: Option<u64>,
    /// Maximum media duration analyzed while probing streams.
    pub analyze_duration: Option<Duration>,
    /// Options passed verbatim to the container opener.
    pub options: Vec<(String, String)>,
}

impl DemuxerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video_decoder(mut self, video_decoder: VideoDecoderConfig) -> Self {
        self.video_decoder = video_decoder;
        self
    }

    pub fn with_probe_size(mut self, bytes: u64) -> Self {
        self.probe_size = Some(bytes);
        self
    }

    pub fn with_analyze_duration(mut self, duration: Duration) -> Self {
        self.analyze_duration = Some(duration);
        self
    }

    /**
        Add a container option, e.g. `("framerate", "30")` for a capture device.
    */
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }
}

/**
    One loaded container.
*/
struct Session {
    input: InputContext,
    // Declared after `input`, the format context must close before its I/O
    _io: Option<IoContext>,
    _abort: AbortHandle,
    alive: Arc<AtomicBool>,
    location: String,
    streams: Vec<Stream>,
    video_streams: Vec<Stream>,
    audio_streams: Vec<Stream>,
    subtitle_streams: Vec<Stream>,
    video_stream: Option<Stream>,
    audio_stream: Option<Stream>,
    subtitle_stream: Option<Stream>,
    duration: f64,
    metadata: Metadata,
}

// SAFETY: The format context is only used through `&mut Demuxer`. The
// reference-counted destructor inside `InputContext` is never cloned past
// `Session::open`, so moving the session moves every reference to it.
unsafe impl Send for Session {}

impl Session {
    fn open(
        spec: &InputSpec,
        io: Option<Box<dyn MediaIo>>,
        config: &DemuxerConfig,
        abort: &AbortHandle,
    ) -> Result<Self> {
        let location = spec.location.as_str();
        ffmpeg_next::init().map_err(|e| Error::open(location, e.to_string()))?;

        let url = CString::new(location)
            .map_err(|_| Error::invalid_input("input location contains a NUL byte"))?;

        let input_format = match &spec.format {
            Some(name) => {
                let c_name = CString::new(name.as_str())
                    .map_err(|_| Error::invalid_input("format name contains a NUL byte"))?;
                let format = unsafe { ffi::av_find_input_format(c_name.as_ptr()) };
                if format.is_null() {
                    return Err(Error::open(
                        location,
                        format!("unknown input format '{name}'"),
                    ));
                }
                format
            }
            None => ptr::null(),
        };

        let io = io
            .map(|io| IoContext::new(io, abort.clone()))
            .transpose()?;

        let mut options = Dictionary::new();
        for (key, value) in &config.options {
            options.set(key, value);
        }

        let mut input = unsafe {
            let mut ctx = ffi::avformat_alloc_context();
            if ctx.is_null() {
                return Err(Error::open(location, "failed to allocate format context"));
            }

            (*ctx).interrupt_callback = ffi::AVIOInterruptCB {
                callback: Some(interrupt_callback),
                opaque: abort.as_opaque(),
            };
            if let Some(io) = &io {
                (*ctx).pb = io.as_ptr();
            }
            if let Some(bytes) = config.probe_size {
                (*ctx).probesize = i64::try_from(bytes).unwrap_or(i64::MAX);
            }
            if let Some(duration) = config.analyze_duration {
                (*ctx).max_analyze_duration =
                    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
            }

            // On failure the context is freed by avformat_open_input
            let mut raw_options = options.disown();
            let ret = ffi::avformat_open_input(&mut ctx, url.as_ptr(), input_format, &mut raw_options);
            let unused = Dictionary::own(raw_options);

            if ret < 0 {
                return Err(open_error(location, ret, abort));
            }
            for (key, _) in unused.iter() {
                warn!("{location}: option '{key}' was not used");
            }

            InputContext::wrap(ctx)
        };

        let ret = unsafe { ffi::avformat_find_stream_info(input.as_mut_ptr(), ptr::null_mut()) };
        if ret < 0 {
            return Err(open_error(location, ret, abort));
        }

        let alive = Arc::new(AtomicBool::new(true));
        let mut streams = Vec::new();

        for stream in input.streams() {
            let info = probe::stream_info(&stream);
            let codec = if info.kind.is_decodable() {
                match Codec::open(&info, stream.parameters(), &config.video_decoder) {
                    Ok(codec) => Some(codec),
                    Err(e) => {
                        warn!("{location}: {e}");
                        None
                    }
                }
            } else {
                None
            };
            streams.push(Stream::new(info, codec, alive.clone()));
        }

        let of_kind = |kind: MediaKind| -> Vec<Stream> {
            streams
                .iter()
                .filter(|stream| stream.kind() == kind)
                .cloned()
                .collect()
        };
        let video_streams = of_kind(MediaKind::Video);
        let audio_streams = of_kind(MediaKind::Audio);
        let subtitle_streams = of_kind(MediaKind::Subtitle);

        let video_stream = best_stream(&video_streams);
        let audio_stream = best_stream(&audio_streams);

        let duration = probe::container_duration(&input, &streams);
        let metadata = metadata_from_ffmpeg(&input.metadata());

        Ok(Self {
            input,
            _io: io,
            _abort: abort.clone(),
            alive,
            location: location.to_string(),
            streams,
            video_streams,
            audio_streams,
            subtitle_streams,
            video_stream,
            audio_stream,
            subtitle_stream: None,
            duration,
            metadata,
        })
    }

    fn pb(&self) -> *mut ffi::AVIOContext {
        unsafe { (*self.input.as_ptr()).pb }
    }

    fn is_seekable(&self) -> bool {
        let pb = self.pb();
        !pb.is_null() && unsafe { (*pb).seekable } != 0
    }

    fn at_eof(&self) -> bool {
        let pb = self.pb();
        !pb.is_null() && unsafe { (*pb).eof_reached } != 0
    }

    /**
        Stream and timestamp used as the seek reference.

        Seeks go through the selected video stream, then the selected audio
        stream, and fall back to the container clock.
    */
    fn seek_target(&self, seconds: f64) -> (c_int, i64) {
        let reference = self.video_stream.as_ref().or(self.audio_stream.as_ref());

        if let Some(stream) = reference {
            let start = self
                .input
                .stream(stream.index())
                .map(|stream| probe::start_time(&stream))
                .unwrap_or(0);
            let timestamp = Pts::from_seconds(seconds, stream.time_base()).0;
            if let Ok(index) = c_int::try_from(stream.index()) {
                return (index, timestamp.saturating_add(start));
            }
        }

        let timestamp = (seconds * f64::from(ffi::AV_TIME_BASE)).round() as i64;
        (-1, timestamp)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
        debug!("{}: unloaded", self.location);
    }
}

/**
    Highest bit rate among streams with a working decoder.

    Ties go to the stream that comes first in the container.
*/
fn best_stream(streams: &[Stream]) -> Option<Stream> {
    let candidates = streams
        .iter()
        .map(|stream| (stream.bit_rate(), stream.codec().is_some()));
    pick_best(candidates).map(|position| streams[position].clone())
}

/**
    Position of the decodable candidate with the highest bit rate, given
    `(bit_rate, has_codec)` pairs in container order.
*/
fn pick_best(candidates: impl IntoIterator<Item = (u64, bool)>) -> Option<usize> {
    candidates
        .into_iter()
        .enumerate()
        .filter(|(_, (_, has_codec))| *has_codec)
        .fold(None, |best: Option<(usize, u64)>, (position, (bit_rate, _))| match best {
            Some((_, best_rate)) if best_rate >= bit_rate => best,
            _ => Some((position, bit_rate)),
        })
        .map(|(position, _)| position)
}

fn open_error(location: &str, code: c_int, abort: &AbortHandle) -> Error {
    if abort.is_aborted() {
        return Error::open(location, "aborted");
    }
    Error::open(location, ffmpeg_next::Error::from(code).to_string())
}

/**
    Reads packets out of a media container.

    Typical use is one reading thread that owns the demuxer and loops on
    [`Demuxer::read`], while other threads may cancel it through an
    [`AbortHandle`].

    ```ignore
    let mut demuxer = Demuxer::new();
    demuxer.load("-f v4l2 -i /dev/video0")?;
    let abort = demuxer.abort_handle();

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
pub struct Demuxer {
    config: DemuxerConfig,
    abort: AbortHandle,
    eof: bool,
    session: Option<Session>,
}

impl Demuxer {
    pub fn new() -> Self {
        Self::with_config(DemuxerConfig::default())
    }

    pub fn with_config(config: DemuxerConfig) -> Self {
        Self {
            config,
            abort: AbortHandle::default(),
            eof: false,
            session: None,
        }
    }

    pub fn config(&self) -> &DemuxerConfig {
        &self.config
    }

    /**
        Open a media source.

        `spec` is a path, URL or device, optionally with `-f <format>` and
        `-i <location>` directives, see [`InputSpec`]. Any previous session
        is unloaded first, also when loading fails.
    */
    pub fn load(&mut self, spec: &str) -> Result<()> {
        self.unload();
        let spec: InputSpec = spec.parse()?;
        self.open(&spec, None)
    }

    /**
        Open a media source read through a caller-supplied byte stream.

        `spec` may be empty, or carry a `-f <format>` directive and a
        location used for probing hints and error messages.
    */
    pub fn load_with_io<I: MediaIo + 'static>(&mut self, spec: &str, io: I) -> Result<()> {
        self.unload();
        let spec = InputSpec::parse_optional_location(spec)?;
        self.open(&spec, Some(Box::new(io)))
    }

    fn open(&mut self, spec: &InputSpec, io: Option<Box<dyn MediaIo>>) -> Result<()> {
        debug!("loading '{spec}'");
        let session = Session::open(spec, io, &self.config, &self.abort)?;

        debug!(
            "{}: {} video, {} audio, {} subtitle streams, {:.3}s",
            session.location,
            session.video_streams.len(),
            session.audio_streams.len(),
            session.subtitle_streams.len(),
            session.duration
        );

        self.session = Some(session);
        Ok(())
    }

    /**
        Release the loaded source. Does nothing when nothing is loaded.
    */
    pub fn unload(&mut self) {
        self.session = None;
        self.eof = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    /**
        Location of the loaded source as given to the container layer.
    */
    pub fn location(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.location.as_str())
    }

    pub fn streams(&self) -> &[Stream] {
        self.session
            .as_ref()
            .map(|session| session.streams.as_slice())
            .unwrap_or(&[])
    }

    pub fn video_streams(&self) -> &[Stream] {
        self.session
            .as_ref()
            .map(|session| session.video_streams.as_slice())
            .unwrap_or(&[])
    }

    pub fn audio_streams(&self) -> &[Stream] {
        self.session
            .as_ref()
            .map(|session| session.audio_streams.as_slice())
            .unwrap_or(&[])
    }

    pub fn subtitle_streams(&self) -> &[Stream] {
        self.session
            .as_ref()
            .map(|session| session.subtitle_streams.as_slice())
            .unwrap_or(&[])
    }

    pub fn video_stream(&self) -> Option<&Stream> {
        self.session.as_ref()?.video_stream.as_ref()
    }

    pub fn audio_stream(&self) -> Option<&Stream> {
        self.session.as_ref()?.audio_stream.as_ref()
    }

    pub fn subtitle_stream(&self) -> Option<&Stream> {
        self.session.as_ref()?.subtitle_stream.as_ref()
    }

    /**
        Select the active video stream.

        Returns false and keeps the current selection when `stream` is not
        a video stream of the loaded source.
    */
    pub fn set_video_stream(&mut self, stream: &Stream) -> bool {
        self.select(stream, MediaKind::Video)
    }

    /**
        Select the active audio stream, see [`Demuxer::set_video_stream`].
    */
    pub fn set_audio_stream(&mut self, stream: &Stream) -> bool {
        self.select(stream, MediaKind::Audio)
    }

    /**
        Select the active subtitle stream, see [`Demuxer::set_video_stream`].
    */
    pub fn set_subtitle_stream(&mut self, stream: &Stream) -> bool {
        self.select(stream, MediaKind::Subtitle)
    }

    fn select(&mut self, stream: &Stream, kind: MediaKind) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if stream.kind() != kind || !stream.belongs_to(&session.alive) {
            return false;
        }
        let Some(known) = session.streams.get(stream.index()).cloned() else {
            return false;
        };

        let slot = match kind {
            MediaKind::Video => &mut session.video_stream,
            MediaKind::Audio => &mut session.audio_stream,
            MediaKind::Subtitle => &mut session.subtitle_stream,
            _ => return false,
        };

        debug!("{}: selected {kind} stream {}", session.location, known.index());
        *slot = Some(known);
        true
    }

    /**
        Stream at a container index.
    */
    pub fn stream(&self, index: usize) -> Option<&Stream> {
        self.session.as_ref()?.streams.get(index)
    }

    /**
        Decoder of the stream at a container index.

        None when the index is out of range or the stream has no decoder.
    */
    pub fn codec(&self, index: usize) -> Option<&Codec> {
        self.stream(index)?.codec()
    }

    /**
        Container duration in seconds, 0.0 when unknown or unloaded.
    */
    pub fn duration(&self) -> f64 {
        self.session
            .as_ref()
            .map(|session| session.duration)
            .unwrap_or(0.0)
    }

    /**
        Container tags such as "title" or "artist".
    */
    pub fn metadata(&self) -> Metadata {
        self.session
            .as_ref()
            .map(|session| session.metadata.clone())
            .unwrap_or_default()
    }

    pub fn seekable(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.is_seekable())
    }

    /**
        Frame rate of the selected video stream.
    */
    pub fn frame_rate(&self) -> Option<Rational> {
        self.video_stream()?.frame_rate()
    }

    /**
        Frames per second of the selected video stream, 0.0 when there is none.
    */
    pub fn video_frame_rate(&self) -> f64 {
        self.frame_rate().map(Rational::to_f64).unwrap_or(0.0)
    }

    /**
        Read the next packet from the container.

        Packets of every stream are returned, not only the selected ones.
        An empty packet is returned when nothing is loaded, at end of
        stream and while the abort flag is set. Only a natural end of
        stream sets [`Demuxer::eof`].
    */
    pub fn read(&mut self) -> Packet {
        let Some(session) = self.session.as_mut() else {
            return Packet::default();
        };
        if self.eof || self.abort.is_aborted() {
            return Packet::default();
        }

        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut session.input) {
                Ok(()) => {
                    // Streams added after probing have no entry in the table
                    if let Some(stream) = session.streams.get(packet.stream()) {
                        return Packet::new(packet, stream.clone());
                    }
                }
                Err(ffmpeg_next::Error::Eof) => {
                    debug!("{}: end of stream", session.location);
                    self.eof = true;
                    return Packet::default();
                }
                Err(ffmpeg_next::Error::Exit) => {
                    debug!("{}: read aborted", session.location);
                    return Packet::default();
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                    if self.abort.is_aborted() {
                        return Packet::default();
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    if self.abort.is_aborted() {
                        debug!("{}: read aborted", session.location);
                        return Packet::default();
                    }
                    warn!("{}: read failed: {e}", session.location);
                    if session.at_eof() {
                        self.eof = true;
                    }
                    return Packet::default();
                }
            }
        }
    }

    /**
        Seek to the keyframe at or before `seconds`.

        Clears the end-of-stream flag on success. Decoders are not flushed,
        the first frames decoded afterwards may still belong to the old
        position (see [`Codec::reset`]). On failure the position and the
        end-of-stream flag are left unchanged.
    */
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        let session = self.session.as_mut().ok_or(Error::NotLoaded)?;

        if !seconds.is_finite() || seconds < 0.0 {
            return Err(Error::seek(format!("invalid target {seconds}s")));
        }
        if session.duration > 0.0 && seconds > session.duration {
            return Err(Error::seek(format!(
                "target {seconds}s is past the end ({:.3}s)",
                session.duration
            )));
        }
        if !session.is_seekable() {
            return Err(Error::seek("source is not seekable"));
        }

        let (index, timestamp) = session.seek_target(seconds);
        let ret = unsafe {
            ffi::av_seek_frame(
                session.input.as_mut_ptr(),
                index,
                timestamp,
                ffi::AVSEEK_FLAG_BACKWARD as c_int,
            )
        };
        if ret < 0 {
            return Err(Error::seek(ffmpeg_next::Error::from(ret).to_string()));
        }

        debug!("{}: seeked to {seconds:.3}s", session.location);
        self.eof = false;
        Ok(())
    }

    /**
        True after the container was read to its end.

        Stays false when reading stopped because of [`Demuxer::abort`].
    */
    pub fn eof(&self) -> bool {
        self.eof
    }

    /**
        Set (`true`) or clear (`false`) the abort flag.

        A blocked [`Demuxer::read`] returns promptly once the flag is set.
        Use [`Demuxer::abort_handle`] to do this from another thread.
    */
    pub fn abort(&self, stop: bool) {
        self.abort.abort(stop);
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Demuxer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Demuxer")
            .field("location", &self.location())
            .field("streams", &self.streams().len())
            .field("eof", &self.eof)
            .field("aborted", &self.abort.is_aborted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_bit_rate_wins() {
        assert_eq!(pick_best([(128_000, true), (320_000, true), (64_000, true)]), Some(1));
    }

    #[test]
    fn bit_rate_ties_go_to_first_stream() {
        assert_eq!(pick_best([(0, true), (0, true)]), Some(0));
        assert_eq!(pick_best([(96_000, true), (192_000, true), (192_000, true)]), Some(1));
    }

    #[test]
    fn streams_without_codec_are_skipped() {
        assert_eq!(pick_best([(5_000_000, false), (1_000, true)]), Some(1));
        assert_eq!(pick_best([(1_000, false), (2_000, false)]), None);
        assert_eq!(pick_best(std::iter::empty()), None);
    }

    #[test]
    fn unloaded_demuxer_is_inert() {
        let mut demuxer = Demuxer::new();
        assert!(!demuxer.is_loaded());
        assert!(demuxer.streams().is_empty());
        assert!(demuxer.video_streams().is_empty());
        assert!(demuxer.audio_streams().is_empty());
        assert!(demuxer.subtitle_streams().is_empty());
        assert!(demuxer.video_stream().is_none());
        assert!(demuxer.stream(0).is_none());
        assert!(demuxer.codec(0).is_none());
        assert_eq!(demuxer.duration(), 0.0);
        assert!(demuxer.metadata().is_empty());
        assert!(!demuxer.seekable());
        assert_eq!(demuxer.video_frame_rate(), 0.0);
        assert!(demuxer.read().is_empty());
        assert!(!demuxer.eof());
        assert!(matches!(demuxer.seek(0.0), Err(Error::NotLoaded)));

        demuxer.unload();
        demuxer.unload();
        assert!(!demuxer.is_loaded());
    }

    #[test]
    fn abort_flag_is_shared() {
        let demuxer = Demuxer::new();
        let handle = demuxer.abort_handle();

        handle.abort(true);
        assert!(demuxer.abort_handle().is_aborted());
        demuxer.abort(false);
        assert!(!handle.is_aborted());
    }

    #[test]
    fn invalid_spec_fails_before_opening() {
        let mut demuxer = Demuxer::new();
        let err = demuxer.load("-f v4l2").unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(!demuxer.is_loaded());
    }

    #[test]
    fn config_builders() {
        let config = DemuxerConfig::new()
            .with_probe_size(1 << 20)
            .with_analyze_duration(Duration::from_secs(2))
            .with_option("framerate", "30")
            .with_option("video_size", "640x480");

        assert_eq!(config.probe_size, Some(1 << 20));
        assert_eq!(config.analyze_duration, Some(Duration::from_secs(2)));
        assert_eq!(config.options.len(), 2);
        assert_eq!(config.options[0], ("framerate".into(), "30".into()));

        let demuxer = Demuxer::with_config(config);
        assert_eq!(demuxer.config().options.len(), 2);
    }
}
