/*!
    Codec context handle and the send/receive decode loop.
*/

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ffmpeg_next::{
    codec::{
        self,
        decoder::{Audio as AudioDecoderFFmpeg, Opened, Video as VideoDecoderFFmpeg},
    },
    ffi,
    util::frame::{audio::Audio as AudioFrameFFmpeg, video::Video as VideoFrameFFmpeg},
};
use parking_lot::Mutex;

use ffmpeg_types::{Error, MediaKind, Result, StreamInfo};

use crate::config::VideoDecoderConfig;
use crate::frame::DecodedFrame;
use crate::hw::{HwDevice, HwDeviceContext, decoder_supports};

enum Decoder {
    Audio(AudioDecoderFFmpeg),
    Video(VideoDecoderFFmpeg),
}

impl Decoder {
    fn opened(&mut self) -> &mut Opened {
        match self {
            Self::Audio(decoder) => &mut **decoder,
            Self::Video(decoder) => &mut **decoder,
        }
    }

    fn empty_frame(&self) -> DecodedFrame {
        match self {
            Self::Audio(_) => DecodedFrame::Audio(AudioFrameFFmpeg::empty()),
            Self::Video(_) => DecodedFrame::Video(VideoFrameFFmpeg::empty()),
        }
    }
}

struct CodecState {
    decoder: Decoder,
    /**
        Kept alive to prevent the hardware device context from being dropped
        while the decoder is using it. Not accessed directly after initialization.
    */
    _hw_context: Option<HwDeviceContext>,
}

// SAFETY: The codec context is only reached through the mutex in
// `CodecInner`, so it is never used from two threads at once.
unsafe impl Send for CodecState {}

struct CodecInner {
    index: usize,
    kind: MediaKind,
    name: String,
    hw_device: HwDevice,
    valid: AtomicBool,
    state: Mutex<CodecState>,
}

/**
    Decoder context of one stream.

    Cloning shares the same decoder. Decode calls on clones are serialized
    by an internal lock. After a fatal decoder error the codec turns
    invalid and decodes nothing for the rest of the session.
*/
#[derive(Clone)]
pub struct Codec {
    inner: Arc<CodecInner>,
}

impl Codec {
    /**
        Open a decoder for a stream.

        `parameters` are the stream's codec parameters. Video decoders try
        the accelerator named in `config` first and fall back to software
        decoding when it cannot be used.
    */
    pub fn open(
        info: &StreamInfo,
        parameters: codec::Parameters,
        config: &VideoDecoderConfig,
    ) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec_init(info.index, e.to_string()))?;

        let (decoder, hw_context, hw_device) = match info.kind {
            MediaKind::Audio => {
                let context = new_context(info, parameters)?;
                let decoder = context
                    .decoder()
                    .audio()
                    .map_err(|e| Error::codec_init(info.index, e.to_string()))?;
                (Decoder::Audio(decoder), None, HwDevice::None)
            }
            MediaKind::Video => {
                let (decoder, hw_context, hw_device) = open_video(info, parameters, config)?;
                (Decoder::Video(decoder), hw_context, hw_device)
            }
            kind => {
                return Err(Error::codec_init(
                    info.index,
                    format!("{kind} streams are not decoded"),
                ));
            }
        };

        log::debug!(
            "stream {}: opened {} decoder ({}, hw: {hw_device})",
            info.index,
            info.kind,
            info.codec_name
        );

        Ok(Self {
            inner: Arc::new(CodecInner {
                index: info.index,
                kind: info.kind,
                name: info.codec_name.clone(),
                hw_device,
                valid: AtomicBool::new(true),
                state: Mutex::new(CodecState {
                    decoder,
                    _hw_context: hw_context,
                }),
            }),
        })
    }

    pub fn index(&self) -> usize {
        self.inner.index
    }

    pub fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    /**
        Short codec name, e.g. "h264".
    */
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /**
        Accelerator the decoder actually runs on.

        [`HwDevice::None`] when software decoding was configured or the
        accelerator fell back.
    */
    pub fn hw_device(&self) -> HwDevice {
        self.inner.hw_device
    }

    /**
        Returns false once a fatal decoder error has occurred.
    */
    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire)
    }

    /**
        Discard frames buffered inside the decoder.

        Useful after a seek, so stale frames from the old position are not
        returned by the next decode calls.
    */
    pub fn reset(&self) {
        self.inner.state.lock().decoder.opened().flush();
    }

    /**
        Feed one packet and pull every frame the decoder has ready.

        Corrupt packets are skipped and yield nothing. A fatal error
        invalidates the codec.
    */
    pub(crate) fn decode(&self, packet: &ffmpeg_next::Packet) -> Vec<DecodedFrame> {
        if !self.is_valid() {
            return Vec::new();
        }
        let result = self.inner.state.lock().decode(packet);
        self.settle(result)
    }

    /**
        Signal end of stream and pull the frames still buffered.
    */
    pub(crate) fn drain(&self) -> Vec<DecodedFrame> {
        if !self.is_valid() {
            return Vec::new();
        }
        let result = self.inner.state.lock().drain();
        self.settle(result)
    }

    fn settle(&self, result: Result<Vec<DecodedFrame>>) -> Vec<DecodedFrame> {
        match result {
            Ok(frames) => frames,
            Err(e) if e.is_fatal() => {
                log::warn!(
                    "stream {}: {e}, no further frames will be decoded",
                    self.inner.index
                );
                self.inner.valid.store(false, Ordering::Release);
                Vec::new()
            }
            Err(e) => {
                log::trace!("stream {}: skipping packet: {e}", self.inner.index);
                Vec::new()
            }
        }
    }
}

impl CodecState {
    fn decode(&mut self, packet: &ffmpeg_next::Packet) -> Result<Vec<DecodedFrame>> {
        // EAGAIN means decoder buffer is full - receive frames first then retry
        match self.decoder.opened().send_packet(packet) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                let mut all_frames = self.receive_frames()?;
                match self.decoder.opened().send_packet(packet) {
                    Ok(()) => all_frames.extend(self.receive_frames()?),
                    Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {}
                    Err(e) => return Err(classify(e)),
                }
                return Ok(all_frames);
            }
            Err(ffmpeg_next::Error::Eof) => {
                // Drained earlier, start a new decode sequence
                self.decoder.opened().flush();
                self.decoder
                    .opened()
                    .send_packet(packet)
                    .map_err(classify)?;
            }
            Err(e) => return Err(classify(e)),
        }

        self.receive_frames()
    }

    fn drain(&mut self) -> Result<Vec<DecodedFrame>> {
        let mut all_frames = self.receive_frames()?;

        match self.decoder.opened().send_eof() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                all_frames.extend(self.receive_frames()?);
                let _ = self.decoder.opened().send_eof();
            }
            Err(e) => return Err(classify(e)),
        }

        all_frames.extend(self.receive_frames()?);
        Ok(all_frames)
    }

    fn receive_frames(&mut self) -> Result<Vec<DecodedFrame>> {
        let mut frames = Vec::new();

        loop {
            let mut frame = self.decoder.empty_frame();
            let received = match &mut frame {
                DecodedFrame::Audio(frame) => self.decoder.opened().receive_frame(frame),
                DecodedFrame::Video(frame) => self.decoder.opened().receive_frame(frame),
            };

            match received {
                Ok(()) => frames.push(frame),
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => {
                    let e = classify(e);
                    // Keep what was decoded before a recoverable error
                    if e.is_fatal() || frames.is_empty() {
                        return Err(e);
                    }
                    break;
                }
            }
        }

        Ok(frames)
    }
}

fn new_context(info: &StreamInfo, parameters: codec::Parameters) -> Result<codec::Context> {
    let mut context = codec::Context::from_parameters(parameters)
        .map_err(|e| Error::codec_init(info.index, e.to_string()))?;

    unsafe {
        (*context.as_mut_ptr()).pkt_timebase = ffi::AVRational {
            num: info.time_base.num,
            den: info.time_base.den,
        };
    }

    Ok(context)
}

/**
    Open a video decoder, attaching a hardware device when configured.

    The decoder must list the device among its hardware configs. The
    device context is created next, then the decoder is opened with it.
    If any step fails the decoder is opened without acceleration.
*/
fn open_video(
    info: &StreamInfo,
    parameters: codec::Parameters,
    config: &VideoDecoderConfig,
) -> Result<(VideoDecoderFFmpeg, Option<HwDeviceContext>, HwDevice)> {
    let device = config.hw_device;

    if config.prefers_hw() && !decoder_supports(parameters.id(), device) {
        log::warn!(
            "stream {}: {} has no {device} decoder, falling back to software",
            info.index,
            info.codec_name
        );
    } else if config.prefers_hw() {
        match HwDeviceContext::try_create(device) {
            Some(hw_context) => {
                let mut context = new_context(info, parameters.clone())?;
                unsafe {
                    (*context.as_mut_ptr()).hw_device_ctx = hw_context.create_ref();
                }
                match context.decoder().video() {
                    Ok(decoder) => return Ok((decoder, Some(hw_context), device)),
                    Err(e) => log::warn!(
                        "stream {}: {device} decoder failed to open ({e}), falling back to software",
                        info.index
                    ),
                }
            }
            None => log::warn!(
                "stream {}: {device} is unavailable, falling back to software",
                info.index
            ),
        }
    }

    let decoder = new_context(info, parameters)?
        .decoder()
        .video()
        .map_err(|e| Error::codec_init(info.index, e.to_string()))?;

    Ok((decoder, None, HwDevice::None))
}

/**
    Sort a decoder error into a per-packet or a fatal error.
*/
fn classify(error: ffmpeg_next::Error) -> Error {
    match error {
        ffmpeg_next::Error::InvalidData | ffmpeg_next::Error::PatchWelcome => {
            Error::decode(error.to_string())
        }
        _ => Error::decoder_state(error.to_string()),
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("index", &self.inner.index)
            .field("kind", &self.inner.kind)
            .field("name", &self.inner.name)
            .field("hw_device", &self.inner.hw_device)
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_errors() {
        assert!(!classify(ffmpeg_next::Error::InvalidData).is_fatal());
        assert!(!classify(ffmpeg_next::Error::PatchWelcome).is_fatal());
        assert!(classify(ffmpeg_next::Error::Bug).is_fatal());
        assert!(classify(ffmpeg_next::Error::External).is_fatal());
    }
}
