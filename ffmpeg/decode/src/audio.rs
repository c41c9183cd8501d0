/*!
    Audio frame access.
*/

use std::fmt;
use std::ops::Deref;

use ffmpeg_next::util::frame::audio::Audio as AudioFrameFFmpeg;

use ffmpeg_types::{AudioFormat, Error, Result, SampleFormat};

use crate::frame::{DecodedFrame, Frame};

/**
    A decoded audio frame.

    Converting a [`Frame`] that holds video yields an empty audio frame.
*/
#[derive(Clone, Default)]
pub struct AudioFrame(Frame);

impl AudioFrame {
    fn raw(&self) -> Option<&AudioFrameFFmpeg> {
        match self.0.decoded()? {
            DecodedFrame::Audio(frame) => Some(frame),
            DecodedFrame::Video(_) => None,
        }
    }

    /**
        Format of the samples returned by [`AudioFrame::data`].

        None for an empty frame or a sample format without a
        [`SampleFormat`] counterpart.
    */
    pub fn format(&self) -> Option<AudioFormat> {
        let frame = self.raw()?;
        Some(AudioFormat {
            sample_format: sample_format_from_ffmpeg(frame.format())?,
            sample_rate: frame.rate(),
            channels: frame.channels() as u16,
        })
    }

    /**
        Number of samples per channel, 0 for an empty frame.
    */
    pub fn samples(&self) -> usize {
        self.raw().map(|frame| frame.samples()).unwrap_or(0)
    }

    /**
        Copy the samples into an interleaved host buffer.

        Planar input is interleaved. An empty frame yields an empty buffer.
    */
    pub fn data(&self) -> Result<Vec<u8>> {
        let Some(frame) = self.raw() else {
            return Ok(Vec::new());
        };

        let format = self.format().ok_or_else(|| {
            Error::unsupported_format(format!("unsupported sample format: {:?}", frame.format()))
        })?;

        copy_audio_data(frame, format, frame.samples())
    }
}

impl From<Frame> for AudioFrame {
    fn from(frame: Frame) -> Self {
        match frame.decoded() {
            Some(DecodedFrame::Audio(_)) => Self(frame),
            _ => Self::default(),
        }
    }
}

impl From<AudioFrame> for Frame {
    fn from(frame: AudioFrame) -> Self {
        frame.0
    }
}

impl Deref for AudioFrame {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        &self.0
    }
}

impl fmt::Debug for AudioFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("AudioFrame(empty)");
        }
        f.debug_struct("AudioFrame")
            .field("pts", &self.pts())
            .field("samples", &self.samples())
            .field("format", &self.format())
            .finish()
    }
}

/**
    Copy audio data from FFmpeg frame.

    Only `linesize[0]` is set for audio, and it applies to every plane.
    Plane pointers come from `extended_data`, which also covers layouts
    with more channels than `data` has slots.
*/
fn copy_audio_data(
    frame: &AudioFrameFFmpeg,
    format: AudioFormat,
    samples: usize,
) -> Result<Vec<u8>> {
    let bytes_per_sample = format.sample_format.bytes_per_sample();
    let channels = format.channels as usize;
    let total_bytes = samples * format.bytes_per_frame();

    if !frame.is_planar() {
        return frame
            .data(0)
            .get(..total_bytes)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::decode("audio buffer is truncated"));
    }

    let plane_bytes = samples * bytes_per_sample;
    let (extended_data, linesize) = unsafe {
        let raw = frame.as_ptr();
        ((*raw).extended_data, (*raw).linesize[0])
    };
    if extended_data.is_null() || usize::try_from(linesize).map_or(true, |len| len < plane_bytes) {
        return Err(Error::decode(format!(
            "audio planes hold {linesize} bytes, {plane_bytes} expected"
        )));
    }

    let mut output = vec![0u8; total_bytes];
    for ch in 0..channels {
        let plane_data = unsafe {
            let ptr = *extended_data.add(ch);
            if ptr.is_null() {
                return Err(Error::decode(format!("audio plane {ch} is missing")));
            }
            std::slice::from_raw_parts(ptr, plane_bytes)
        };
        for (s, sample) in plane_data.chunks_exact(bytes_per_sample).enumerate() {
            let dst_offset = (s * channels + ch) * bytes_per_sample;
            output[dst_offset..dst_offset + bytes_per_sample].copy_from_slice(sample);
        }
    }

    Ok(output)
}

/**
    Convert FFmpeg sample format to our SampleFormat.
*/
fn sample_format_from_ffmpeg(format: ffmpeg_next::format::Sample) -> Option<SampleFormat> {
    use ffmpeg_next::format::Sample;

    match format {
        Sample::F32(_) => Some(SampleFormat::F32),
        Sample::F64(_) => Some(SampleFormat::F64),
        Sample::I16(_) => Some(SampleFormat::S16),
        Sample::I32(_) => Some(SampleFormat::S32),
        Sample::U8(_) => Some(SampleFormat::U8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_audio_frame_is_empty() {
        let frame = AudioFrame::default();
        assert!(frame.is_empty());
        assert!(frame.pts().is_nan());
        assert_eq!(frame.format(), None);
        assert_eq!(frame.samples(), 0);
        assert!(frame.data().unwrap().is_empty());
    }

    #[test]
    fn empty_frame_converts_to_empty_audio_frame() {
        let frame = AudioFrame::from(Frame::default());
        assert!(frame.is_empty());
        assert!(Frame::from(frame).is_empty());
    }

    #[test]
    fn sample_format_conversion() {
        use ffmpeg_next::format::{Sample, sample::Type};

        assert_eq!(
            sample_format_from_ffmpeg(Sample::I32(Type::Packed)),
            Some(SampleFormat::S32)
        );
        assert_eq!(
            sample_format_from_ffmpeg(Sample::F32(Type::Planar)),
            Some(SampleFormat::F32)
        );
        assert_eq!(sample_format_from_ffmpeg(Sample::None), None);
    }

    #[test]
    fn planar_stereo_is_interleaved() {
        use ffmpeg_next::{
            ChannelLayout,
            format::{Sample, sample::Type},
        };

        let mut raw = AudioFrameFFmpeg::new(Sample::F32(Type::Planar), 4, ChannelLayout::STEREO);
        for (ch, base) in [(0usize, 0.0f32), (1, 10.0)] {
            let plane = unsafe {
                let ptr = *(*raw.as_mut_ptr()).extended_data.add(ch) as *mut f32;
                std::slice::from_raw_parts_mut(ptr, 4)
            };
            for (s, value) in plane.iter_mut().enumerate() {
                *value = base + s as f32;
            }
        }

        let format = AudioFormat {
            sample_format: SampleFormat::F32,
            sample_rate: 48000,
            channels: 2,
        };
        let data = copy_audio_data(&raw, format, 4).unwrap();
        let interleaved: Vec<f32> = data
            .chunks_exact(4)
            .map(|bytes| f32::from_ne_bytes(bytes.try_into().unwrap()))
            .collect();
        assert_eq!(
            interleaved,
            vec![0.0, 10.0, 1.0, 11.0, 2.0, 12.0, 3.0, 13.0]
        );
    }
}
