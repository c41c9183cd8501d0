/*!
    Video frame access.
*/

use std::fmt;
use std::ops::Deref;

use ffmpeg_next::util::frame::video::Video as VideoFrameFFmpeg;

use ffmpeg_types::{Error, MappedFrame, PixelFormat, Result};

use crate::buffer::VideoBuffer;
use crate::frame::{DecodedFrame, Frame};
use crate::hw::{HwDevice, is_hw_frame};

/**
    A decoded video frame.

    Converting a [`Frame`] that holds audio yields an empty video frame.
*/
#[derive(Clone, Default)]
pub struct VideoFrame(Frame);

impl VideoFrame {
    pub(crate) fn raw(&self) -> Option<&VideoFrameFFmpeg> {
        match self.0.decoded()? {
            DecodedFrame::Video(frame) => Some(frame),
            DecodedFrame::Audio(_) => None,
        }
    }

    /**
        Frame width in pixels, 0 for an empty frame.
    */
    pub fn width(&self) -> u32 {
        self.raw().map(|frame| frame.width()).unwrap_or(0)
    }

    /**
        Frame height in pixels, 0 for an empty frame.
    */
    pub fn height(&self) -> u32 {
        self.raw().map(|frame| frame.height()).unwrap_or(0)
    }

    /**
        Host pixel format of the frame.

        None for empty frames, device frames and formats without a
        [`PixelFormat`] counterpart.
    */
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        self.raw()
            .and_then(|frame| pixel_format_from_ffmpeg(frame.format()))
    }

    /**
        Returns true if the pixels live in accelerator memory.
    */
    pub fn is_hw_frame(&self) -> bool {
        self.raw().is_some_and(is_hw_frame)
    }

    /**
        Accelerator the producing codec decodes on.
    */
    pub fn hw_device(&self) -> HwDevice {
        self.stream()
            .and_then(|stream| stream.codec())
            .map(|codec| codec.hw_device())
            .unwrap_or_default()
    }

    /**
        Wrap this frame into a [`VideoBuffer`] without copying pixels.
    */
    pub fn buffer(&self) -> VideoBuffer {
        if self.is_hw_frame() {
            self.hw_device().video_buffer(self.clone())
        } else {
            VideoBuffer::Host(self.clone())
        }
    }

    /**
        Copy the pixels into host memory.

        Shorthand for `self.buffer().map()`.
    */
    pub fn map(&self) -> Result<MappedFrame> {
        self.buffer().map()
    }
}

impl From<Frame> for VideoFrame {
    fn from(frame: Frame) -> Self {
        match frame.decoded() {
            Some(DecodedFrame::Video(_)) => Self(frame),
            _ => Self::default(),
        }
    }
}

impl From<VideoFrame> for Frame {
    fn from(frame: VideoFrame) -> Self {
        frame.0
    }
}

impl Deref for VideoFrame {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        &self.0
    }
}

impl fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("VideoFrame(empty)");
        }
        f.debug_struct("VideoFrame")
            .field("pts", &self.pts())
            .field("width", &self.width())
            .field("height", &self.height())
            .field("pixel_format", &self.pixel_format())
            .field("hw", &self.is_hw_frame())
            .finish()
    }
}

/**
    Copy a host-resident FFmpeg frame into a [`MappedFrame`].
*/
pub(crate) fn map_host_frame(frame: &VideoFrameFFmpeg) -> Result<MappedFrame> {
    let width = frame.width();
    let height = frame.height();

    if width == 0 || height == 0 {
        return Err(Error::decode("frame has zero dimensions"));
    }

    let ffmpeg_format = frame.format();
    let format = pixel_format_from_ffmpeg(ffmpeg_format).ok_or_else(|| {
        Error::unsupported_format(format!("unsupported pixel format: {:?}", ffmpeg_format))
    })?;

    let data = copy_frame_data(frame, format)?;

    Ok(MappedFrame::new(data, width, height, format))
}

/**
    Copy every plane of a frame into one contiguous buffer, dropping the
    row padding FFmpeg adds for alignment.
*/
fn copy_frame_data(frame: &VideoFrameFFmpeg, format: PixelFormat) -> Result<Vec<u8>> {
    let planes = format.planes(frame.width() as usize, frame.height() as usize);
    if planes.len() > frame.planes() {
        return Err(Error::decode(format!(
            "{format:?} frame has {} planes, expected {}",
            frame.planes(),
            planes.len()
        )));
    }

    let mut output = Vec::with_capacity(planes.iter().map(|plane| plane.size()).sum());

    for (index, layout) in planes.into_iter().enumerate() {
        let stride = frame.stride(index);
        let data = frame.data(index);

        for row in 0..layout.rows {
            let start = row * stride;
            let bytes = data
                .get(start..start + layout.row_bytes)
                .ok_or_else(|| Error::decode(format!("plane {index} is shorter than expected")))?;
            output.extend_from_slice(bytes);
        }
    }

    Ok(output)
}

/**
    Convert FFmpeg pixel format to our PixelFormat.
*/
fn pixel_format_from_ffmpeg(format: ffmpeg_next::format::Pixel) -> Option<PixelFormat> {
    use ffmpeg_next::format::Pixel;

    match format {
        Pixel::YUV420P | Pixel::YUVJ420P => Some(PixelFormat::Yuv420p),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::YUV422P | Pixel::YUVJ422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P | Pixel::YUVJ444P => Some(PixelFormat::Yuv444p),
        Pixel::YUV420P10LE => Some(PixelFormat::Yuv420p10),
        Pixel::P010LE => Some(PixelFormat::P010le),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_video_frame_is_empty() {
        let frame = VideoFrame::default();
        assert!(frame.is_empty());
        assert!(frame.pts().is_nan());
        assert_eq!(frame.width(), 0);
        assert_eq!(frame.height(), 0);
        assert_eq!(frame.pixel_format(), None);
        assert!(!frame.is_hw_frame());
        assert_eq!(frame.hw_device(), HwDevice::None);
        assert!(frame.map().is_err());
    }

    #[test]
    fn empty_frame_converts_to_empty_video_frame() {
        let frame = VideoFrame::from(Frame::default());
        assert!(frame.is_empty());
        assert!(!frame.buffer().is_device());
    }

    #[test]
    fn pixel_format_conversion() {
        use ffmpeg_next::format::Pixel;

        assert_eq!(
            pixel_format_from_ffmpeg(Pixel::YUV420P),
            Some(PixelFormat::Yuv420p)
        );
        assert_eq!(pixel_format_from_ffmpeg(Pixel::NV12), Some(PixelFormat::Nv12));
        assert_eq!(pixel_format_from_ffmpeg(Pixel::GRAY8), None);
    }

    #[test]
    fn odd_sized_frame_keeps_last_chroma_sample() {
        use ffmpeg_next::format::Pixel;

        let mut raw = VideoFrameFFmpeg::new(Pixel::YUV420P, 5, 3);
        for (index, value) in [(0, 16u8), (1, 100), (2, 200)] {
            raw.data_mut(index).fill(value);
        }

        let data = copy_frame_data(&raw, PixelFormat::Yuv420p).unwrap();
        assert_eq!(data.len(), PixelFormat::Yuv420p.buffer_size(5, 3));
        assert!(data[..15].iter().all(|&b| b == 16));
        assert!(data[15..21].iter().all(|&b| b == 100));
        assert!(data[21..].iter().all(|&b| b == 200));
    }
}
