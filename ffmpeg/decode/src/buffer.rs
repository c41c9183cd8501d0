/*!
    Video buffers in host or device memory.
*/

use ffmpeg_types::{Error, MappedFrame, Result};

use crate::hw::{HwDevice, transfer_hw_frame};
use crate::video::{VideoFrame, map_host_frame};

/**
    Pixel storage behind a decoded video frame.

    Created by [`HwDevice::video_buffer`] or [`VideoFrame::buffer`].
*/
#[derive(Clone, Debug)]
pub enum VideoBuffer {
    /// Pixels already in host memory.
    Host(VideoFrame),
    /// Pixels in accelerator memory, copied to the host by [`VideoBuffer::map`].
    Device { frame: VideoFrame, device: HwDevice },
}

impl VideoBuffer {
    /**
        Returns true if the pixels live in device memory.
    */
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device { .. })
    }

    /**
        Accelerator holding the pixels, [`HwDevice::None`] for host buffers.
    */
    pub fn device(&self) -> HwDevice {
        match self {
            Self::Host(_) => HwDevice::None,
            Self::Device { device, .. } => *device,
        }
    }

    pub fn frame(&self) -> &VideoFrame {
        match self {
            Self::Host(frame) | Self::Device { frame, .. } => frame,
        }
    }

    /**
        Copy the pixels into host memory.

        Device buffers are transferred from the accelerator first. The
        source frame is left untouched, so mapping twice transfers twice.
    */
    pub fn map(&self) -> Result<MappedFrame> {
        match self {
            Self::Host(frame) => {
                let raw = frame
                    .raw()
                    .ok_or_else(|| Error::decode("video frame holds no data"))?;
                map_host_frame(raw)
            }
            Self::Device { frame, device } => {
                let raw = frame
                    .raw()
                    .ok_or_else(|| Error::decode("video frame holds no data"))?;
                let host = transfer_hw_frame(raw).map_err(|e| {
                    Error::hw_device(format!("{device} frame transfer failed: {e}"))
                })?;
                map_host_frame(&host)
            }
        }
    }
}
