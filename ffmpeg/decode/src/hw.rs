/*!
    Hardware acceleration support.
*/

use std::fmt;
use std::ptr;
use std::str::FromStr;

use ffmpeg_next::{ffi, util::frame::video::Video as VideoFrameFFmpeg};

use ffmpeg_types::ParseError;

use crate::buffer::VideoBuffer;
use crate::video::VideoFrame;

/**
    Hardware device type for hardware-accelerated decoding.

    Each variant knows the pixel format its decoded frames carry while they
    live in device memory and the device type used to create its context.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HwDevice {
    /// Software decoding.
    #[default]
    None,
    /// VideoToolbox (macOS)
    VideoToolbox,
    /// VAAPI (Linux - AMD, Intel)
    Vaapi,
    /// VDPAU (Linux - NVIDIA, legacy)
    Vdpau,
    /// CUDA/NVDEC (NVIDIA)
    Cuda,
    /// Quick Sync Video (Intel)
    Qsv,
    /// Direct3D 11 (Windows)
    D3d11va,
    /// DXVA2 (Windows, legacy)
    Dxva2,
    /// DRM PRIME (Linux, embedded)
    Drm,
}

impl HwDevice {
    /**
        Every variant, software decoding first.
    */
    pub const ALL: [Self; 9] = [
        Self::None,
        Self::VideoToolbox,
        Self::Vaapi,
        Self::Vdpau,
        Self::Cuda,
        Self::Qsv,
        Self::D3d11va,
        Self::Dxva2,
        Self::Drm,
    ];

    /**
        The accelerator most likely to be present on this platform.
    */
    pub const fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::VideoToolbox
        } else if cfg!(target_os = "windows") {
            Self::D3d11va
        } else if cfg!(target_os = "linux") {
            Self::Vaapi
        } else {
            Self::None
        }
    }

    /**
        Pixel format of frames that stay in device memory.

        The decoder's format negotiation picks this format when the device
        context is attached, which keeps decoded frames on the device.
    */
    pub const fn format(self) -> ffi::AVPixelFormat {
        use ffi::AVPixelFormat::*;

        match self {
            Self::None => AV_PIX_FMT_NONE,
            Self::VideoToolbox => AV_PIX_FMT_VIDEOTOOLBOX,
            Self::Vaapi => AV_PIX_FMT_VAAPI,
            Self::Vdpau => AV_PIX_FMT_VDPAU,
            Self::Cuda => AV_PIX_FMT_CUDA,
            Self::Qsv => AV_PIX_FMT_QSV,
            Self::D3d11va => AV_PIX_FMT_D3D11,
            Self::Dxva2 => AV_PIX_FMT_DXVA2_VLD,
            Self::Drm => AV_PIX_FMT_DRM_PRIME,
        }
    }

    /**
        Device type used to create the device context.
    */
    pub const fn device_type(self) -> ffi::AVHWDeviceType {
        use ffi::AVHWDeviceType::*;

        match self {
            Self::None => AV_HWDEVICE_TYPE_NONE,
            Self::VideoToolbox => AV_HWDEVICE_TYPE_VIDEOTOOLBOX,
            Self::Vaapi => AV_HWDEVICE_TYPE_VAAPI,
            Self::Vdpau => AV_HWDEVICE_TYPE_VDPAU,
            Self::Cuda => AV_HWDEVICE_TYPE_CUDA,
            Self::Qsv => AV_HWDEVICE_TYPE_QSV,
            Self::D3d11va => AV_HWDEVICE_TYPE_D3D11VA,
            Self::Dxva2 => AV_HWDEVICE_TYPE_DXVA2,
            Self::Drm => AV_HWDEVICE_TYPE_DRM,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::VideoToolbox => "videotoolbox",
            Self::Vaapi => "vaapi",
            Self::Vdpau => "vdpau",
            Self::Cuda => "cuda",
            Self::Qsv => "qsv",
            Self::D3d11va => "d3d11va",
            Self::Dxva2 => "dxva2",
            Self::Drm => "drm",
        }
    }

    /**
        Wrap a decoded frame into a video buffer.

        No pixel data is copied here, a device buffer is only transferred
        to host memory once [`VideoBuffer::map`] is called.
    */
    pub fn video_buffer(self, frame: VideoFrame) -> VideoBuffer {
        match self {
            Self::None => VideoBuffer::Host(frame),
            device => VideoBuffer::Device { frame, device },
        }
    }
}

impl fmt::Display for HwDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HwDevice {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|device| device.name() == wanted)
            .ok_or_else(|| ParseError {
                kind: "hardware device",
                value: s.to_string(),
            })
    }
}

/**
    Hardware device context wrapper.
*/
pub(crate) struct HwDeviceContext {
    ctx: *mut ffi::AVBufferRef,
}

impl HwDeviceContext {
    /**
        Try to create a hardware device context.

        Returns None if the accelerator is not available.
    */
    pub fn try_create(device: HwDevice) -> Option<Self> {
        if device == HwDevice::None {
            return None;
        }

        unsafe {
            let mut hw_device_ctx: *mut ffi::AVBufferRef = ptr::null_mut();
            let ret = ffi::av_hwdevice_ctx_create(
                &mut hw_device_ctx,
                device.device_type(),
                ptr::null(),
                ptr::null_mut(),
                0,
            );

            if ret < 0 || hw_device_ctx.is_null() {
                log::debug!(
                    "{device} device context unavailable: {}",
                    ffmpeg_next::Error::from(ret)
                );
                return None;
            }

            Some(Self { ctx: hw_device_ctx })
        }
    }

    /**
        Create a reference to the context for use in a decoder.
    */
    pub fn create_ref(&self) -> *mut ffi::AVBufferRef {
        unsafe { ffi::av_buffer_ref(self.ctx) }
    }
}

impl Drop for HwDeviceContext {
    fn drop(&mut self) {
        if !self.ctx.is_null() {
            unsafe {
                ffi::av_buffer_unref(&mut self.ctx);
            }
        }
    }
}

// SAFETY: The FFmpeg buffer reference is internally reference-counted
// and thread-safe for the operations we perform.
unsafe impl Send for HwDeviceContext {}

/// `AV_CODEC_HW_CONFIG_METHOD_HW_DEVICE_CTX`
const HW_CONFIG_METHOD_HW_DEVICE_CTX: i32 = 0x01;

/**
    Check whether the decoder for `codec_id` can run on `device` through a
    device context.

    Decoders without a matching hardware config ignore an attached device
    and decode in software.
*/
pub(crate) fn decoder_supports(codec_id: ffmpeg_next::codec::Id, device: HwDevice) -> bool {
    if device == HwDevice::None {
        return false;
    }

    unsafe {
        let codec = ffi::avcodec_find_decoder(codec_id.into());
        if codec.is_null() {
            return false;
        }

        let mut index = 0;
        loop {
            let config = ffi::avcodec_get_hw_config(codec, index);
            if config.is_null() {
                return false;
            }
            if (*config).methods & HW_CONFIG_METHOD_HW_DEVICE_CTX != 0
                && (*config).device_type == device.device_type()
            {
                return true;
            }
            index += 1;
        }
    }
}

/**
    Check if a frame lives in device memory.
*/
pub(crate) fn is_hw_frame(frame: &VideoFrameFFmpeg) -> bool {
    unsafe { !(*frame.as_ptr()).hw_frames_ctx.is_null() }
}

/**
    Transfer a hardware frame to a software frame.

    Returns an error if the transfer fails.
*/
pub(crate) fn transfer_hw_frame(
    hw_frame: &VideoFrameFFmpeg,
) -> Result<VideoFrameFFmpeg, ffmpeg_next::Error> {
    unsafe {
        let mut sw_frame = VideoFrameFFmpeg::empty();
        let ret = ffi::av_hwframe_transfer_data(sw_frame.as_mut_ptr(), hw_frame.as_ptr(), 0);

        if ret < 0 {
            return Err(ffmpeg_next::Error::from(ret));
        }

        (*sw_frame.as_mut_ptr()).pts = (*hw_frame.as_ptr()).pts;

        Ok(sw_frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hw_device_formats() {
        assert_eq!(HwDevice::Qsv.format(), ffi::AVPixelFormat::AV_PIX_FMT_QSV);
        assert_eq!(
            HwDevice::Qsv.device_type(),
            ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_QSV
        );
        assert_eq!(HwDevice::None.format(), ffi::AVPixelFormat::AV_PIX_FMT_NONE);
        assert_eq!(
            HwDevice::None.device_type(),
            ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_NONE
        );
    }

    #[test]
    fn hw_device_from_str() {
        for device in HwDevice::ALL {
            assert_eq!(device.name().parse::<HwDevice>(), Ok(device));
        }
        assert_eq!(" VAAPI ".parse::<HwDevice>(), Ok(HwDevice::Vaapi));
        assert!("potato".parse::<HwDevice>().is_err());
    }

    #[test]
    fn raw_video_has_no_hw_decoder() {
        use ffmpeg_next::codec::Id;

        for device in HwDevice::ALL {
            assert!(!decoder_supports(Id::RAWVIDEO, device), "{device}");
        }
        assert!(!decoder_supports(Id::H264, HwDevice::None));
    }

    #[test]
    fn no_device_context_for_software() {
        assert!(HwDeviceContext::try_create(HwDevice::None).is_none());
    }

    #[test]
    fn video_buffer_variant_follows_device() {
        let frame = VideoFrame::default();
        assert!(!HwDevice::None.video_buffer(frame.clone()).is_device());

        let buffer = HwDevice::Cuda.video_buffer(frame);
        assert!(buffer.is_device());
        assert_eq!(buffer.device(), HwDevice::Cuda);
    }
}
