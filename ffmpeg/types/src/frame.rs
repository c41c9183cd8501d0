/*!
    Host-resident frame data.
*/

use crate::PixelFormat;

/**
    A decoded video frame copied into host memory.

    Planes are stored back to back without row padding, so `data.len()`
    equals `format.buffer_size(width, height)`.
*/
#[derive(Clone, Debug)]
pub struct MappedFrame {
    /// Raw pixel data.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of `data`.
    pub format: PixelFormat,
}

impl MappedFrame {
    /**
        Create a new mapped frame.
    */
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /**
        Returns true if `data` holds exactly one packed image.
    */
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.format.buffer_size(self.width as usize, self.height as usize)
    }
}

static_assertions::assert_impl_all!(MappedFrame: Send, Sync);
