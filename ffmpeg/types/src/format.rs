/*!
    Host pixel and sample formats.
*/

/**
    Pixel formats a decoded video frame can be mapped to.

    Only host-memory layouts are listed. Device-resident frames have no
    host pixel format until they are transferred.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 8-bit
    Yuv420p,
    /// Planar YUV 4:2:2, 8-bit
    Yuv422p,
    /// Planar YUV 4:4:4, 8-bit
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit in 16-bit little-endian words
    Yuv420p10,
    /// Y plane plus interleaved UV plane, 4:2:0, 8-bit
    Nv12,
    /// Like NV12 with 10-bit samples in 16-bit little-endian words
    P010le,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Packed RGBA, 32bpp
    Rgba,
    /// Packed BGRA, 32bpp
    Bgra,
}

/**
    Size of one plane of a tightly packed image.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Bytes per row, without padding.
    pub row_bytes: usize,
    /// Number of rows.
    pub rows: usize,
}

impl PlaneLayout {
    const fn new(row_bytes: usize, rows: usize) -> Self {
        Self { row_bytes, rows }
    }

    pub const fn size(self) -> usize {
        self.row_bytes * self.rows
    }
}

impl PixelFormat {
    /**
        Plane sizes of a `width` x `height` image, in storage order.

        Subsampled chroma dimensions round up, so odd sizes keep their last
        chroma column and row.
    */
    pub fn planes(self, width: usize, height: usize) -> Vec<PlaneLayout> {
        let (half_width, half_height) = (width.div_ceil(2), height.div_ceil(2));
        match self {
            Self::Rgba | Self::Bgra => vec![PlaneLayout::new(width * 4, height)],
            Self::Rgb24 | Self::Bgr24 => vec![PlaneLayout::new(width * 3, height)],
            Self::Yuv420p => vec![
                PlaneLayout::new(width, height),
                PlaneLayout::new(half_width, half_height),
                PlaneLayout::new(half_width, half_height),
            ],
            Self::Yuv420p10 => vec![
                PlaneLayout::new(width * 2, height),
                PlaneLayout::new(half_width * 2, half_height),
                PlaneLayout::new(half_width * 2, half_height),
            ],
            Self::Yuv422p => vec![
                PlaneLayout::new(width, height),
                PlaneLayout::new(half_width, height),
                PlaneLayout::new(half_width, height),
            ],
            Self::Yuv444p => vec![PlaneLayout::new(width, height); 3],
            Self::Nv12 => vec![
                PlaneLayout::new(width, height),
                PlaneLayout::new(half_width * 2, half_height),
            ],
            Self::P010le => vec![
                PlaneLayout::new(width * 2, height),
                PlaneLayout::new(half_width * 4, half_height),
            ],
        }
    }

    /**
        Total bytes of a tightly packed image, planes stored back to back.
    */
    pub fn buffer_size(self, width: usize, height: usize) -> usize {
        self.planes(width, height).iter().map(|plane| plane.size()).sum()
    }
}

/**
    Sample formats of decoded audio, always delivered interleaved.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SampleFormat {
    U8,
    S16,
    S32,
    F32,
    F64,
}

impl SampleFormat {
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/**
    Format of decoded audio.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    pub sample_format: SampleFormat,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl AudioFormat {
    /**
        Bytes in one interleaved sample frame (one sample of every channel).
    */
    pub const fn bytes_per_frame(self) -> usize {
        self.sample_format.bytes_per_sample() * self.channels as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuv420p_planes() {
        let planes = PixelFormat::Yuv420p.planes(16, 16);
        assert_eq!(
            planes,
            vec![
                PlaneLayout::new(16, 16),
                PlaneLayout::new(8, 8),
                PlaneLayout::new(8, 8),
            ]
        );
    }

    #[test]
    fn odd_dimensions_round_chroma_up() {
        assert_eq!(
            PixelFormat::Yuv420p.planes(5, 3),
            vec![
                PlaneLayout::new(5, 3),
                PlaneLayout::new(3, 2),
                PlaneLayout::new(3, 2),
            ]
        );
        assert_eq!(PixelFormat::Yuv420p.buffer_size(5, 3), 27);
        assert_eq!(
            PixelFormat::Nv12.planes(5, 3),
            vec![PlaneLayout::new(5, 3), PlaneLayout::new(6, 2)]
        );
        assert_eq!(
            PixelFormat::P010le.planes(5, 3),
            vec![PlaneLayout::new(10, 3), PlaneLayout::new(12, 2)]
        );
        assert_eq!(PixelFormat::Yuv422p.buffer_size(5, 3), 15 + 2 * 9);
    }

    #[test]
    fn buffer_sizes() {
        assert_eq!(PixelFormat::Yuv420p.buffer_size(16, 16), 384);
        assert_eq!(PixelFormat::Nv12.buffer_size(16, 16), 384);
        assert_eq!(PixelFormat::Yuv422p.buffer_size(16, 16), 512);
        assert_eq!(PixelFormat::Yuv444p.buffer_size(16, 16), 768);
        assert_eq!(PixelFormat::Yuv420p10.buffer_size(16, 16), 768);
        assert_eq!(PixelFormat::P010le.buffer_size(16, 16), 768);
        assert_eq!(PixelFormat::Bgra.buffer_size(4, 2), 32);
        assert_eq!(PixelFormat::Rgb24.buffer_size(4, 2), 24);
    }

    #[test]
    fn audio_format_bytes_per_frame() {
        let format = AudioFormat {
            sample_format: SampleFormat::S32,
            sample_rate: 8000,
            channels: 2,
        };
        assert_eq!(format.bytes_per_frame(), 8);
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::F64.bytes_per_sample(), 8);
    }
}
