/*!
    Pixel, sample, and channel layout formats.

    Every format carries the name FFmpeg uses for it, since filter chains and
    filter source arguments are written as text.
*/

/**
    Video pixel formats.

    This is a subset of formats commonly encountered in export pipelines.
    Not all FFmpeg pixel formats are represented.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (most common encoder input)
    Yuv420p,
    /// Semi-planar YUV 4:2:0, 12bpp
    Nv12,
    /// Packed BGRA, 32bpp
    Bgra,
    /// Packed RGBA, 32bpp (host frame layout)
    Rgba,
    /// Packed ARGB, 32bpp
    Argb,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit little-endian
    Yuv420p10,
}

impl PixelFormat {
    /**
        Returns the number of bits per pixel for this format.

        For planar formats, this is the average bits per pixel.
    */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Yuv420p | Self::Nv12 => 12,
            Self::Yuv420p10 => 15,
            Self::Yuv422p => 16,
            Self::Yuv444p => 24,
            Self::Bgra | Self::Rgba | Self::Argb => 32,
        }
    }

    /**
        Returns true if this is a planar format.
    */
    pub const fn is_planar(self) -> bool {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p | Self::Yuv420p10 => true,
            Self::Nv12 => true, // semi-planar counts as planar
            Self::Bgra | Self::Rgba | Self::Argb => false,
        }
    }

    /**
        Bytes per pixel of a packed format, `None` for planar formats.
    */
    pub const fn packed_bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Bgra | Self::Rgba | Self::Argb => Some(4),
            _ => None,
        }
    }

    /**
        The FFmpeg name of this format, as accepted by `pix_fmt` and `pix_fmts`.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Nv12 => "nv12",
            Self::Bgra => "bgra",
            Self::Rgba => "rgba",
            Self::Argb => "argb",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Yuv420p10 => "yuv420p10le",
        }
    }
}

/**
    Audio sample formats.

    Planar variants store one plane per channel; packed variants interleave
    all channels in a single plane.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SampleFormat {
    /// 32-bit floating point, packed
    F32,
    /// 32-bit floating point, planar
    F32p,
    /// 64-bit floating point, packed
    F64,
    /// Signed 16-bit integer, packed
    S16,
    /// Signed 16-bit integer, planar
    S16p,
    /// Signed 32-bit integer, packed
    S32,
    /// Signed 32-bit integer, planar
    S32p,
    /// Unsigned 8-bit integer, packed
    U8,
}

impl SampleFormat {
    /**
        Returns the number of bytes per sample.
    */
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::S32p | Self::F32 | Self::F32p => 4,
            Self::F64 => 8,
        }
    }

    /**
        Returns true if this is a floating-point format.
    */
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F32p | Self::F64)
    }

    /**
        Returns true if each channel lives in its own plane.
    */
    pub const fn is_planar(self) -> bool {
        matches!(self, Self::F32p | Self::S16p | Self::S32p)
    }

    /**
        The FFmpeg name of this format, as accepted by `sample_fmt` and `sample_fmts`.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "flt",
            Self::F32p => "fltp",
            Self::F64 => "dbl",
            Self::S16 => "s16",
            Self::S16p => "s16p",
            Self::S32 => "s32",
            Self::S32p => "s32p",
            Self::U8 => "u8",
        }
    }
}

/**
    Audio channel layout.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChannelLayout {
    /// Single channel
    Mono,
    /// Left and right channels
    Stereo,
    /// 5.1 surround (FL, FR, FC, LFE, BL, BR)
    Surround5_1,
    /// 7.1 surround (FL, FR, FC, LFE, BL, BR, SL, SR)
    Surround7_1,
}

impl ChannelLayout {
    /**
        Returns the number of channels.
    */
    pub const fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround5_1 => 6,
            Self::Surround7_1 => 8,
        }
    }

    /**
        Create a channel layout from an exact channel count.
    */
    pub const fn from_count(count: u16) -> Option<Self> {
        match count {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            6 => Some(Self::Surround5_1),
            8 => Some(Self::Surround7_1),
            _ => None,
        }
    }

    /**
        The FFmpeg name of this layout, as accepted by `channel_layout(s)`.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mono => "mono",
            Self::Stereo => "stereo",
            Self::Surround5_1 => "5.1",
            Self::Surround7_1 => "7.1",
        }
    }
}

/**
    Color space an encoder output is converted into and tagged with.

    Range is always limited (MPEG); the matrix, primaries and transfer
    characteristic all follow the variant.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// ITU-R BT.709 (HD).
    #[default]
    Bt709,
    /// ITU-R BT.601 / SMPTE 170M (SD).
    Bt601,
}

impl ColorSpace {
    /**
        The matrix name accepted by the `scale` filter's `out_color_matrix`.
    */
    pub const fn matrix_name(self) -> &'static str {
        match self {
            Self::Bt709 => "bt709",
            Self::Bt601 => "bt601",
        }
    }
}

/**
    Field order of the encoded video.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FieldOrder {
    /// Full frames, no interlacing.
    #[default]
    Progressive,
    /// Interlaced, top field coded and displayed first.
    TopFirst,
    /// Interlaced, bottom field coded and displayed first.
    BottomFirst,
    /// Unknown or unspecified.
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_bits_per_pixel() {
        assert_eq!(PixelFormat::Yuv420p.bits_per_pixel(), 12);
        assert_eq!(PixelFormat::Bgra.bits_per_pixel(), 32);
        assert_eq!(PixelFormat::Yuv444p.bits_per_pixel(), 24);
    }

    #[test]
    fn pixel_format_is_planar() {
        assert!(PixelFormat::Yuv420p.is_planar());
        assert!(PixelFormat::Nv12.is_planar());
        assert!(!PixelFormat::Rgba.is_planar());
        assert_eq!(PixelFormat::Rgba.packed_bytes_per_pixel(), Some(4));
        assert_eq!(PixelFormat::Yuv420p.packed_bytes_per_pixel(), None);
    }

    #[test]
    fn sample_format_layouts() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16p.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F32p.bytes_per_sample(), 4);
        assert!(SampleFormat::F32p.is_planar());
        assert!(SampleFormat::F32p.is_float());
        assert!(!SampleFormat::F32.is_planar());
        assert_eq!(SampleFormat::F32p.name(), "fltp");
    }

    #[test]
    fn channel_layout_counts() {
        assert_eq!(ChannelLayout::Stereo.channels(), 2);
        assert_eq!(ChannelLayout::from_count(6), Some(ChannelLayout::Surround5_1));
        assert_eq!(ChannelLayout::from_count(3), None);
        assert_eq!(ChannelLayout::Surround5_1.name(), "5.1");
    }
}
