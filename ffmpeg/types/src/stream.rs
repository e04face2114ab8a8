/*!
    Stream specifications.

    A spec is built once from the host's negotiated export settings and
    consumed exactly once when the muxer opens the stream.
*/

use crate::{
    ChannelLayout, CodecId, ColorSpace, Error, FieldOrder, MediaKind, PixelFormat, Rational,
    Result, SampleFormat,
};

/// Bitrate the encoder is given when the host does not negotiate one.
pub const DEFAULT_VIDEO_BITRATE: u64 = 400_000;

/**
    Everything needed to open a video stream.

    One presentation tick of `time_base` is one frame; the frame rate is the
    inverse of the time base.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct VideoStreamSpec {
    /// Codec to encode with.
    pub codec: CodecId,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format handed to the encoder.
    pub pixel_format: PixelFormat,
    /// Layout of the frames the host submits.
    pub source_format: PixelFormat,
    /// Pixel (sample) aspect ratio.
    pub pixel_aspect_ratio: Rational,
    /// Time base of presentation timestamps.
    pub time_base: Rational,
    /// Field order of the encoded frames.
    pub field_order: FieldOrder,
    /// Color space the frames are converted into and tagged with.
    pub color_space: ColorSpace,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
}

impl VideoStreamSpec {
    /**
        Create a progressive, square-pixel, BT.709 YUV 4:2:0 spec fed with
        RGBA host frames.
    */
    pub fn new(codec: CodecId, width: u32, height: u32, time_base: Rational) -> Self {
        Self {
            codec,
            width,
            height,
            pixel_format: PixelFormat::Yuv420p,
            source_format: PixelFormat::Rgba,
            pixel_aspect_ratio: Rational::new(1, 1),
            time_base,
            field_order: FieldOrder::Progressive,
            color_space: ColorSpace::Bt709,
            bitrate: DEFAULT_VIDEO_BITRATE,
        }
    }

    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    pub fn with_source_format(mut self, format: PixelFormat) -> Self {
        self.source_format = format;
        self
    }

    pub fn with_pixel_aspect_ratio(mut self, ratio: Rational) -> Self {
        self.pixel_aspect_ratio = ratio;
        self
    }

    pub fn with_field_order(mut self, order: FieldOrder) -> Self {
        self.field_order = order;
        self
    }

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = bitrate;
        self
    }

    /**
        Frame rate implied by the time base.
    */
    pub fn frame_rate(&self) -> Rational {
        self.time_base.invert()
    }

    /**
        Size in bytes of one host frame: tightly packed rows of
        `width * bytes_per_pixel`.
    */
    pub fn source_frame_size(&self) -> usize {
        let bpp = self.source_format.packed_bytes_per_pixel().unwrap_or(4);
        self.width as usize * self.height as usize * bpp
    }

    /**
        Check the spec is self-consistent before any FFmpeg state is built.
    */
    pub fn validate(&self) -> Result<()> {
        if self.codec.kind() != MediaKind::Video {
            return Err(Error::unsupported_format(format!(
                "{} is not a video codec",
                self.codec
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::config(format!(
                "invalid frame size {}x{}",
                self.width, self.height
            )));
        }
        if !self.time_base.is_positive() {
            return Err(Error::config(format!("invalid time base {}", self.time_base)));
        }
        if !self.pixel_aspect_ratio.is_positive() {
            return Err(Error::config(format!(
                "invalid pixel aspect ratio {}",
                self.pixel_aspect_ratio
            )));
        }
        if self.source_format.packed_bytes_per_pixel() != Some(4) {
            return Err(Error::unsupported_format(format!(
                "host frames must be packed 4 bytes per pixel, got {:?}",
                self.source_format
            )));
        }
        Ok(())
    }
}

/**
    Everything needed to open an audio stream.

    The time base is `1 / sample_rate`; presentation timestamps count samples.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct AudioStreamSpec {
    /// Codec to encode with.
    pub codec: CodecId,
    /// Channel layout of both host buffers and encoded output.
    pub channel_layout: ChannelLayout,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
    /// Time base of presentation timestamps; its denominator is the sample rate.
    pub time_base: Rational,
    /// Sample format handed to the encoder; `None` takes the encoder's
    /// preferred format.
    pub sample_format: Option<SampleFormat>,
    /// Sample format of the host buffers.
    pub source_format: SampleFormat,
    /// Sample rate of the host buffers.
    pub source_sample_rate: u32,
}

impl AudioStreamSpec {
    /**
        Create a spec fed with planar f32 host buffers at the encoder rate.
        The encoder sample format is the codec's first supported one.
    */
    pub fn new(
        codec: CodecId,
        channel_layout: ChannelLayout,
        bitrate: u64,
        time_base: Rational,
    ) -> Self {
        Self {
            codec,
            channel_layout,
            bitrate,
            time_base,
            sample_format: None,
            source_format: SampleFormat::F32p,
            source_sample_rate: time_base.den.max(0) as u32,
        }
    }

    pub fn with_sample_format(mut self, format: SampleFormat) -> Self {
        self.sample_format = Some(format);
        self
    }

    pub fn with_source_format(mut self, format: SampleFormat) -> Self {
        self.source_format = format;
        self
    }

    pub fn with_source_sample_rate(mut self, rate: u32) -> Self {
        self.source_sample_rate = rate;
        self
    }

    /**
        Encoder sample rate, carried by the time base.
    */
    pub fn sample_rate(&self) -> u32 {
        self.time_base.den.max(0) as u32
    }

    pub fn validate(&self) -> Result<()> {
        if self.codec.kind() != MediaKind::Audio {
            return Err(Error::unsupported_format(format!(
                "{} is not an audio codec",
                self.codec
            )));
        }
        if !self.time_base.is_positive() || self.time_base.num != 1 {
            return Err(Error::config(format!(
                "audio time base must be 1/sample_rate, got {}",
                self.time_base
            )));
        }
        if self.source_sample_rate == 0 {
            return Err(Error::config("host sample rate must be positive"));
        }
        if self.source_format.bytes_per_sample() != 4 {
            return Err(Error::unsupported_format(format!(
                "host samples must be 4 bytes wide, got {:?}",
                self.source_format
            )));
        }
        Ok(())
    }
}
